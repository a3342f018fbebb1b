pub mod bitwarden;
pub mod github;
pub mod http;

pub use bitwarden::BitwardenClient;
pub use github::GithubClient;
