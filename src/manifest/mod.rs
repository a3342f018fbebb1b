pub mod bitwarden;
pub mod github;

pub use bitwarden::BitwardenManifest;
pub use github::OrgManifest;
