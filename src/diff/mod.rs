pub mod engine;
pub mod render;

pub use engine::{Diff, DiffEntry, Diffable, EntityId};
pub use render::{render_simple_diff, RenderToml};
