pub mod commands;
pub mod loader;

pub use commands::{Commands, Outcome};
pub use loader::PolicyDocument;
