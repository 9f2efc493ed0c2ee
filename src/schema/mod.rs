pub mod inference;
pub mod types;

pub use inference::*;
pub use types::*;
