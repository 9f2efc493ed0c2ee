pub mod archive;
pub mod cli;
pub mod convert;
pub mod geometry;
pub mod parser;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use convert::{convert, convert_with_ui, inspect, ConvertOptions, ConvertReport};
pub use ui::{ConsoleUi, SilentUi, Ui};
