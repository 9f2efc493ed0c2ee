pub mod gpkg;
pub mod schema_gen;
pub mod srs;

pub use gpkg::*;
