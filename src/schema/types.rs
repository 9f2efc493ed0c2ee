use std::path::Path;

/// Columns that are always kept as text, even when every value looks numeric.
/// Grid cell ids and municipality codes carry leading zeros.
pub const FIXED_TEXT_COLUMNS: &[&str] = &["xyind", "axyind", "txyind", "kunta", "akunta", "tkunta"];

/// Prefix of the grid cell id columns that decide geometry eligibility
pub const XYIND_PREFIX: &str = "xyind";

/// Member name suffix of the non-coordinate "9-tables"
pub const NON_COORDINATE_SUFFIX: &str = "_9.csv";

/// Coordinate columns used to build geometries
pub const X_COLUMN: &str = "x";
pub const Y_COLUMN: &str = "y";

/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 32-bit integer
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// GeoPackage column type. MEDIUMINT is the 32-bit integer type.
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "MEDIUMINT",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub col_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
        }
    }
}

/// How a CSV member takes part in the conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Grid tables with x/y coordinates
    Coordinate,
    /// 9-tables without coordinates, never merged into a combined layer
    NonCoordinate,
}

impl TableKind {
    pub fn of(member_name: &str) -> Self {
        if member_name.ends_with(NON_COORDINATE_SUFFIX) {
            TableKind::NonCoordinate
        } else {
            TableKind::Coordinate
        }
    }

    pub fn is_combinable(&self) -> bool {
        *self == TableKind::Coordinate
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::Coordinate => write!(f, "coordinate"),
            TableKind::NonCoordinate => write!(f, "non-coordinate"),
        }
    }
}

pub fn is_fixed_text(column: &str) -> bool {
    FIXED_TEXT_COLUMNS.contains(&column)
}

/// Base name of an archive member or archive path, without directories or extension
pub fn layer_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
