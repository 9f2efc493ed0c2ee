use crate::schema::Column;

/// Primary key column of every feature table
pub const FID_COLUMN: &str = "fid";
/// Geometry column of every feature table
pub const GEOMETRY_COLUMN: &str = "geom";

/// GeoPackage core metadata tables
pub const CORE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER,
    CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
CREATE TABLE IF NOT EXISTS gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
    CONSTRAINT uk_gc_table_name UNIQUE (table_name),
    CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
    CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys (srs_id)
);
";

/// Quote an SQL identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Generate CREATE TABLE SQL for a feature table
pub fn generate_create_table(layer: &str, geometry_type: &str, columns: &[Column]) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", quote_ident(layer));
    let mut defs = vec![
        format!("    {} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL", quote_ident(FID_COLUMN)),
        format!("    {} {}", quote_ident(GEOMETRY_COLUMN), geometry_type),
    ];

    for col in columns {
        defs.push(format!("    {} {}", quote_ident(&col.name), col.col_type.sql_type()));
    }

    sql.push_str(&defs.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate ALTER TABLE SQL adding an attribute column
pub fn generate_add_column(layer: &str, column: &Column) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_ident(layer),
        quote_ident(&column.name),
        column.col_type.sql_type()
    )
}

/// Generate INSERT SQL binding the geometry first, then the given columns
pub fn generate_insert(layer: &str, columns: &[&str]) -> String {
    let names: Vec<String> = std::iter::once(GEOMETRY_COLUMN)
        .chain(columns.iter().copied())
        .map(quote_ident)
        .collect();
    let placeholders: Vec<&str> = names.iter().map(|_| "?").collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(layer),
        names.join(", "),
        placeholders.join(", ")
    )
}
