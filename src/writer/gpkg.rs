use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use geo_types::Rect;
use std::path::Path;

use super::schema_gen::{
    generate_add_column, generate_create_table, generate_insert, quote_ident, CORE_TABLES,
    FID_COLUMN, GEOMETRY_COLUMN,
};
use super::srs::REQUIRED;
use crate::geometry::{encode_gpkg, merge_rects, GeometryKind, SpatialRowSet, EPSG_3067};
use crate::schema::Column;

/// "GPKG" as a big-endian integer
const GPKG_APPLICATION_ID: i32 = 0x4750_4B47;
/// GeoPackage 1.3.0
const GPKG_USER_VERSION: i32 = 10300;

/// Geometry type name of layers whose geometries are all null
const GENERIC_GEOMETRY: &str = "GEOMETRY";

/// An open feature layer that rows can be appended to
#[derive(Debug)]
pub struct LayerWriter {
    name: String,
    kind: Option<GeometryKind>,
    columns: Vec<Column>,
    rows: u64,
    extent: Option<Rect<f64>>,
}

impl LayerWriter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Option<GeometryKind> {
        self.kind
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows written through this writer
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

pub struct GpkgWriter {
    conn: Connection,
}

impl GpkgWriter {
    /// Open a GeoPackage, creating the file and its metadata tables if needed.
    /// Existing layers are kept.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open GeoPackage: {:?}", path))?;

        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;",
        )?;
        conn.pragma_update(None, "application_id", GPKG_APPLICATION_ID)?;
        conn.pragma_update(None, "user_version", GPKG_USER_VERSION)?;
        conn.execute_batch(CORE_TABLES)
            .with_context(|| format!("Failed to create GeoPackage tables in {:?}", path))?;

        for srs in REQUIRED {
            conn.execute(
                "INSERT OR IGNORE INTO gpkg_spatial_ref_sys
                 (srs_name, srs_id, organization, organization_coordsys_id, definition, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    srs.name,
                    srs.id,
                    srs.organization,
                    srs.organization_coordsys_id,
                    srs.definition,
                    srs.description
                ],
            )?;
        }

        Ok(Self { conn })
    }

    /// Create an empty feature layer, replacing any layer of the same name
    pub fn create_layer(
        &mut self,
        name: &str,
        kind: Option<GeometryKind>,
        columns: &[Column],
    ) -> Result<LayerWriter> {
        for col in columns {
            check_column_name(name, col)?;
        }

        let geometry_type = kind.map(|k| k.type_name()).unwrap_or(GENERIC_GEOMETRY);

        let tx = self.conn.transaction()?;
        drop_layer(&tx, name)?;

        tx.execute(&generate_create_table(name, geometry_type, columns), [])
            .with_context(|| format!("Failed to create layer: {}", name))?;
        tx.execute(
            "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id)
             VALUES (?1, 'features', ?1, ?2)",
            params![name, EPSG_3067],
        )?;
        tx.execute(
            "INSERT INTO gpkg_geometry_columns
             (table_name, column_name, geometry_type_name, srs_id, z, m)
             VALUES (?1, ?2, ?3, ?4, 0, 0)",
            params![name, GEOMETRY_COLUMN, geometry_type, EPSG_3067],
        )?;
        tx.commit()?;

        log::debug!("Created layer {} ({})", name, geometry_type);

        Ok(LayerWriter {
            name: name.to_string(),
            kind,
            columns: columns.to_vec(),
            rows: 0,
            extent: None,
        })
    }

    /// Append a row set to an open layer.
    ///
    /// Columns are matched by name. Columns the layer does not have yet are
    /// added; layer columns missing from the row set are left null.
    pub fn append(&mut self, layer: &mut LayerWriter, rows: &SpatialRowSet) -> Result<u64> {
        let tx = self.conn.transaction()?;

        for col in &rows.table.columns {
            if layer.columns.iter().any(|c| c.name.eq_ignore_ascii_case(&col.name)) {
                continue;
            }
            check_column_name(&layer.name, col)?;
            tx.execute(&generate_add_column(&layer.name, col), [])
                .with_context(|| format!("Failed to add column {} to {}", col.name, layer.name))?;
            layer.columns.push(col.clone());
        }

        let names: Vec<&str> = rows.table.columns.iter().map(|c| c.name.as_str()).collect();
        let insert_sql = generate_insert(&layer.name, &names);

        let mut count: u64 = 0;
        {
            let mut stmt = tx.prepare_cached(&insert_sql)?;

            for (values, geom) in rows.table.rows.iter().zip(&rows.geometries) {
                match geom {
                    Some(geom) => {
                        let blob = encode_gpkg(geom, EPSG_3067)?;
                        stmt.raw_bind_parameter(1, blob.as_slice())?;
                    }
                    None => stmt.raw_bind_parameter(1, rusqlite::types::Null)?,
                }
                for (idx, value) in values.iter().enumerate() {
                    value.bind_to(idx + 2, &mut stmt)?;
                }
                stmt.raw_execute()
                    .with_context(|| format!("Failed to insert into {}", layer.name))?;
                count += 1;
            }
        }

        if let Some(env) = rows.envelope() {
            layer.extent = Some(match layer.extent {
                Some(current) => merge_rects(&current, &env),
                None => env,
            });
        }

        tx.execute(
            "UPDATE gpkg_contents
             SET min_x = ?1, min_y = ?2, max_x = ?3, max_y = ?4,
                 last_change = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
             WHERE table_name = ?5",
            params![
                layer.extent.map(|e| e.min().x),
                layer.extent.map(|e| e.min().y),
                layer.extent.map(|e| e.max().x),
                layer.extent.map(|e| e.max().y),
                layer.name
            ],
        )?;
        tx.commit()?;

        layer.rows += count;
        Ok(count)
    }

    /// Write a row set as its own layer, replacing any layer of the same name
    pub fn write_layer(&mut self, name: &str, rows: &SpatialRowSet) -> Result<LayerWriter> {
        let mut layer = self.create_layer(name, rows.kind, &rows.table.columns)?;
        self.append(&mut layer, rows)?;
        log::info!("Wrote layer {} ({} rows)", name, layer.rows);
        Ok(layer)
    }

    /// Names of all feature layers
    pub fn list_layers(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM gpkg_contents WHERE data_type = 'features' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Finalize the GeoPackage
    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

fn check_column_name(layer: &str, col: &Column) -> Result<()> {
    if col.name.eq_ignore_ascii_case(FID_COLUMN) || col.name.eq_ignore_ascii_case(GEOMETRY_COLUMN) {
        bail!("Column name {} is reserved in layer {}", col.name, layer);
    }
    Ok(())
}

/// Remove a layer's table, spatial index and metadata rows
fn drop_layer(tx: &Transaction, name: &str) -> Result<()> {
    let geom_column: Option<String> = tx
        .query_row(
            "SELECT column_name FROM gpkg_geometry_columns WHERE table_name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(column) = geom_column {
        let rtree = format!("rtree_{}_{}", name, column);
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(&rtree)), [])?;
    }

    tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)), [])
        .with_context(|| format!("Failed to drop layer: {}", name))?;
    tx.execute("DELETE FROM gpkg_geometry_columns WHERE table_name = ?1", [name])?;
    tx.execute("DELETE FROM gpkg_contents WHERE table_name = ?1", [name])?;

    let has_extensions: bool = tx.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'gpkg_extensions')",
        [],
        |row| row.get(0),
    )?;
    if has_extensions {
        tx.execute("DELETE FROM gpkg_extensions WHERE table_name = ?1", [name])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;
    use tempfile::TempDir;

    fn row_set(csv: &str, kind: Option<GeometryKind>) -> SpatialRowSet {
        let table = parse_table(csv.as_bytes(), "ykr_test.csv", b',').unwrap();
        match kind {
            Some(kind) => SpatialRowSet::with_geometry(table, kind).unwrap(),
            None => SpatialRowSet::without_geometry(table),
        }
    }

    #[test]
    fn test_open_sets_up_geopackage() {
        let dir = TempDir::new().unwrap();
        let writer = GpkgWriter::open(&dir.path().join("t.gpkg")).unwrap();

        let app_id: i32 = writer
            .conn
            .query_row("PRAGMA application_id", [], |r| r.get(0))
            .unwrap();
        assert_eq!(app_id, GPKG_APPLICATION_ID);

        let srs: i64 = writer
            .conn
            .query_row(
                "SELECT COUNT(*) FROM gpkg_spatial_ref_sys WHERE srs_id IN (-1, 0, 4326, 3067)",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(srs, 4);
        assert!(writer.list_layers().unwrap().is_empty());
    }

    #[test]
    fn test_write_layer_updates_extent() {
        let dir = TempDir::new().unwrap();
        let mut writer = GpkgWriter::open(&dir.path().join("t.gpkg")).unwrap();
        let rows = row_set("xyind,x,y\n1,100,200\n2,300,400\n", Some(GeometryKind::Polygon));

        let layer = writer.write_layer("cells", &rows).unwrap();
        assert_eq!(layer.rows(), 2);

        let (min_x, max_y, geom_type): (f64, f64, String) = writer
            .conn
            .query_row(
                "SELECT c.min_x, c.max_y, g.geometry_type_name
                 FROM gpkg_contents c JOIN gpkg_geometry_columns g USING (table_name)
                 WHERE table_name = 'cells'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(min_x, -25.0);
        assert_eq!(max_y, 525.0);
        assert_eq!(geom_type, "POLYGON");
    }

    #[test]
    fn test_append_adds_new_columns() {
        let dir = TempDir::new().unwrap();
        let mut writer = GpkgWriter::open(&dir.path().join("t.gpkg")).unwrap();

        let first = row_set("xyind,x,y,v2019\n1,100,200,5\n", None);
        let second = row_set("xyind,x,y,v2020\n2,100,200,6\n", None);

        let mut layer = writer.create_layer("all", None, &first.table.columns).unwrap();
        writer.append(&mut layer, &first).unwrap();
        writer.append(&mut layer, &second).unwrap();
        assert_eq!(layer.rows(), 2);
        assert_eq!(layer.columns().len(), 5);

        let (a, b): (Option<i64>, Option<i64>) = writer
            .conn
            .query_row(
                "SELECT v2019, v2020 FROM \"all\" WHERE xyind = '2'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!((a, b), (None, Some(6)));
    }

    #[test]
    fn test_append_matches_columns_ignoring_case() {
        let dir = TempDir::new().unwrap();
        let mut writer = GpkgWriter::open(&dir.path().join("t.gpkg")).unwrap();

        let first = row_set("xyind,x,y,vaesto\n1,100,200,5\n", None);
        let second = row_set("xyind,x,y,Vaesto\n2,100,200,6\n", None);

        let mut layer = writer.create_layer("all", None, &first.table.columns).unwrap();
        writer.append(&mut layer, &first).unwrap();
        writer.append(&mut layer, &second).unwrap();
        assert_eq!(layer.columns().len(), 4);

        let total: i64 = writer
            .conn
            .query_row("SELECT SUM(vaesto) FROM \"all\"", [], |r| r.get(0))
            .unwrap();
        assert_eq!(total, 11);
    }

    #[test]
    fn test_replace_layer() {
        let dir = TempDir::new().unwrap();
        let mut writer = GpkgWriter::open(&dir.path().join("t.gpkg")).unwrap();
        let rows = row_set("xyind,x,y\n1,100,200\n", None);

        writer.write_layer("cells", &rows).unwrap();
        writer.write_layer("cells", &rows).unwrap();

        let count: i64 = writer
            .conn
            .query_row("SELECT COUNT(*) FROM cells", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(writer.list_layers().unwrap(), vec!["cells"]);
    }

    #[test]
    fn test_reserved_column_name_is_error() {
        let dir = TempDir::new().unwrap();
        let mut writer = GpkgWriter::open(&dir.path().join("t.gpkg")).unwrap();
        let rows = row_set("fid,x\n1,2\n", None);
        assert!(writer.write_layer("bad", &rows).is_err());
    }
}
