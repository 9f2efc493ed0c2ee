//! Grid cell geometries and their GeoPackage binary encoding

use anyhow::{anyhow, bail, Context, Result};
use geo::BoundingRect;
use geo_types::{coord, Geometry, Point, Rect};
use wkb::writer::{write_geometry, WriteOptions};
use wkb::Endianness;

use crate::parser::Table;
use crate::schema::{X_COLUMN, Y_COLUMN};

/// ETRS-TM35FIN, the CRS of all YKR coordinates
pub const EPSG_3067: i32 = 3067;

/// Half of the 250 m grid cell side
pub const HALF_CELL: f64 = 125.0;

/// Geometry type of a layer's geometry column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    Polygon,
}

impl GeometryKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "POINT",
            GeometryKind::Polygon => "POLYGON",
        }
    }

    /// Build the cell geometry for a coordinate pair
    pub fn build(&self, x: f64, y: f64) -> Geometry<f64> {
        match self {
            GeometryKind::Point => Geometry::Point(Point::new(x, y)),
            GeometryKind::Polygon => Geometry::Polygon(cell_square(x, y)),
        }
    }
}

/// Axis-aligned 250 m square centered at `(x, y)`
pub fn cell_square(x: f64, y: f64) -> geo_types::Polygon<f64> {
    Rect::new(
        coord! { x: x - HALF_CELL, y: y - HALF_CELL },
        coord! { x: x + HALF_CELL, y: y + HALF_CELL },
    )
    .to_polygon()
}

/// A table together with one optional geometry per row
#[derive(Debug, Clone)]
pub struct SpatialRowSet {
    pub table: Table,
    /// Set only when geometries were actually built
    pub kind: Option<GeometryKind>,
    pub geometries: Vec<Option<Geometry<f64>>>,
}

impl SpatialRowSet {
    /// Every row gets a null geometry
    pub fn without_geometry(table: Table) -> Self {
        let geometries = vec![None; table.len()];
        Self {
            table,
            kind: None,
            geometries,
        }
    }

    /// Build one geometry per row from the `x` and `y` columns.
    /// Rows with a missing coordinate get a null geometry.
    pub fn with_geometry(table: Table, kind: GeometryKind) -> Result<Self> {
        let (Some(x_idx), Some(y_idx)) = (
            table.column_index(X_COLUMN),
            table.column_index(Y_COLUMN),
        ) else {
            bail!("Table {} has no x/y columns to build geometries from", table.name);
        };

        let mut geometries = Vec::with_capacity(table.len());
        for (line, row) in table.rows.iter().enumerate() {
            let (x, y) = (&row[x_idx], &row[y_idx]);
            if x.is_null() || y.is_null() {
                geometries.push(None);
                continue;
            }
            let x = x
                .as_f64()
                .with_context(|| format!("Non-numeric x in {} row {}", table.name, line + 1))?;
            let y = y
                .as_f64()
                .with_context(|| format!("Non-numeric y in {} row {}", table.name, line + 1))?;
            geometries.push(Some(kind.build(x, y)));
        }

        Ok(Self {
            table,
            kind: Some(kind),
            geometries,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Bounding box of all non-null geometries
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.geometries
            .iter()
            .flatten()
            .filter_map(|geom| geom.bounding_rect())
            .reduce(|a, b| merge_rects(&a, &b))
    }
}

/// Smallest rectangle covering both
pub fn merge_rects(a: &Rect<f64>, b: &Rect<f64>) -> Rect<f64> {
    Rect::new(
        coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

// GeoPackage binary header flags
const FLAG_LITTLE_ENDIAN: u8 = 0x01;
const FLAG_XY_ENVELOPE: u8 = 0x02;

/// Encode a geometry as a GeoPackage binary blob: `GP` header with the srs id
/// and, for polygons, an XY envelope, followed by little-endian WKB.
pub fn encode_gpkg(geom: &Geometry<f64>, srs_id: i32) -> Result<Vec<u8>> {
    let envelope = match geom {
        Geometry::Point(_) => None,
        Geometry::Polygon(poly) => Some(poly.bounding_rect().context("Empty polygon")?),
        _ => bail!("Only points and polygons can be written"),
    };

    let mut buf = Vec::with_capacity(128);
    buf.extend_from_slice(b"GP");
    buf.push(0);
    match envelope {
        Some(env) => {
            buf.push(FLAG_LITTLE_ENDIAN | FLAG_XY_ENVELOPE);
            buf.extend_from_slice(&srs_id.to_le_bytes());
            for v in [env.min().x, env.max().x, env.min().y, env.max().y] {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        None => {
            buf.push(FLAG_LITTLE_ENDIAN);
            buf.extend_from_slice(&srs_id.to_le_bytes());
        }
    }

    let options = WriteOptions {
        endianness: Endianness::LittleEndian,
    };
    write_geometry(&mut buf, geom, &options).map_err(|e| anyhow!("Failed to encode WKB: {:?}", e))?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    fn f64_at(buf: &[u8], offset: usize) -> f64 {
        f64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap())
    }

    #[test]
    fn test_cell_square_corners() {
        let square = cell_square(332750.0, 6887500.0);
        let env = square.bounding_rect().unwrap();
        assert_eq!(env.min(), coord! { x: 332625.0, y: 6887375.0 });
        assert_eq!(env.max(), coord! { x: 332875.0, y: 6887625.0 });
        // closed ring of four corners
        assert_eq!(square.exterior().0.len(), 5);
        assert_eq!(square.exterior().0.first(), square.exterior().0.last());
    }

    #[test]
    fn test_encode_point() {
        let blob = encode_gpkg(&GeometryKind::Point.build(332750.0, 6887500.0), EPSG_3067).unwrap();
        assert_eq!(&blob[0..2], b"GP");
        assert_eq!(blob[3], FLAG_LITTLE_ENDIAN);
        assert_eq!(i32::from_le_bytes(blob[4..8].try_into().unwrap()), 3067);
        assert_eq!(blob[8], 1);
        assert_eq!(u32::from_le_bytes(blob[9..13].try_into().unwrap()), 1);
        assert_eq!(f64_at(&blob, 13), 332750.0);
        assert_eq!(f64_at(&blob, 21), 6887500.0);
        assert_eq!(blob.len(), 29);
    }

    #[test]
    fn test_encode_polygon_envelope() {
        let blob = encode_gpkg(&GeometryKind::Polygon.build(1000.0, 2000.0), EPSG_3067).unwrap();
        assert_eq!(blob[3], FLAG_LITTLE_ENDIAN | FLAG_XY_ENVELOPE);
        assert_eq!(f64_at(&blob, 8), 875.0);
        assert_eq!(f64_at(&blob, 16), 1125.0);
        assert_eq!(f64_at(&blob, 24), 1875.0);
        assert_eq!(f64_at(&blob, 32), 2125.0);
        // WKB: order, type, rings, points
        assert_eq!(u32::from_le_bytes(blob[41..45].try_into().unwrap()), 3);
        assert_eq!(u32::from_le_bytes(blob[45..49].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(blob[49..53].try_into().unwrap()), 5);
        assert_eq!(blob.len(), 53 + 5 * 16);
    }

    #[test]
    fn test_rows_with_missing_coordinates_get_null_geometry() {
        let table = parse_table("xyind,x,y\n1,100,200\n2,,\n".as_bytes(), "t.csv", b',').unwrap();
        let set = SpatialRowSet::with_geometry(table, GeometryKind::Point).unwrap();
        assert!(set.geometries[0].is_some());
        assert!(set.geometries[1].is_none());
        assert_eq!(
            set.envelope(),
            Some(Rect::new(coord! { x: 100.0, y: 200.0 }, coord! { x: 100.0, y: 200.0 }))
        );
    }

    #[test]
    fn test_missing_coordinate_columns_is_error() {
        let table = parse_table("xyind,vaesto\n1,2\n".as_bytes(), "t.csv", b',').unwrap();
        assert!(SpatialRowSet::with_geometry(table, GeometryKind::Polygon).is_err());
    }

    #[test]
    fn test_non_numeric_coordinate_is_error() {
        let table = parse_table("xyind,x,y\n1,abc,200\n".as_bytes(), "t.csv", b',').unwrap();
        assert!(SpatialRowSet::with_geometry(table, GeometryKind::Point).is_err());
    }

    #[test]
    fn test_merge_rects() {
        let a = Rect::new(coord! { x: 0.0, y: 5.0 }, coord! { x: 10.0, y: 6.0 });
        let b = Rect::new(coord! { x: -3.0, y: 1.0 }, coord! { x: 4.0, y: 2.0 });
        let merged = merge_rects(&a, &b);
        assert_eq!(merged.min(), coord! { x: -3.0, y: 1.0 });
        assert_eq!(merged.max(), coord! { x: 10.0, y: 6.0 });
    }

    #[test]
    fn test_without_geometry() {
        let table = parse_table("xyind,x,y\n1,100,200\n".as_bytes(), "t.csv", b',').unwrap();
        let set = SpatialRowSet::without_geometry(table);
        assert_eq!(set.kind, None);
        assert_eq!(set.geometries, vec![None]);
        assert_eq!(set.envelope(), None);
    }
}
