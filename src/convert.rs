use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::CsvArchive;
use crate::geometry::{GeometryKind, SpatialRowSet};
use crate::parser::Table;
use crate::schema::TableKind;
use crate::ui::{ConsoleUi, Ui};
use crate::writer::{GpkgWriter, LayerWriter};

/// How an archive is converted
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Build geometries from the x/y columns
    pub build_geometry: bool,
    /// Write all coordinate tables into one layer named after the archive
    pub combine: bool,
    /// 250 m squares instead of points, only used with `build_geometry`
    pub use_polygon: bool,
    /// CSV field delimiter
    pub delimiter: u8,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            build_geometry: false,
            combine: false,
            use_polygon: false,
            delimiter: b',',
        }
    }
}

impl ConvertOptions {
    /// Geometry to build, if any
    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        match (self.build_geometry, self.use_polygon) {
            (false, _) => None,
            (true, false) => Some(GeometryKind::Point),
            (true, true) => Some(GeometryKind::Polygon),
        }
    }
}

/// One layer written during a conversion
#[derive(Debug, Clone, PartialEq)]
pub struct LayerReport {
    pub name: String,
    pub rows: u64,
    pub geometry: Option<GeometryKind>,
}

impl From<&LayerWriter> for LayerReport {
    fn from(layer: &LayerWriter) -> Self {
        Self {
            name: layer.name().to_string(),
            rows: layer.rows(),
            geometry: layer.kind(),
        }
    }
}

/// Result of converting one archive
#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub gpkg_path: PathBuf,
    pub layers: Vec<LayerReport>,
}

impl ConvertReport {
    pub fn total_rows(&self) -> u64 {
        self.layers.iter().map(|l| l.rows).sum()
    }
}

/// Convert a zip archive of CSV files into `<output_dir>/<archive stem>.gpkg`,
/// printing each member as it is processed
pub fn convert(archive_path: &Path, output_dir: &Path, options: &ConvertOptions) -> Result<ConvertReport> {
    let mut ui = ConsoleUi::new();
    let report = convert_with_ui(archive_path, output_dir, options, &mut ui);
    ui.clear_progress();
    report
}

/// Convert a zip archive, reporting progress through `ui`.
///
/// Members are read one at a time. Without `combine` every member becomes its
/// own layer. With `combine` the coordinate members are streamed into a single
/// layer named after the archive and only `_9` members get layers of their own.
pub fn convert_with_ui(
    archive_path: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    ui: &mut impl Ui,
) -> Result<ConvertReport> {
    let mut archive = CsvArchive::open(archive_path)?;
    let stem = archive.stem();

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
    let gpkg_path = output_dir.join(format!("{}.gpkg", stem));
    let mut writer = GpkgWriter::open(&gpkg_path)?;

    let members = archive.csv_members()?;
    let total = members.len() as u64;
    ui.set_info(format!("{}: {} CSV files", stem, total));

    let mut layers = Vec::new();
    let mut combined: Option<LayerWriter> = None;

    for (i, member) in members.iter().enumerate() {
        ui.set_progress(i as u64, total, member.as_str());
        ui.log(member.as_str());

        let table = archive
            .read_table(member, options.delimiter)
            .with_context(|| format!("Failed to convert {}", member))?;
        let rows = spatial_rows(table, options)?;

        if options.combine && TableKind::of(member).is_combinable() {
            if combined.is_none() {
                combined = Some(writer.create_layer(&stem, options.geometry_kind(), &rows.table.columns)?);
            }
            if let Some(layer) = combined.as_mut() {
                let count = writer.append(layer, &rows)?;
                log::info!("Appended {} rows from {} to {}", count, member, stem);
            }
        } else {
            let layer = writer.write_layer(&rows.table.name, &rows)?;
            layers.push(LayerReport::from(&layer));
        }
    }
    ui.set_progress(total, total, "done");

    if options.combine {
        match &combined {
            Some(layer) => layers.push(LayerReport::from(layer)),
            None => log::warn!("{}: no coordinate tables to combine", stem),
        }
    }

    writer.finalize()?;

    Ok(ConvertReport { gpkg_path, layers })
}

/// Attach geometries to a table, or null geometries when none are wanted or possible
fn spatial_rows(table: Table, options: &ConvertOptions) -> Result<SpatialRowSet> {
    match options.geometry_kind() {
        Some(kind) if table.is_geometry_eligible() => SpatialRowSet::with_geometry(table, kind),
        Some(_) => {
            log::debug!("{}: no grid cell ids, writing without geometry", table.name);
            Ok(SpatialRowSet::without_geometry(table))
        }
        None => Ok(SpatialRowSet::without_geometry(table)),
    }
}

/// Summary of one CSV member
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSummary {
    pub name: String,
    pub kind: TableKind,
    pub rows: usize,
    pub columns: usize,
    pub geometry_eligible: bool,
}

/// Describe the CSV members of an archive without writing anything
pub fn inspect(archive_path: &Path, delimiter: u8) -> Result<Vec<MemberSummary>> {
    let mut archive = CsvArchive::open(archive_path)?;
    let members = archive.csv_members()?;

    let mut summaries = Vec::with_capacity(members.len());
    for member in members {
        let table = archive.read_table(&member, delimiter)?;
        summaries.push(MemberSummary {
            kind: TableKind::of(&member),
            rows: table.len(),
            columns: table.columns.len(),
            geometry_eligible: table.is_geometry_eligible(),
            name: member,
        });
    }

    Ok(summaries)
}
