use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::convert::ConvertOptions;

#[derive(Parser, Debug)]
#[command(name = "ykr-to-gpkg")]
#[command(version, about = "Convert zipped YKR CSV files to GeoPackage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert zip archives to GeoPackages, one file per archive
    Convert {
        /// Zip archives to convert
        #[arg(required = true)]
        archives: Vec<PathBuf>,

        /// Output directory for the GeoPackages
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Build geometries from the x/y columns (points by default)
        #[arg(short, long)]
        geometry: bool,

        /// Build 250 m grid squares instead of points
        #[arg(short, long, requires = "geometry")]
        polygon: bool,

        /// Write all coordinate tables into one layer named after the archive
        #[arg(short, long)]
        combine: bool,

        /// CSV field delimiter (a single ASCII character)
        #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
        delimiter: u8,
    },

    /// List the CSV files of an archive
    Inspect {
        /// Zip archive to inspect
        archive: PathBuf,

        /// CSV field delimiter (a single ASCII character)
        #[arg(short, long, default_value = ",", value_parser = parse_delimiter)]
        delimiter: u8,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Parse a delimiter argument; the CSV reader needs a single ASCII byte
fn parse_delimiter(arg: &str) -> Result<u8, String> {
    match arg.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("delimiter must be a single ASCII character, got {:?}", arg)),
    }
}

impl Commands {
    /// Conversion options of a `convert` command
    pub fn convert_options(&self) -> Option<ConvertOptions> {
        match self {
            Commands::Convert {
                geometry,
                polygon,
                combine,
                delimiter,
                ..
            } => Some(ConvertOptions {
                build_geometry: *geometry,
                combine: *combine,
                use_polygon: *polygon,
                delimiter: *delimiter,
            }),
            Commands::Inspect { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryKind;

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "ykr-to-gpkg", "convert", "a.zip", "b.zip", "-o", "out", "--geometry", "--polygon", "--combine",
        ])
        .unwrap();

        let options = cli.command.convert_options().unwrap();
        assert!(options.combine);
        assert_eq!(options.geometry_kind(), Some(GeometryKind::Polygon));

        match cli.command {
            Commands::Convert { archives, output_dir, .. } => {
                assert_eq!(archives, vec![PathBuf::from("a.zip"), PathBuf::from("b.zip")]);
                assert_eq!(output_dir, PathBuf::from("out"));
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_polygon_requires_geometry() {
        assert!(Cli::try_parse_from(["ykr-to-gpkg", "convert", "a.zip", "--polygon"]).is_err());
    }

    #[test]
    fn test_delimiter() {
        let cli = Cli::try_parse_from(["ykr-to-gpkg", "convert", "a.zip", "-d", ";"]).unwrap();
        assert_eq!(cli.command.convert_options().unwrap().delimiter, b';');

        let cli = Cli::try_parse_from(["ykr-to-gpkg", "inspect", "a.zip"]).unwrap();
        match cli.command {
            Commands::Inspect { delimiter, .. } => assert_eq!(delimiter, b','),
            _ => panic!("expected inspect"),
        }
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        assert!(Cli::try_parse_from(["ykr-to-gpkg", "convert", "a.zip", "-d", "ä"]).is_err());
        assert!(Cli::try_parse_from(["ykr-to-gpkg", "inspect", "a.zip", "--delimiter", ";;"]).is_err());
        assert!(Cli::try_parse_from(["ykr-to-gpkg", "convert", "a.zip", "-d", ""]).is_err());
    }
}
