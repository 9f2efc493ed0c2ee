use anyhow::Result;
use std::time::Instant;
use ykr_to_gpkg::{
    cli::{Cli, Commands},
    convert::{convert, inspect},
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse_args();
    let options = cli.command.convert_options();

    match cli.command {
        Commands::Convert {
            archives,
            output_dir,
            ..
        } => {
            let options = options.unwrap_or_default();

            for archive in &archives {
                let start = Instant::now();
                println!("\nConverting {:?}...", archive);

                let report = convert(archive, &output_dir, &options)?;

                let elapsed = start.elapsed();
                println!(
                    "Created {:?} ({} layers, {} rows) in {:.1}s",
                    report.gpkg_path,
                    report.layers.len(),
                    report.total_rows(),
                    elapsed.as_secs_f64()
                );
            }
        }

        Commands::Inspect { archive, delimiter } => {
            println!("CSV files in {:?}:\n", archive);
            for member in inspect(&archive, delimiter)? {
                println!(
                    "  {:40} {:15} {:>8} rows {:>4} columns{}",
                    member.name,
                    member.kind.to_string(),
                    member.rows,
                    member.columns,
                    if member.geometry_eligible { "  [grid]" } else { "" }
                );
            }
        }
    }

    Ok(())
}
