//! # KILN Baker
//!
//! Command-line entry point.
//!
//! ```text
//! kiln_baker <input_dir> [--config <file>]
//! ```
//!
//! Exit codes: 0 all baked, 1 usage or setup error, 2 some assets failed.
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use kiln_baker::{Baker, BakerConfig};

fn print_usage() {
    eprintln!("Usage: kiln_baker <input_dir> [--config <file>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <file>  Baker settings (default: <input_dir>/kiln.toml)");
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config_path = match args.iter().position(|a| a == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                print_usage();
                return ExitCode::from(1);
            }
        },
        None => None,
    };

    let input_dir = args
        .iter()
        .enumerate()
        .find(|(i, a)| !a.starts_with("--") && (*i == 0 || args[*i - 1] != "--config"))
        .map(|(_, a)| PathBuf::from(a));

    let Some(input_dir) = input_dir else {
        print_usage();
        return ExitCode::from(1);
    };

    if !input_dir.is_dir() {
        eprintln!("Error: {} is not a directory", input_dir.display());
        return ExitCode::from(1);
    }

    let config = match BakerConfig::resolve(&input_dir, config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: could not load config: {e}");
            return ExitCode::from(1);
        }
    };

    let baker = Baker::new(input_dir, config);
    let report = match baker.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    println!();
    println!("┌─ BAKE RESULTS ─────────────────────────────────────────────────┐");
    println!("│ Output:   {}", baker.output_dir().display());
    println!("│ Baked:    {} sources ({} files)", report.baked.len(), report.output_count());
    println!("│ Failed:   {}", report.failed.len());
    for failed in &report.failed {
        println!("│  - {}: {}", failed.source.display(), failed.error);
    }
    println!("└────────────────────────────────────────────────────────────────┘");

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}
