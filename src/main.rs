//! BSPX manager CLI
//!
//! Inspect BSP files, add or remove BSPX lumps, and obfuscate texture names.

use bspxmgr::output::{self, Summary};
use bspxmgr::parser::{read_decoupled_lightmaps, DECOUPLED_LM};
use bspxmgr::{obfuscate_file, output_path_for, remove_lump, set_lump, BspError, BspFile, TextureNameObfuscator};
use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bspxmgr")]
#[command(about = "Manages BSPX lumps and obfuscates texture names in BSP files")]
#[command(version)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the full list of both BSP and BSPX lumps
    Print {
        /// Input .bsp file
        map: PathBuf,

        /// Dump the decoded records of one extension lump (DECOUPLED_LM)
        detail: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Add or update the content of a BSPX lump
    Set {
        map: PathBuf,
        lump_name: String,
        /// File whose bytes become the lump payload
        data: PathBuf,

        /// Output path (defaults to <map>.new.bsp)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a BSPX lump
    Unset {
        map: PathBuf,
        lump_name: String,

        /// Output path (defaults to <map>.new.bsp)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Randomize texture names
    Obfuscate {
        map: PathBuf,

        /// Output path (defaults to <map>.new.bsp)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for reproducible names (defaults to the current time)
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "bspxmgr=debug" } else { "bspxmgr=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Print {
            map,
            detail,
            format,
            pretty,
        } => print_map(&map, detail.as_deref(), format, pretty),
        Command::Set {
            map,
            lump_name,
            data,
            output,
        } => {
            let payload = std::fs::read(&data).map_err(|source| BspError::CannotOpenInput {
                path: data.clone(),
                source,
            })?;
            let output = output.unwrap_or_else(|| output_path_for(&map));
            set_lump(&map, &output, &lump_name, payload)?;
            Ok(())
        }
        Command::Unset {
            map,
            lump_name,
            output,
        } => {
            let output = output.unwrap_or_else(|| output_path_for(&map));
            remove_lump(&map, &output, &lump_name)?;
            Ok(())
        }
        Command::Obfuscate { map, output, seed } => {
            let output = output.unwrap_or_else(|| output_path_for(&map));
            let mut obfuscator = match seed {
                Some(seed) => TextureNameObfuscator::seeded(seed),
                None => TextureNameObfuscator::from_clock(),
            };
            obfuscate_file(&map, &output, &mut obfuscator)?;
            Ok(())
        }
    }
}

fn print_map(
    map: &Path,
    detail: Option<&str>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), Box<dyn Error>> {
    let mut file = File::open(map).map_err(|source| BspError::CannotOpenInput {
        path: map.to_path_buf(),
        source,
    })?;
    let bsp = BspFile::read(&mut file)?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    match detail {
        None => {
            let summary = Summary::new(map, &bsp);
            match format {
                OutputFormat::Text => output::write_text(&summary, &mut writer)?,
                OutputFormat::Json => output::write_json(&summary, &mut writer, pretty)?,
            }
        }
        Some(DECOUPLED_LM) => {
            let lightmaps = read_decoupled_lightmaps(&bsp, &mut file)?.unwrap_or_default();
            match format {
                OutputFormat::Text => output::write_lightmaps_text(&lightmaps, &mut writer)?,
                OutputFormat::Json => output::write_lightmaps_json(&lightmaps, &mut writer, pretty)?,
            }
        }
        Some(other) => return Err(BspError::UnsupportedDetail(other.to_string()).into()),
    }

    writer.flush()?;
    Ok(())
}
