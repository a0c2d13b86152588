//! Catalog CLI - process "catálogo madre" spreadsheets
//!
//! # Main Commands
//!
//! ```bash
//! catalog process catalogo.xlsx --zone INTERIOR --lines 1,2,8
//! catalog process catalogo.xlsx --zone GBA-CABA --all-lines -o salida.xlsx --report run.json
//! ```
//!
//! # Helper Commands
//!
//! ```bash
//! catalog inspect catalogo.xlsx     # Show how columns are resolved
//! catalog profile -o perfil.json    # Dump the default profile
//! catalog lines                     # List selectable lines
//! ```

use clap::{Parser, Subcommand};
use catalog::transform::{resolve_line_column, resolve_order_column, resolve_price_columns, LineResolver};
use catalog::{
    load_catalog, process_file, Profile, ProcessOptions, RunLog, RunReport, SourceFormat, Zone,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Filter, price, sort and pad spreadsheet product catalogs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full run: load → rules → padding → styled xlsx
    Process {
        /// Input catalog (xlsx, xlsm, xlsb, xls, ods, csv)
        input: PathBuf,

        /// Pricing zone: GBA-CABA or INTERIOR
        #[arg(short, long)]
        zone: Zone,

        /// Lines to process, comma separated (e.g. 1,2,8)
        #[arg(
            short,
            long,
            value_delimiter = ',',
            required_unless_present = "all_lines",
            conflicts_with = "all_lines"
        )]
        lines: Vec<u32>,

        /// Process every selectable line
        #[arg(long)]
        all_lines: bool,

        /// Output workbook (default: <input>_procesado.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Processing profile JSON (default: built-in)
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Load a catalog and show how its columns are resolved
    Inspect {
        /// Input catalog
        input: PathBuf,

        /// Processing profile JSON (default: built-in)
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },

    /// Print the default processing profile
    Profile {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the selectable product lines
    Lines {
        /// Processing profile JSON (default: built-in)
        #[arg(short, long)]
        profile: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            input,
            zone,
            lines,
            all_lines,
            output,
            profile,
            report,
        } => cmd_process(
            &input,
            zone,
            lines,
            all_lines,
            output,
            profile.as_deref(),
            report.as_deref(),
        ),

        Commands::Inspect { input, profile } => cmd_inspect(&input, profile.as_deref()),

        Commands::Profile { output } => cmd_profile(output.as_deref()),

        Commands::Lines { profile } => cmd_lines(profile.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_process(
    input: &Path,
    zone: Zone,
    lines: Vec<u32>,
    all_lines: bool,
    output: Option<PathBuf>,
    profile_path: Option<&Path>,
    report: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let profile = load_profile(profile_path)?;
    let lines = if all_lines { profile.lines.fixed.clone() } else { lines };
    let options = ProcessOptions {
        zone,
        lines: lines.clone(),
        output,
        profile,
    };

    let outcome = match process_file(input, &options) {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(path) = report {
                RunReport::failure(input, zone, &lines, e.to_string()).save(path)?;
                eprintln!("   💾 Report saved to: {}", path.display());
            }
            return Err(e.into());
        }
    };

    eprintln!("{}", outcome.run.log.render());

    eprintln!("\n--- PREVIEW ---");
    eprintln!("First {} rows:", options.profile.export.preview_rows);
    eprintln!("{}", outcome.preview);
    eprintln!("--- END PREVIEW ---\n");
    eprintln!("{}", outcome.ready_line());

    if !outcome.run.warnings.is_empty() {
        eprintln!("⚠️  {} warning(s):", outcome.run.warnings.len());
        for warning in &outcome.run.warnings {
            eprintln!("   - {}", warning);
        }
    }

    if let Some(path) = report {
        RunReport::from_outcome(&outcome).save(path)?;
        eprintln!("   💾 Report saved to: {}", path.display());
    }

    eprintln!("\n✨ Done! {} rows → {}", outcome.run.table.len(), outcome.output.display());
    Ok(())
}

fn cmd_inspect(input: &Path, profile_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Inspecting: {}", input.display());

    let profile = load_profile(profile_path)?;
    let loaded = load_catalog(input, &profile.source)?;
    let table = &loaded.table;

    match loaded.format {
        SourceFormat::Spreadsheet => {
            if let Some(sheet) = &loaded.sheet {
                eprintln!("   Sheet: {}", sheet);
            }
        }
        SourceFormat::Delimited => {
            eprintln!("   Encoding: {}", loaded.encoding.as_deref().unwrap_or("?"));
            eprintln!("   Delimiter: '{}'", loaded.delimiter.map(format_delimiter).unwrap_or_default());
        }
    }
    eprintln!("   Header row: {}", profile.source.header_row + 1);
    eprintln!("   Rows: {}", table.len());
    eprintln!("   Columns: {}", table.columns().join(", "));

    eprintln!("\n🔎 Column resolution:");
    match resolve_line_column(table, &profile.lines) {
        Some(line) => {
            let how = match line.resolver {
                LineResolver::Exact => "header match",
                LineResolver::UnnamedFallback => "unnamed column fallback",
            };
            eprintln!("   ✓ Line column: '{}' ({})", line.name, how);
        }
        None => eprintln!("   ⚠️ Line column not found, every row would be processed"),
    }

    for zone in Zone::all() {
        let mut log = RunLog::new();
        match resolve_price_columns(table, zone, &profile.pricing, &mut log) {
            Ok(prices) => eprintln!(
                "   ✓ Prices {}: {} / {}{}",
                zone,
                prices.default,
                prices.offer,
                if prices.fallback { " (alternate)" } else { "" }
            ),
            Err(warning) => eprintln!("   ⚠️ {}", warning),
        }
    }

    match resolve_order_column(table, &profile.pricing) {
        Some(column) => eprintln!("   ✓ Order code column: '{}'", column),
        None => eprintln!("   ⚠️ No order code column, offers cannot apply"),
    }

    Ok(())
}

fn cmd_profile(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = Profile::default().to_json()?;
    write_output(&json, output)
}

fn cmd_lines(profile_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let profile = load_profile(profile_path)?;
    eprintln!("📋 Selectable lines:");
    for line in &profile.lines.fixed {
        println!("{}", line);
    }
    Ok(())
}

fn load_profile(path: Option<&Path>) -> Result<Profile, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let profile = Profile::from_file(path)?;
            eprintln!("   Profile: {}", path.display());
            Ok(profile)
        }
        None => Ok(Profile::default()),
    }
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("   💾 Saved to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
