use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use vendor_compliance::catalog::DIVISIONS;
use vendor_compliance::config::AppConfig;
use vendor_compliance::db::Database;
use vendor_compliance::export::{write_items, write_items_to_file, Exportable};
use vendor_compliance::logging::init_logging;
use vendor_compliance::models::OutputFormat;
use vendor_compliance::search::SearchRequest;
use vendor_compliance::service::{ServiceSettings, VendorService};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra configuration file layered over the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a vendor certificate sheet, replacing all stored vendors
    IngestVendors {
        /// CSV export of the vendor sheet
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Ingest a vendor details sheet, updating matching companies
    IngestDetails {
        /// CSV export of the details sheet
        #[arg(short, long)]
        file: PathBuf,

        /// Rows above the header row
        #[arg(long)]
        skip_rows: Option<usize>,
    },
    /// Search vendors by name, division, trade and registrations
    Search {
        /// Vendor or company name
        #[arg(short, long)]
        name: Option<String>,

        /// Division, e.g. "22 - Plumbing" or "22"
        #[arg(short, long)]
        division: Option<String>,

        /// Trade within the division
        #[arg(short, long)]
        trade: Option<String>,

        /// Only vendors with a DIR number
        #[arg(long)]
        has_dir: bool,

        /// Only vendors with a CA license
        #[arg(long)]
        has_ca_license: bool,

        /// Rank by name similarity
        #[arg(long)]
        fuzzy: bool,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (txt, csv or json)
        #[arg(long)]
        format: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List every stored vendor record
    List {
        /// Output format (txt, csv or json)
        #[arg(long)]
        format: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the division and trade catalogue
    Divisions,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_file = config.log_file();
    let _guard = match init_logging(Some(&config.get_log_level()), log_file.as_deref(), config.log_format()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &AppConfig, command: Commands) -> Result<()> {
    if let Commands::Divisions = command {
        return print_divisions();
    }

    let database_url = config.get_database_url();
    let db = Database::with_pool(&database_url, config.database.max_connections, config.connection_timeout())
        .with_context(|| format!("Failed to open database {database_url}"))?;
    let mut service = VendorService::new(Box::new(db), ServiceSettings::from(config))?;

    info!("Starting vendor-compliance");

    match command {
        Commands::IngestVendors { file } => {
            let summary = service
                .ingest_vendor_file(&file, Local::now().naive_local())
                .with_context(|| format!("Failed to ingest vendor sheet {}", file.display()))?;
            let mut stdout = io::stdout().lock();
            writeln!(
                stdout,
                "Ingested {} rows: {} vendors written, {} approved",
                summary.rows_read, summary.vendors_written, summary.vendors_approved
            )?;
            writeln!(
                stdout,
                "Certificate rows: {}, unclassified rows: {}, dropped (no vendor): {}, dropped (project filter): {}",
                summary.certificate_rows,
                summary.unclassified_rows,
                summary.dropped_without_vendor,
                summary.dropped_by_project_filter
            )?;
        }
        Commands::IngestDetails { file, skip_rows } => {
            let summary = service
                .ingest_details_file(&file, skip_rows)
                .with_context(|| format!("Failed to ingest details sheet {}", file.display()))?;
            writeln!(
                io::stdout(),
                "Read {} rows: {} upserted, {} duplicates, {} without a company name",
                summary.rows_read, summary.upserted, summary.duplicates, summary.skipped_empty
            )?;
        }
        Commands::Search {
            name,
            division,
            trade,
            has_dir,
            has_ca_license,
            fuzzy,
            limit,
            format,
            output,
        } => {
            let request = SearchRequest {
                name,
                division,
                trade,
                has_dir,
                has_ca_license,
                fuzzy,
                limit,
            };
            let views = service.search(&request, Local::now().naive_local())?;
            info!("Found {} vendors", views.len());
            emit(&views, output_format(config, format.as_deref())?, output.as_deref())?;
        }
        Commands::List { format, output } => {
            let vendors = service.list_vendors()?;
            let counts = service.counts()?;
            info!(vendors = counts.vendors, details = counts.vendor_details, "Listing stored vendors");
            emit(&vendors, output_format(config, format.as_deref())?, output.as_deref())?;
        }
        Commands::Divisions => {}
    }

    Ok(())
}

fn output_format(config: &AppConfig, format: Option<&str>) -> Result<OutputFormat> {
    match format {
        Some(format) => Ok(OutputFormat::from_str(format)?),
        None => Ok(config.export_format()),
    }
}

fn emit<T: Exportable>(items: &[T], format: OutputFormat, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_items_to_file(items, format, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} records to {}", items.len(), path.display());
        }
        None => write_items(items, format, io::stdout().lock())?,
    }
    Ok(())
}

fn print_divisions() -> Result<()> {
    let mut stdout = io::stdout().lock();
    for division in DIVISIONS {
        writeln!(stdout, "{}", division.name)?;
        for trade in division.trades {
            writeln!(stdout, "    {trade}")?;
        }
    }
    Ok(())
}
