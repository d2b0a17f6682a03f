//! widecol command-line interface
//!
//! Provisions, seeds, browses and edits the tables of a widecol store.
//!
//! # Usage
//!
//! ```bash
//! # Drop everything, recreate the storefront tables and fill them
//! widecol init
//!
//! # Browse
//! widecol tables
//! widecol show products
//! widecol query products_by_category --param category_3
//! widecol filter users name "Riley Rossi"
//!
//! # Edit
//! widecol put products product_7 price=19 "description=Now in blue"
//! widecol put users user_3 --json '{"email": "new@example.com"}'
//! widecol delete products product_7
//!
//! # Output as JSON or CSV
//! widecol -o json show categories
//! ```
//!
//! Exit status is 0 on success, including queries that match no rows, and
//! 1 on failure.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use widecol_data::RandomSource;
use widecol_store::RemoteConnector;

mod commands;
mod config;
mod formatter;

use commands::{App, Outcome};
use config::CliConfig;
use formatter::OutputFormat;

/// widecol command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "widecol",
    version,
    about = "Command-line interface for widecol",
    long_about = "Provision, seed, browse and edit the tables of a widecol store.\n\n\
                  Settings come from the config file, then WIDECOL_HOST / WIDECOL_PORT,\n\
                  then the flags below."
)]
struct Args {
    /// Store hostname
    #[arg(short = 'H', long, global = true)]
    host: Option<String>,

    /// Store port
    #[arg(short = 'p', long, global = true)]
    port: Option<u16>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Schema file (TOML, `[[table]]` entries)
    #[arg(long, value_name = "FILE", global = true)]
    schema: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, global = true)]
    output: Option<OutputFormatArg>,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop every table, recreate the schema and seed demo data
    Init {
        /// Create the tables but do not seed them
        #[arg(long)]
        no_seed: bool,

        /// Seed for reproducible demo data
        #[arg(long, value_name = "N")]
        rng_seed: Option<u64>,
    },

    /// List tables in the store
    Tables,

    /// List named queries
    Queries,

    /// Show every row of a table
    Show {
        /// Table name
        table: String,
    },

    /// Write fields onto a row, creating it if needed
    Put {
        /// Table name
        table: String,
        /// Row id
        id: String,
        /// Fields as key=value; keys may be family:qualifier
        fields: Vec<String>,
        /// Fields as a flat JSON object
        #[arg(long, value_name = "OBJECT")]
        json: Option<String>,
    },

    /// Delete a row
    Delete {
        /// Table name
        table: String,
        /// Row id
        id: String,
    },

    /// Run a named query
    Query {
        /// Query name (see `widecol queries`)
        name: String,
        /// Value compared against the query's filter field
        #[arg(long)]
        param: Option<String>,
    },

    /// Show rows whose field equals a value exactly
    Filter {
        /// Table name
        table: String,
        /// Field name, bare or family:qualifier
        field: String,
        /// Expected value
        value: String,
    },
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Display results in a formatted table
    Table,
    /// Display results as JSON
    Json,
    /// Display results as CSV
    Csv,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;
    let format = match args.output {
        Some(arg) => arg.into(),
        None => config
            .output_format
            .parse::<OutputFormat>()
            .map_err(anyhow::Error::msg)?,
    };

    let connector = RemoteConnector::new(config.store.clone());
    debug!("Using store at {}", config.store.addr());
    let app = App::new(Arc::new(connector), config.schema()?);

    let outcome = match &args.command {
        Command::Init { no_seed, rng_seed } => {
            let source = match rng_seed {
                Some(seed) => RandomSource::seeded(*seed),
                None => RandomSource::from_entropy(),
            };
            let seed = (!no_seed).then_some((&config.seed, source));
            app.init(seed)?
        }
        Command::Tables => app.tables()?,
        Command::Queries => app.queries(),
        Command::Show { table } => app.show(table)?,
        Command::Put {
            table,
            id,
            fields,
            json,
        } => app.put(table, id, fields, json.as_deref())?,
        Command::Delete { table, id } => app.delete(table, id)?,
        Command::Query { name, param } => app.query(name, param.as_deref())?,
        Command::Filter {
            table,
            field,
            value,
        } => app.filter(table, field, value)?,
    };

    print_outcome(outcome, format);
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("widecol=debug,widecol_data=debug,widecol_store=debug")
    } else {
        EnvFilter::new("widecol=warn,widecol_data=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Defaults, then the config file, then the environment, then flags.
fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)?
    } else {
        CliConfig::load_default()?
    };

    config.store = config
        .store
        .with_env_overrides()
        .context("invalid store settings in environment")?;

    if let Some(host) = &args.host {
        config.store.host = host.clone();
    }
    if let Some(port) = args.port {
        config.store.port = port;
    }
    if let Some(schema) = &args.schema {
        config.schema_file = Some(schema.clone());
    }

    Ok(config)
}

fn print_outcome(outcome: Outcome, format: OutputFormat) {
    match outcome {
        Outcome::Rows(rows) => {
            if rows.is_empty() && format == OutputFormat::Table {
                println!("(no rows)");
            } else {
                println!("{}", formatter::format_rows(&rows, format));
            }
        }
        Outcome::List { header, items } => {
            println!("{}", formatter::format_list(header, &items, format));
        }
        Outcome::Message(message) => println!("{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_put() {
        let args = Args::try_parse_from([
            "widecol", "-o", "json", "put", "products", "product_1", "name=Widget", "price=3",
        ])
        .unwrap();
        assert!(matches!(args.output, Some(OutputFormatArg::Json)));
        match args.command {
            Command::Put { table, id, fields, json } => {
                assert_eq!(table, "products");
                assert_eq!(id, "product_1");
                assert_eq!(fields, vec!["name=Widget", "price=3"]);
                assert!(json.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_query_param() {
        let args = Args::try_parse_from([
            "widecol",
            "query",
            "orders_by_user",
            "--param",
            "user_4",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Query { ref name, param: Some(ref p) } if name == "orders_by_user" && p == "user_4"
        ));
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nhost = \"file.host\"\nport = 1111\n").unwrap();

        let args = Args::try_parse_from([
            "widecol",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "2222",
            "tables",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.store.port, 2222);
    }
}
