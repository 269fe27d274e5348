//! bizquery CLI: browse the catalog and compile request bodies to SQL

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use bizquery::bootstrap::init_tracing;
use bizquery::catalog::{self, Catalog, Module};
use bizquery::engine::QueryCompiler;
use bizquery::EngineConfig;

#[derive(Parser)]
#[command(name = "bizquery")]
#[command(about = "Catalog-driven analytical queries compiled to parameterized SQL")]
#[command(version)]
struct Args {
    /// Config file (defaults to BIZQUERY_CONFIG or ./bizquery.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog YAML; overrides the config file
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog tables
    Tables {
        /// Only tables of this module (e.g. financeiro)
        #[arg(long)]
        module: Option<String>,
    },

    /// Print one table's metrics, dimensions and filters as JSON
    Describe {
        /// Table id or alias
        table: String,
    },

    /// Compile a request body to SQL without running it
    Compile {
        /// JSON body file, or `-` for stdin
        input: String,

        /// Treat the body as a module query for this module; otherwise it
        /// is an analytics request
        #[arg(long)]
        module: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::load()?,
    };
    if args.catalog.is_some() {
        config.catalog_path = args.catalog.clone();
    }
    let catalog = load_catalog(&config)?;

    match args.command {
        Commands::Tables { module } => list_tables(&catalog, module.as_deref()),
        Commands::Describe { table } => {
            let entry = catalog.lookup(&table)?;
            println!("{}", serde_json::to_string_pretty(entry)?);
            Ok(())
        }
        Commands::Compile { input, module } => {
            let body = read_body(&input)?;
            let compiled = QueryCompiler::new(catalog, config).compile_body(module.as_deref(), body)?;
            println!("{}", serde_json::to_string_pretty(&compiled.describe())?);
            Ok(())
        }
    }
}

fn load_catalog(config: &EngineConfig) -> Result<Arc<Catalog>> {
    match &config.catalog_path {
        Some(path) => {
            let catalog = Catalog::from_file(path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
            Ok(Arc::new(catalog))
        }
        None => Ok(catalog::builtin()?),
    }
}

fn list_tables(catalog: &Catalog, module: Option<&str>) -> Result<()> {
    let tables = match module {
        Some(m) => catalog.tables_in_module(m.parse::<Module>()?),
        None => catalog.tables().iter().collect(),
    };
    for entry in tables {
        println!(
            "{:<40} {:>3} metrics {:>3} dimensions {:>3} filters",
            entry.table.as_str(),
            entry.metrics.len(),
            entry.dimensions.len(),
            entry.filters.len()
        );
    }
    Ok(())
}

fn read_body(input: &str) -> Result<Value> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))?
    };
    Ok(serde_json::from_str(&text)?)
}
