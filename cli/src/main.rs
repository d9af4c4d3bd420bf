mod catalog;
mod generate;
mod normalize_fixtures;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Larder CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a recipe from pantry ingredients and print it as JSON
    Generate {
        /// Pantry ingredient (repeatable)
        #[arg(short, long = "ingredient", required = true)]
        ingredients: Vec<String>,
        /// Cuisine id or name (falls back to every cuisine when unknown)
        #[arg(long)]
        cuisine: Option<String>,
        /// Dietary preference label, e.g. "Vegan" (repeatable)
        #[arg(long = "diet")]
        diets: Vec<String>,
        /// Number of servings (default: 4)
        #[arg(long)]
        servings: Option<u32>,
        /// Catalog JSON file (default: the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Show how pantry entries resolve against the catalog
    Normalize {
        /// Raw pantry entries
        #[arg(required = true)]
        names: Vec<String>,
        /// Catalog JSON file (default: the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Catalog maintenance
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Normalizer golden fixture maintenance
    Fixtures {
        #[command(subcommand)]
        command: FixtureCommands,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// Validate a catalog file and print counts
    Validate {
        /// Catalog JSON file (default: the built-in catalog)
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum FixtureCommands {
    /// Rewrite fixture expectations to match current normalizer output
    Update {
        /// Fixtures directory (default: larder-core/tests/fixtures/normalize)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            ingredients,
            cuisine,
            diets,
            servings,
            catalog,
        } => {
            return generate::generate(
                ingredients,
                cuisine,
                diets,
                servings,
                catalog.as_deref(),
            );
        }
        Commands::Normalize { names, catalog } => {
            generate::normalize(&names, catalog.as_deref())?;
        }
        Commands::Catalog {
            command: CatalogCommands::Validate { path },
        } => {
            catalog::validate(path.as_deref())?;
        }
        Commands::Fixtures {
            command: FixtureCommands::Update { dir },
        } => {
            normalize_fixtures::update_fixtures(dir.as_deref())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
