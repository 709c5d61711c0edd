//! Host diagnostics CLI for the grove extension runtime.
//!
//! # Usage
//!
//! ```bash
//! # Load every extension and report conflicts
//! grove check ./extensions
//!
//! # Print the merged schema text
//! grove schema ./extensions
//!
//! # Print the ownership report
//! grove owners ./extensions --json
//!
//! # Dispatch a single field resolution for debugging
//! grove resolve ./extensions Query getIssue '{"id":"5"}'
//! ```

pub mod discover;

use clap::{Parser, Subcommand};
use colored::Colorize;
use discover::discover_bundles;
use grove_extension::{
    ExtensionInvoker, ExtensionLoader, LoadError, LoadPolicy, LoadedExtension, ResourceLimits,
    SandboxEngine,
};
use grove_registry::{FrozenRegistry, RegistryError, SchemaRegistry};
use grove_router::FieldRouter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "grove")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for per-extension databases
    #[arg(long, global = true, default_value = ".grove")]
    pub data_dir: PathBuf,

    /// Abort on the first failing extension instead of skipping it
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every extension bundle and report failures and conflicts
    Check {
        /// Directory containing extension bundles
        dir: PathBuf,
    },

    /// Print the merged rendered schema
    Schema {
        /// Directory containing extension bundles
        dir: PathBuf,
    },

    /// Print the type and root-field ownership report
    Owners {
        /// Directory containing extension bundles
        dir: PathBuf,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Dispatch one field resolution and print the JSON payload
    Resolve {
        /// Directory containing extension bundles
        dir: PathBuf,

        /// Owning type name (e.g. Query)
        type_name: String,

        /// Field name
        field: String,

        /// Argument values as JSON text
        #[arg(default_value = "{}")]
        args: String,
    },
}

/// The composed live schema: loaded extensions plus the frozen registry.
pub struct Composition {
    pub registry: Arc<FrozenRegistry>,
    pub live: Vec<LoadedExtension>,
    pub load_failures: Vec<LoadError>,
    pub registry_failures: Vec<RegistryError>,
}

impl Composition {
    pub fn has_failures(&self) -> bool {
        !self.load_failures.is_empty() || !self.registry_failures.is_empty()
    }
}

pub async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let policy = if cli.strict {
        LoadPolicy::AbortOnFailure
    } else {
        LoadPolicy::SkipFailed
    };

    match cli.command {
        Commands::Check { dir } => {
            let composition = compose(&dir, &cli.data_dir, policy)?;
            report_composition(&composition, cli.verbose);
            Ok(if composition.has_failures() { 1 } else { 0 })
        }
        Commands::Schema { dir } => {
            let composition = compose(&dir, &cli.data_dir, policy)?;
            print!("{}", composition.registry.render_sdl());
            Ok(if composition.has_failures() { 1 } else { 0 })
        }
        Commands::Owners { dir, json } => {
            let composition = compose(&dir, &cli.data_dir, policy)?;
            let report = composition.registry.ownership_report();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
            Ok(if composition.has_failures() { 1 } else { 0 })
        }
        Commands::Resolve {
            dir,
            type_name,
            field,
            args,
        } => {
            let composition = compose(&dir, &cli.data_dir, policy)?;
            let mut router = FieldRouter::new(Arc::clone(&composition.registry));
            for extension in &composition.live {
                router.register(Arc::clone(&extension.handle) as Arc<dyn ExtensionInvoker>);
            }

            match router.resolve(&type_name, &field, &args).await {
                Ok(json) => {
                    println!("{json}");
                    Ok(0)
                }
                Err(error) => {
                    eprintln!("{} {error}", "Error:".red().bold());
                    Ok(1)
                }
            }
        }
    }
}

/// Loads every discovered bundle and merges the survivors into a frozen
/// registry. Extensions whose fragments fail to merge are excluded from
/// the live set.
pub fn compose(
    dir: &Path,
    data_dir: &Path,
    policy: LoadPolicy,
) -> Result<Composition, Box<dyn std::error::Error>> {
    let bundles = discover_bundles(dir)?;
    let engine = SandboxEngine::new()?;
    let loader = ExtensionLoader::new(engine, data_dir, ResourceLimits::default());
    let report = loader.load_all(bundles, policy)?;

    let mut registry = SchemaRegistry::new();
    let mut live = Vec::new();
    let mut registry_failures = Vec::new();

    for extension in report.loaded {
        match registry.register(&extension.descriptor.name, &extension.fragment) {
            Ok(()) => live.push(extension),
            Err(error) => match policy {
                LoadPolicy::AbortOnFailure => return Err(error.into()),
                LoadPolicy::SkipFailed => registry_failures.push(error),
            },
        }
    }

    Ok(Composition {
        registry: Arc::new(registry.freeze()),
        live,
        load_failures: report.failed,
        registry_failures,
    })
}

fn report_composition(composition: &Composition, verbose: bool) {
    for extension in &composition.live {
        println!(
            "{} {} ({} types)",
            "OK".green().bold(),
            extension.descriptor.name,
            extension.fragment.len()
        );
        if verbose {
            println!("  db: {}", extension.descriptor.db_path.display());
        }
    }

    for error in &composition.load_failures {
        eprintln!("{} {}", "Error".red().bold(), error);
    }
    for error in &composition.registry_failures {
        eprintln!("{} {}", "Error".red().bold(), error);
    }

    if composition.has_failures() {
        eprintln!(
            "{} {} extension(s) excluded from the live schema",
            "Warning:".yellow().bold(),
            composition.load_failures.len() + composition.registry_failures.len()
        );
    } else {
        println!(
            "{} {} extension(s) loaded",
            "Success:".green().bold(),
            composition.live.len()
        );
    }
}
