//! `fsl` - command-line interface for the FSL schema toolchain.
//!
//! Every subcommand reads one or more schema files, merges them in
//! argument order, runs the requested operation and writes the result to
//! stdout. Diagnostics go to stderr via tracing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fsl::pipeline::{canonical_request, parse_sources, CanonicalRequest};
use fsl::{DeclarationKind, SchemaTree};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "fsl")]
#[command(about = "Schema toolchain for FSL", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge schema files and print the canonical form
    Canonical {
        /// Schema files, merged in argument order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Sort declarations by (kind, name) before printing
        #[arg(long)]
        sort: bool,

        /// Destination filename; enables the inline source map
        #[arg(long)]
        source_map: Option<String>,

        /// JSON file holding an {original: mangled} map for symbols
        #[arg(long)]
        mangled_map: Option<PathBuf>,
    },

    /// Rename every function to its content-addressed form
    Link {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print only the {original: mangled} JSON map
        #[arg(long)]
        map_only: bool,
    },

    /// Fuse same-named role declarations
    MergeRoles {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Keep only declarations of the given kind
    Filter {
        /// One of: access_provider, collection, function, role
        kind: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Remove one declaration by kind and name
    Remove {
        /// One of: access_provider, collection, function, role
        kind: String,

        /// Declaration name
        name: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Drop privilege entries naming a resource from every role
    StripResource {
        /// Resource name to strip
        name: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List declarations as JSON
    List {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Emit TypeScript definitions for collections
    Ts {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fsl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Canonical {
            files,
            sort,
            source_map,
            mangled_map,
        } => {
            let mut tree = load(&files)?;
            if sort {
                tree.sort();
            }
            let mangled_json = match &mangled_map {
                Some(path) => Some(
                    fs::read_to_string(path)
                        .with_context(|| format!("reading {}", path.display()))?,
                ),
                None => None,
            };
            let out = canonical_request(
                &tree,
                &CanonicalRequest {
                    source_map_file: source_map.as_deref(),
                    mangled_map_json: mangled_json.as_deref(),
                    sources_json: None,
                },
            );
            print!("{out}");
        }

        Command::Link { files, map_only } => {
            let mut tree = load(&files)?;
            let map = fsl::link_functions(&mut tree)?;
            info!("linked {} functions", map.len());
            if map_only {
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                print!("{}", fsl::canonical(&tree));
            }
        }

        Command::MergeRoles { files } => {
            let tree = fsl::merge_roles(load(&files)?)?;
            print!("{}", fsl::canonical(&tree));
        }

        Command::Filter { kind, files } => {
            let kind: DeclarationKind = kind.parse()?;
            let tree = load(&files)?;
            print!("{}", fsl::canonical(&tree.filter(kind)));
        }

        Command::Remove { kind, name, files } => {
            let kind: DeclarationKind = kind.parse()?;
            let mut tree = load(&files)?;
            if !tree.remove(kind, &name) {
                warn!("no {kind} named {name:?} found");
            }
            print!("{}", fsl::canonical(&tree));
        }

        Command::StripResource { name, files } => {
            let mut tree = load(&files)?;
            tree.strip_roles_resource(&name);
            print!("{}", fsl::canonical(&tree));
        }

        Command::List { files } => {
            let tree = load(&files)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&tree.list_declarations())?
            );
        }

        Command::Ts { files } => {
            let tree = load(&files)?;
            print!("{}", fsl::typescript_definitions(&tree));
        }
    }
    Ok(())
}

/// Read and parse every file, merging in argument order.
fn load(files: &[PathBuf]) -> Result<SchemaTree> {
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        sources.push((path.clone(), text));
    }
    Ok(parse_sources(sources)?)
}
