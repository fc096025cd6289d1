//! needs_sync command line interface
//!
//! Runs export, import and validation against a serialized in-memory model
//! graph (the snapshot file written by `InMemoryGraph::save`).
//!
//! # Usage
//!
//! ```bash
//! # Export the whole project
//! needs_sync export --graph model.json --out build/needs.json
//!
//! # Export two diagrams into one file, without actors
//! needs_sync export --graph model.json --out needs.json --diagram Billing --diagram Shipping --no-actors
//!
//! # Import into a requirements diagram and save the updated snapshot
//! needs_sync import --graph model.json --needs needs.json --requirements
//!
//! # Check a needs file; --strict fails on warnings too
//! needs_sync validate needs.json --strict
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use needs_sync::service::LogReporter;
use needs_sync::store;
use needs_sync::{
    validate_document, ImportTarget, InMemoryGraph, PassReport, SyncConfig,
    SyncService, SyncWorker,
};

#[derive(Parser)]
#[command(name = "needs_sync")]
#[command(version)]
#[command(about = "Synchronize a model graph with a Sphinx-Needs JSON document")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log progress at info level
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the model graph to a needs file
    Export {
        /// Model graph snapshot
        #[arg(long, short = 'g')]
        graph: PathBuf,

        /// Output needs file
        #[arg(long, short = 'o')]
        out: PathBuf,

        /// Export only these diagrams, as one file (repeatable)
        #[arg(long, short = 'd')]
        diagram: Vec<String>,

        /// Project label to use instead of the graph's
        #[arg(long)]
        project: Option<String>,

        /// Version label to write
        #[arg(long)]
        version: Option<String>,

        #[arg(long)]
        no_use_cases: bool,

        #[arg(long)]
        no_actors: bool,

        #[arg(long)]
        no_requirements: bool,

        /// Leave link lists empty
        #[arg(long)]
        no_connections: bool,

        /// Blank content, status and priority
        #[arg(long)]
        no_metadata: bool,

        /// YAML configuration file
        #[arg(long, short = 'c', env = "NEEDS_SYNC_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Import a needs file into a new diagram
    Import {
        /// Model graph snapshot; rewritten after the import
        #[arg(long, short = 'g')]
        graph: PathBuf,

        /// Needs file to import
        #[arg(long, short = 'n')]
        needs: PathBuf,

        /// Import into a requirements diagram
        #[arg(long)]
        requirements: bool,

        /// YAML configuration file
        #[arg(long, short = 'c', env = "NEEDS_SYNC_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Check a needs file
    Validate {
        file: PathBuf,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Export {
            graph,
            out,
            diagram,
            project,
            version,
            no_use_cases,
            no_actors,
            no_requirements,
            no_connections,
            no_metadata,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            let options = &mut config.export;
            options.include_use_cases &= !no_use_cases;
            options.include_actors &= !no_actors;
            options.include_requirements &= !no_requirements;
            options.include_connections &= !no_connections;
            options.include_metadata &= !no_metadata;
            if version.is_some() {
                options.version = version;
            }
            cmd_export(&graph, &out, &diagram, project, config).await
        }
        Commands::Import {
            graph,
            needs,
            requirements,
            config,
        } => {
            let target = if requirements {
                ImportTarget::RequirementsDiagram
            } else {
                ImportTarget::UseCaseDiagram
            };
            let config = load_config(config.as_deref())?;
            cmd_import(&graph, &needs, target, config).await
        }
        Commands::Validate { file, strict } => cmd_validate(&file, strict),
    }
}

fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    match path {
        Some(path) => SyncConfig::load_from_file(path),
        None => Ok(SyncConfig::default()),
    }
}

fn load_graph(path: &Path) -> Result<InMemoryGraph> {
    InMemoryGraph::load(path).with_context(|| format!("Loading graph {}", path.display()))
}

async fn cmd_export(
    graph_path: &Path,
    out: &Path,
    diagrams: &[String],
    project: Option<String>,
    config: SyncConfig,
) -> Result<()> {
    let mut graph = load_graph(graph_path)?;
    if project.is_some() {
        graph.project = project;
    }
    let options = config.export.clone();

    let summary = if diagrams.is_empty() {
        let worker = SyncWorker::new(graph, config, Arc::new(LogReporter));
        worker.spawn_export(options, out.to_path_buf())?.await??
    } else {
        SyncService::new(config, &LogReporter).export_diagrams(&graph, diagrams, &options, out)?
    };

    print_report(&summary.report);
    println!(
        "Exported {} needs to {}",
        summary.needs_amount,
        summary.path.display()
    );
    Ok(())
}

async fn cmd_import(
    graph_path: &Path,
    needs: &Path,
    target: ImportTarget,
    config: SyncConfig,
) -> Result<()> {
    let graph = load_graph(graph_path)?;
    let worker = SyncWorker::new(graph, config, Arc::new(LogReporter));
    let outcome = worker.spawn_import(needs.to_path_buf(), target)?.await??;

    let shared = worker.graph();
    let graph = shared
        .lock()
        .map_err(|_| anyhow::anyhow!("graph lock poisoned"))?;
    graph
        .save(graph_path)
        .with_context(|| format!("Saving graph {}", graph_path.display()))?;

    print_report(&outcome.report);
    println!(
        "Imported into '{}': {} created, {} reused, {} connectors created, {} reused",
        outcome.diagram_name,
        outcome.created(),
        outcome.reused(),
        outcome.connectors_created,
        outcome.connectors_reused
    );
    Ok(())
}

fn cmd_validate(file: &Path, strict: bool) -> Result<()> {
    let doc = store::read_document(file)?;
    let issues = validate_document(&doc);
    for issue in &issues {
        println!("{}", issue);
    }

    let errors = issues.iter().filter(|i| i.is_error()).count();
    let warnings = issues.len() - errors;
    if errors > 0 || (strict && warnings > 0) {
        bail!("{} errors, {} warnings", errors, warnings);
    }
    println!("OK ({} warnings)", warnings);
    Ok(())
}

fn print_report(report: &PassReport) {
    for issue in report.issues() {
        eprintln!("warning: {}", issue);
    }
}
