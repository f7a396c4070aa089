//! cpg CLI - build code property graphs from Go sources

use clap::{Parser, Subcommand, ValueEnum};
use cpgraph::config::{self, CpgConfig};
use cpgraph::output::{self, GraphDocument};
use cpgraph::session::SuperClassPolicy;
use cpgraph::ui::ProgressManager;
use cpgraph::{TranslationManager, TranslationResult};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cpg")]
#[command(version)]
#[command(about = "Build a code property graph from Go sources")]
#[command(long_about = r#"
cpg translates every Go file under a directory into a translation-unit
subgraph (declarations, types, statements), then links includes and calls
across units.

Example usage:
  cpg translate --path ./pkg
  cpg translate --path . --format json --output graph.json
  cpg inspect --file geo/point.go
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate and link every source file under a directory
    Translate {
        /// Directory to translate
        #[arg(short, long)]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        /// Write the output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads for phase 1
        #[arg(short, long)]
        workers: Option<usize>,

        /// Drop superclass edges the engine refuses instead of failing the unit
        #[arg(long)]
        ignore_superclass_errors: bool,
    },

    /// Translate a single file and print its graph as JSON
    Inspect {
        /// File to translate
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Write a default cpg.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = config::load_config(Some(&config_path))?.unwrap_or_default();

    match cli.command {
        Commands::Translate {
            path,
            format,
            output,
            workers,
            ignore_superclass_errors,
        } => {
            let mut options = config.build_options();
            if ignore_superclass_errors {
                options.super_class_policy = SuperClassPolicy::Ignore;
            }
            let mut manager = TranslationManager::new()
                .with_options(options)
                .with_node_limit(config.max_nodes);
            if let Some(n) = workers.or(config.workers) {
                manager = manager.with_workers(n);
            }

            let started = Instant::now();
            let progress = if output::is_quiet() {
                None
            } else {
                let (progress, tx) = ProgressManager::new(0);
                manager = manager.with_progress(tx);
                Some(progress)
            };

            tracing::info!("Translating {}", path.display());
            let result = manager.translate_path(&path, &config.exclude)?;
            // closes the progress channel so the renderer thread can finish
            drop(manager);

            if let Some(progress) = progress {
                progress.finish_with_summary(
                    started.elapsed(),
                    &result.stats(),
                    &result.linker,
                    result.failures.len(),
                );
            }

            let rendered = match format {
                Format::Json => GraphDocument::new(&result).to_json()?,
                Format::Text => render_text(&result),
            };
            emit(&rendered, output.as_deref())?;

            if !result.failures.is_empty() {
                anyhow::bail!("{} of {} units failed", result.failures.len(), result.units.len() + result.failures.len());
            }
        }

        Commands::Inspect { file } => {
            let content = std::fs::read_to_string(&file)?;
            let name = file.to_string_lossy().to_string();
            let result = TranslationManager::new()
                .with_options(config.build_options())
                .with_workers(1)
                .translate_sources(vec![(name, content)]);

            if let Some(failure) = result.failures.first() {
                anyhow::bail!("{}", failure);
            }
            println!("{}", GraphDocument::new(&result).to_json()?);
        }

        Commands::Init { force } => {
            config::write_config(&config_path, &CpgConfig::default(), force)?;
            println!("Wrote {}", config_path.display());
        }
    }

    Ok(())
}

fn render_text(result: &TranslationResult) -> String {
    let mut out = String::new();
    for unit in &result.units {
        out.push_str(&format!(
            "{} (package {}): {} nodes\n",
            unit.path,
            unit.package,
            unit.graph.len()
        ));
    }
    for failure in &result.failures {
        out.push_str(&format!("FAILED {}\n", failure));
    }
    out.push('\n');
    out.push_str(&result.stats().to_string());
    out.push_str(&result.linker.to_string());
    out
}

fn emit(rendered: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
