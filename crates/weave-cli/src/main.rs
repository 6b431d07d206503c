//! Weave CLI entry point.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rhizome_weave_build::{BuildAggregator, BuildConfig, BuildPlan, build_plan};
use rhizome_weave_codegen_js::{CompileContext, FormError, MacroInvocation, OutputMode, registry};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Weave JavaScript package builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a build plan into a package directory
    Build {
        /// Build plan JSON file
        plan: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Module convention (commonjs or esm)
        #[arg(short, long)]
        mode: Option<OutputMode>,

        /// Do not embed source maps
        #[arg(long)]
        no_source_map: bool,

        /// Do not run the package installer
        #[arg(long)]
        no_install: bool,

        /// Build config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Expand a single special form invocation
    Expand {
        /// Invocation JSON file (or - for stdin)
        file: String,

        /// Module convention (commonjs or esm)
        #[arg(short, long, default_value = "commonjs")]
        mode: OutputMode,
    },

    /// List the registered special forms
    Forms,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("weave=info".parse()?)
                .add_directive("rhizome_weave=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            plan,
            out,
            mode,
            no_source_map,
            no_install,
            config,
        } => {
            let mut config = match config {
                Some(path) => BuildConfig::from_file(&path)?,
                None => BuildConfig::default(),
            };
            if let Some(mode) = mode {
                config.output_mode = mode;
            }
            if no_source_map {
                config.source_maps = false;
            }
            if no_install {
                config.install = false;
            }

            info!("Building {} into {}", plan.display(), out.display());
            let build = BuildPlan::load(&plan).await?;
            let aggregator = BuildAggregator::from_config(&config);
            let report = build_plan(
                &aggregator,
                config.output_mode,
                build,
                &out,
                config.source_maps,
            )
            .await?;

            for file in &report.files {
                println!("Wrote: {}", file.display());
            }
            if let Some(status) = &report.install {
                println!("Install: {}", status);
            }
        }

        Commands::Expand { file, mode } => {
            let input = if file == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(&file)?
            };

            let invocation: MacroInvocation = serde_json::from_str(&input)?;
            let mut ctx = CompileContext::new(mode);
            let code = registry()
                .expand(&mut ctx, &invocation)
                .unwrap_or_else(|| {
                    Err(FormError::UnknownForm {
                        namespace: invocation.namespace.clone(),
                        selector: invocation.selector.clone(),
                    })
                })?;

            let imports: Vec<_> = ctx
                .imports()
                .iter()
                .map(|record| {
                    json!({
                        "source": record.source,
                        "binding": record.binding.as_str(),
                        "is_relative": record.is_relative,
                    })
                })
                .collect();
            let dependencies: Vec<_> = ctx
                .dependencies()
                .iter()
                .map(|record| {
                    let metadata: serde_json::Map<String, serde_json::Value> = record
                        .metadata
                        .iter()
                        .map(|(key, value)| (key.clone(), value.to_json()))
                        .collect();
                    json!({
                        "name": record.name,
                        "version": record.version,
                        "metadata": metadata,
                    })
                })
                .collect();

            let output = json!({
                "code": code,
                "imports": imports,
                "dependencies": dependencies,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Commands::Forms => {
            for form in registry().forms() {
                let name = format!("{}.{}", form.namespace, form.selector);
                let lazy = if form.lazy { " (lazy)" } else { "" };
                println!("{:<20} {}{}", name, form.description, lazy);
            }
        }
    }

    Ok(())
}
