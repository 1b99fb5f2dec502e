use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use levergraph_core::{init_tracing, ConfigManager};
use levergraph_tools::{
    ToolRegistry, BUILD_SEMANTIC_GRAPH, COMPUTE_TARGET_LEVERAGE, RANK_GLOBAL_LEVERAGE,
    RECOMMEND_INTERVENTIONS,
};
use serde_json::{json, Map, Value as JsonValue};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "levergraph")]
#[command(about = "LeverGraph CLI - KPI leverage analysis and experiment design", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Config file; defaults to .levergraph.toml lookup
    #[arg(short, long, global = true, env = "LEVERGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a semantic graph from domain terms and save it
    Build {
        /// Comma-separated terms
        #[arg(short, long, value_delimiter = ',')]
        terms: Vec<String>,

        /// JSON file with a term list or {terms, relation_triples}
        #[arg(long)]
        terms_file: Option<PathBuf>,

        /// Minimum cosine similarity for an edge
        #[arg(long)]
        threshold: Option<f64>,

        /// Text file scanned for relation statements
        #[arg(long)]
        corpus_file: Option<PathBuf>,

        /// Comma-separated actionable terms
        #[arg(short, long, value_delimiter = ',')]
        actionable: Vec<String>,

        /// Artifact path or bare name under the artifact directory
        #[arg(short = 'g', long)]
        graph: String,
    },

    /// Rank levers for one target KPI
    Leverage {
        #[arg(short = 'g', long)]
        graph: String,

        #[arg(long)]
        target: String,

        /// JSON file of model coefficients per term
        #[arg(long)]
        effects_file: Option<PathBuf>,

        #[arg(short, long, value_delimiter = ',')]
        actionable: Vec<String>,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Design experiments for a lever and target pair
    Recommend {
        #[arg(short = 'g', long)]
        graph: String,

        #[arg(long)]
        lever: String,

        #[arg(long)]
        target: String,

        /// JSON file of measured past effects per lever
        #[arg(long)]
        history_file: Option<PathBuf>,

        #[arg(long)]
        top_paths: Option<usize>,
    },

    /// Rank every term by global leverage over a KPI
    Rank {
        #[arg(short = 'g', long)]
        graph: String,

        #[arg(long)]
        kpi: String,

        #[arg(short, long, value_delimiter = ',')]
        actionable: Vec<String>,
    },

    /// List tool schemas
    Tools,

    /// Write a default config file
    InitConfig {
        #[arg(default_value = ".levergraph.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<JsonValue> {
    // None lists the tool schemas
    let call = match &cli.command {
        Commands::InitConfig { path } => return init_config(path),
        Commands::Tools => None,
        Commands::Build {
            terms,
            terms_file,
            threshold,
            corpus_file,
            actionable,
            graph,
        } => {
            let mut params = Map::new();
            params.insert("terms".into(), json!(terms));
            params.insert("output_path".into(), json!(graph));
            insert_opt(&mut params, "terms_path", terms_file)?;
            insert_opt(&mut params, "similarity_threshold", threshold)?;
            insert_list(&mut params, "actionable_terms", actionable);
            if let Some(path) = corpus_file {
                let corpus = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read corpus {}", path.display()))?;
                params.insert("corpus".into(), json!(corpus));
            }
            Some((BUILD_SEMANTIC_GRAPH, params))
        }
        Commands::Leverage {
            graph,
            target,
            effects_file,
            actionable,
            top_k,
        } => {
            let mut params = Map::new();
            params.insert("graph_path".into(), json!(graph));
            params.insert("target".into(), json!(target));
            insert_opt(&mut params, "model_effects_path", effects_file)?;
            insert_list(&mut params, "actionable_terms", actionable);
            insert_opt(&mut params, "top_k", top_k)?;
            Some((COMPUTE_TARGET_LEVERAGE, params))
        }
        Commands::Recommend {
            graph,
            lever,
            target,
            history_file,
            top_paths,
        } => {
            let mut params = Map::new();
            params.insert("graph_path".into(), json!(graph));
            params.insert("lever".into(), json!(lever));
            params.insert("target".into(), json!(target));
            insert_opt(&mut params, "historical_effects_path", history_file)?;
            insert_opt(&mut params, "top_paths", top_paths)?;
            Some((RECOMMEND_INTERVENTIONS, params))
        }
        Commands::Rank {
            graph,
            kpi,
            actionable,
        } => {
            let mut params = Map::new();
            params.insert("graph_path".into(), json!(graph));
            params.insert("kpi".into(), json!(kpi));
            insert_list(&mut params, "actionable_terms", actionable);
            Some((RANK_GLOBAL_LEVERAGE, params))
        }
    };

    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;

    let mut config = manager.config().clone();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_tracing(&config.logging);
    if let Some(path) = manager.config_path() {
        debug!("Using config file {}", path.display());
    }

    let registry = ToolRegistry::from_config(config).context("Failed to initialise tools")?;

    let Some((tool, params)) = call else {
        return Ok(serde_json::to_value(registry.schemas())?);
    };

    let response = registry.execute(tool, JsonValue::Object(params)).await;
    if !response.is_completed() {
        anyhow::bail!(
            "{} [{}]",
            response.message,
            response.error_kind.as_deref().unwrap_or("unknown")
        );
    }
    Ok(response.to_json())
}

fn init_config(path: &Path) -> Result<JsonValue> {
    ConfigManager::create_default_config(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(json!({"config_path": path.display().to_string(), "status": "created"}))
}

fn insert_opt<T: serde::Serialize>(
    params: &mut Map<String, JsonValue>,
    key: &str,
    value: &Option<T>,
) -> Result<()> {
    if let Some(value) = value {
        params.insert(key.to_string(), serde_json::to_value(value)?);
    }
    Ok(())
}

/// An empty list means "not given", so the tool applies its default.
fn insert_list(params: &mut Map<String, JsonValue>, key: &str, values: &[String]) {
    if !values.is_empty() {
        params.insert(key.to_string(), json!(values));
    }
}

fn print_output(format: &OutputFormat, value: &JsonValue) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value, 0);
        }
    }
    Ok(())
}

fn print_pretty(value: &JsonValue, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        JsonValue::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    JsonValue::String(s) => println!("{}{}: {}", indent, key_colored, s.green()),
                    JsonValue::Number(n) => {
                        println!("{}{}: {}", indent, key_colored, n.to_string().yellow())
                    }
                    JsonValue::Bool(b) => {
                        let val_colored = if *b { "true".green() } else { "false".red() };
                        println!("{}{}: {}", indent, key_colored, val_colored);
                    }
                    JsonValue::Array(items) if items.iter().all(|i| !i.is_object()) => {
                        let joined: Vec<String> = items
                            .iter()
                            .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                            .collect();
                        println!("{}{}: {}", indent, key_colored, joined.join(" -> "));
                    }
                    _ => {
                        println!("{}{}:", indent, key_colored);
                        print_pretty(val, depth + 1);
                    }
                }
            }
        }
        JsonValue::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                println!("\n{}{}{}:", indent, "Item ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item, depth + 1);
            }
        }
        _ => println!("{}{}", indent, value),
    }
}
