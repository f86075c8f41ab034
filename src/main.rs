use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use trace_graph::{Bootstrap, BuildConfig, ProjectGraph, ProjectScope, render};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "trace-graph")]
#[command(about = "Build and inspect a trace entity graph", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "warn", "trace_graph=debug").
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print counts, categories and trace roots as JSON.
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the call forest of one trace as JSON.
    Trace {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        trace_id: String,
    },
}

#[derive(Args)]
struct InputArgs {
    /// JSON array of versioned-object records.
    #[arg(long)]
    objects: String,

    /// JSON array of call-span records.
    #[arg(long)]
    calls: String,

    /// JSON array of feedback records.
    #[arg(long)]
    feedback: Option<String>,

    #[arg(long)]
    entity: String,

    #[arg(long)]
    project: String,

    /// JSON build config; defaults apply to omitted fields.
    #[arg(long)]
    config: Option<String>,

    #[arg(short = 'o', long)]
    out: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid --log-level filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Commands::Summary { input } => {
            let graph = load_graph(&input)?;
            let json = render::render_summary_json(&graph)?;
            emit(&input, json)?;
        }
        Commands::Trace { input, trace_id } => {
            let graph = load_graph(&input)?;
            if graph.trace_calls(&trace_id).is_empty() {
                tracing::warn!(trace_id = %trace_id, "trace has no calls in this batch");
            }
            let json = render::render_trace_json(&graph, &trace_id)?;
            emit(&input, json)?;
        }
    }

    Ok(())
}

fn load_graph(input: &InputArgs) -> Result<ProjectGraph> {
    let config = match &input.config {
        Some(path) => serde_json::from_str::<BuildConfig>(&read(path)?)
            .with_context(|| format!("parse config {}", path))?,
        None => BuildConfig::default(),
    };

    let objects = read_array(&input.objects)?;
    let calls = read_array(&input.calls)?;
    let feedback = match &input.feedback {
        Some(path) => read_array(path)?,
        None => Vec::new(),
    };

    let bootstrap = Bootstrap::from_values(&objects, &calls, &feedback)?;
    let scope = ProjectScope::new(&input.entity, &input.project);
    let graph = ProjectGraph::build_with(&config, scope, bootstrap)
        .with_context(|| format!("build graph for {}/{}", input.entity, input.project))?;
    Ok(graph)
}

fn read(path: &str) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path))
}

fn read_array(path: &str) -> Result<Vec<Value>> {
    serde_json::from_str(&read(path)?).with_context(|| format!("{} must hold a JSON array", path))
}

fn emit(input: &InputArgs, json: String) -> Result<()> {
    match &input.out {
        Some(out) => {
            std::fs::write(out, json).with_context(|| format!("write {}", out))?;
            eprintln!("Wrote {}", out);
        }
        None => println!("{}", json),
    }
    Ok(())
}
