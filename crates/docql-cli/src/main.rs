#![allow(clippy::doc_markdown)]
//! `DocQL` CLI - compiles JSON filters and vector searches into storage queries
//!
//! Usage:
//!   `docql compile --collection articles '{"tags": {"$contains": "web"}}'`
//!   `docql vector --collection articles '{"vector": [0.1, 0.2, 0.3], "limit": 5}'`
//!   `docql rewrite "SELECT * FROM ks.t ORDER BY v ANN OF ? LIMIT 5" --vector 0.1,0.2`

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use docql_core::cql::{CqlValue, Query};
use docql_core::filter::FilterParser;
use docql_core::search::{
    DocumentSearchPlanner, SearchPlan, Statement, VectorLayout, VectorQueryRewriter,
    VectorSearchRequest, VectorSearchService,
};
use docql_core::DocqlConfig;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docql")]
#[command(
    author,
    version,
    about = "DocQL CLI - JSON document filter and vector search compiler"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./docql.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// CLI output option
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON filter into per-expression query plans
    Compile {
        /// Keyspace (defaults to table.keyspace)
        #[arg(long)]
        keyspace: Option<String>,

        /// Collection table
        #[arg(long)]
        collection: String,

        /// Filter, e.g. '{"tags": {"$contains": "web"}}'
        filter: String,
    },

    /// Validate a vector search request and print its ANN query
    Vector {
        /// Keyspace (defaults to table.keyspace)
        #[arg(long)]
        keyspace: Option<String>,

        /// Collection table
        #[arg(long)]
        collection: String,

        /// Request, e.g. '{"vector": [0.1, 0.2], "limit": 5}'
        request: String,
    },

    /// Show how a statement with a bound ANN vector is rewritten
    Rewrite {
        /// Query text with `?` markers
        query: String,

        /// Vector bound to the ANN marker, comma-separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        vector: Vec<f32>,

        /// Byte layout the vector is serialized in (flat, prefixed, collection)
        #[arg(long, default_value = "flat")]
        layout: VectorLayout,

        /// Text values for the other markers, in order
        #[arg(long = "param")]
        params: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config);

    match cli.command {
        Commands::Compile {
            keyspace,
            collection,
            filter,
        } => {
            let keyspace = keyspace.unwrap_or_else(|| config.table.keyspace.clone());
            compile(&config, &keyspace, &collection, &filter, cli.format)?;
        }
        Commands::Vector {
            keyspace,
            collection,
            request,
        } => {
            let keyspace = keyspace.unwrap_or_else(|| config.table.keyspace.clone());
            vector(&config, &keyspace, &collection, &request, cli.format)?;
        }
        Commands::Rewrite {
            query,
            vector,
            layout,
            params,
        } => {
            rewrite(&query, &vector, layout, &params, cli.format)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DocqlConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Configuration file not found: {}", path.display());
            }
            DocqlConfig::load_from_path(path)
        }
        None => DocqlConfig::load(),
    }
    .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_tracing(config: &DocqlConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn literals(values: &[CqlValue]) -> Vec<String> {
    values.iter().map(CqlValue::to_literal).collect()
}

fn query_json(query: &Query) -> Value {
    json!({
        "cql": query.cql,
        "values": literals(&query.values),
        "consistency": query.consistency.as_str(),
    })
}

fn print_query(label: &str, query: &Query) {
    println!("  {label}{}", query.cql);
    println!("  values: [{}]", literals(&query.values).join(", "));
    println!("  consistency: {}", query.consistency);
}

fn compile(
    config: &DocqlConfig,
    keyspace: &str,
    collection: &str,
    filter: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let props = config.table_properties();
    let expressions = FilterParser::new(&props).parse_str(filter)?;
    let planner =
        DocumentSearchPlanner::new(&props, keyspace, collection, config.queries.read_consistency);

    let mut plans = Vec::with_capacity(expressions.len());
    for expression in &expressions {
        plans.push((expression, planner.plan(expression)?));
    }

    if format == OutputFormat::Json {
        let out: Vec<Value> = plans
            .iter()
            .map(|(expression, plan)| {
                let kind = if plan.is_push_down() {
                    "push_down"
                } else {
                    "in_memory"
                };
                json!({
                    "path": expression.path().to_string(),
                    "operator": expression.condition().op_code().operator(),
                    "plan": kind,
                    "query": query_json(plan.query()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for (expression, plan) in &plans {
        let op = expression.condition().op_code();
        match plan {
            SearchPlan::PushDown { query } => {
                println!("[{}] {} {op}: push-down", expression.order_index(), expression.path());
                print_query("", query);
            }
            SearchPlan::InMemory {
                candidate_query, ..
            } => {
                println!("[{}] {} {op}: in-memory", expression.order_index(), expression.path());
                print_query("candidates: ", candidate_query);
            }
        }
    }
    Ok(())
}

fn vector(
    config: &DocqlConfig,
    keyspace: &str,
    collection: &str,
    request: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let request: VectorSearchRequest =
        serde_json::from_str(request).context("Invalid vector search request")?;
    let plan = VectorSearchService::new(config).plan(keyspace, collection, &request)?;
    let inline = VectorQueryRewriter::process(Statement::from_query(&plan.query));

    if format == OutputFormat::Json {
        let out = json!({
            "query": query_json(&plan.query),
            "limit": plan.limit,
            "filter_expressions": plan.filter.len(),
            "inline": inline.query,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("ANN query (limit {}):", plan.limit);
    print_query("", &plan.query);
    if !plan.filter.is_empty() {
        println!(
            "  pre-filter: {} expression(s) resolved to a key IN ? restriction",
            plan.filter.len()
        );
    }
    println!("  inline: {}", inline.query);
    Ok(())
}

fn rewrite(
    query: &str,
    vector: &[f32],
    layout: VectorLayout,
    params: &[String],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ann = VectorQueryRewriter::parameter_indices(query);
    let markers = query.matches('?').count();
    let mut params = params.iter();
    let mut values = Vec::with_capacity(markers);
    for index in 0..markers {
        if ann.contains(&index) {
            values.push(layout.encode(vector));
        } else {
            let Some(param) = params.next() else {
                bail!("No --param given for marker {index}");
            };
            values.push(CqlValue::from(param.as_str()).encode());
        }
    }

    let before = values.len();
    let statement = VectorQueryRewriter::process(Statement::new(query, values));
    let rewritten = statement.values.len() != before;

    if format == OutputFormat::Json {
        let out = json!({
            "query": statement.query,
            "rewritten": rewritten,
            "remaining_values": statement.values.len(),
            "layout": layout.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", statement.query);
        println!("remaining values: {}", statement.values.len());
    }
    Ok(())
}
