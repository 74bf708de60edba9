//! nlsql CLI - translate natural-language requests into SQL
//!
//! Usage:
//!   nlsql translate <schema.json> <prompt> [--strategy <strategy>] [--compare]
//!   nlsql estimate <prompt>
//!   nlsql entities <schema.json>
//!
//! Examples:
//!   nlsql translate demos/schema.json "show users with email containing gmail"
//!   nlsql translate demos/schema.json "orders over 100 by customer" --strategy ai --show-cost
//!   nlsql translate demos/schema.json "list users where age > 18" --compare
//!   nlsql estimate "list users where age > 18" --config nlsql.toml

use clap::{Parser, Subcommand, ValueEnum};
use nlsql::config::Settings;
use nlsql::orchestrator::{Orchestrator, Strategy};
use nlsql::result::{CostEstimate, TranslationResult};
use nlsql::schema::Schema;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nlsql")]
#[command(about = "nlsql - schema-aware natural language to SQL translation")]
#[command(version)]
struct Cli {
    /// Path to an nlsql.toml (defaults to NLSQL_CONFIG, ./nlsql.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a prompt into SQL
    Translate {
        /// Path to the schema JSON document
        schema: PathBuf,

        /// Natural language request
        prompt: String,

        /// Strategy to use (defaults to the configured one)
        #[arg(short, long)]
        strategy: Option<StrategyArg>,

        /// Run every strategy and show the best result
        #[arg(short, long)]
        compare: bool,

        /// Show the cost estimate and breakdown
        #[arg(long)]
        show_cost: bool,

        /// List the schema's entities before translating
        #[arg(long)]
        show_entities: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate the remote cost of a prompt
    Estimate {
        /// Natural language request
        prompt: String,

        #[arg(short, long)]
        strategy: Option<StrategyArg>,
    },

    /// List the entities of a schema
    Entities {
        /// Path to the schema JSON document
        schema: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Local,
    Ai,
    Hybrid,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Local => Strategy::Local,
            StrategyArg::Ai => Strategy::Ai,
            StrategyArg::Hybrid => Strategy::Hybrid,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            schema,
            prompt,
            strategy,
            compare,
            show_cost,
            show_entities,
            json,
        } => {
            let options = TranslateOptions {
                strategy: strategy.map(Strategy::from),
                compare,
                show_cost,
                show_entities,
                json,
            };
            cmd_translate(cli.config.as_deref(), &schema, &prompt, options)
        }
        Commands::Estimate { prompt, strategy } => {
            cmd_estimate(cli.config.as_deref(), &prompt, strategy.map(Strategy::from))
        }
        Commands::Entities { schema } => cmd_entities(&schema),
    }
}

struct TranslateOptions {
    strategy: Option<Strategy>,
    compare: bool,
    show_cost: bool,
    show_entities: bool,
    json: bool,
}

fn load_settings(path: Option<&Path>) -> Option<Settings> {
    let loaded = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    match loaded {
        Ok(settings) => Some(settings),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            None
        }
    }
}

fn load_orchestrator(path: Option<&Path>) -> Option<Orchestrator> {
    let settings = load_settings(path)?;
    match Orchestrator::from_settings(&settings) {
        Ok(orchestrator) => Some(orchestrator),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            None
        }
    }
}

fn load_schema(file: &Path) -> Option<Schema> {
    let source = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return None;
        }
    };

    match Schema::from_json(&source) {
        Ok(schema) => Some(schema),
        Err(e) => {
            eprintln!("Invalid schema document '{}': {}", file.display(), e);
            None
        }
    }
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => Some(rt),
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            None
        }
    }
}

fn cmd_translate(config: Option<&Path>, file: &Path, prompt: &str, options: TranslateOptions) -> ExitCode {
    let Some(orchestrator) = load_orchestrator(config) else {
        return ExitCode::FAILURE;
    };
    let Some(schema) = load_schema(file) else {
        return ExitCode::FAILURE;
    };
    let Some(rt) = runtime() else {
        return ExitCode::FAILURE;
    };

    if options.show_entities && !options.json {
        print_entities(&schema);
        println!();
    }

    if options.compare {
        let comparison = rt.block_on(orchestrator.compare(prompt, &schema));

        if options.json {
            let results: serde_json::Map<String, serde_json::Value> = comparison
                .results
                .iter()
                .map(|(s, r)| (s.to_string(), r.to_json()))
                .collect();
            let doc = serde_json::json!({
                "best": comparison.best.map(|s| s.to_string()),
                "results": results,
            });
            println!("{}", serde_json::to_string_pretty(&doc).unwrap_or_default());
        } else {
            println!("{:<8} {:<8} {:>10}  {:<24} Cost", "Strategy", "Success", "Confidence", "Provider");
            for (strategy, result) in &comparison.results {
                let cost = result
                    .cost()
                    .map(|c| format!("${:.4}", c.actual))
                    .unwrap_or_else(|| "Free".to_string());
                println!(
                    "{:<8} {:<8} {:>10.2}  {:<24} {}",
                    strategy.as_str(),
                    if result.is_success() { "yes" } else { "no" },
                    result.confidence(),
                    result.provider(),
                    cost
                );
            }
            println!();
        }

        return match comparison.best_result() {
            Some(best) => {
                if !options.json {
                    println!("Best result:");
                    print_result(best, options.show_cost);
                }
                ExitCode::SUCCESS
            }
            None => {
                if !options.json {
                    eprintln!("All strategies failed");
                }
                ExitCode::FAILURE
            }
        };
    }

    if options.show_cost && !options.json && options.strategy != Some(Strategy::Local) {
        if let Some(estimate) = orchestrator.estimate_cost(prompt, options.strategy) {
            print_estimate(&estimate);
            println!();
        }
    }

    let result = rt.block_on(orchestrator.generate(prompt, &schema, options.strategy));

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        print_result(&result, options.show_cost);
    }

    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn cmd_estimate(config: Option<&Path>, prompt: &str, strategy: Option<Strategy>) -> ExitCode {
    let Some(orchestrator) = load_orchestrator(config) else {
        return ExitCode::FAILURE;
    };

    match orchestrator.estimate_cost(prompt, strategy) {
        Some(estimate) => {
            print_estimate(&estimate);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("No AI provider is configured; set [ai] provider in nlsql.toml");
            ExitCode::FAILURE
        }
    }
}

fn cmd_entities(file: &Path) -> ExitCode {
    let Some(schema) = load_schema(file) else {
        return ExitCode::FAILURE;
    };

    println!("File: {}", file.display());
    println!();
    print_entities(&schema);
    ExitCode::SUCCESS
}

fn print_entities(schema: &Schema) {
    println!("Entities ({}):", schema.entities.len());
    for entity in &schema.entities {
        println!(
            "  - {} (table: {}, {} fields, {} relations)",
            entity.name,
            entity.table(),
            entity.fields.len(),
            entity.relations.len()
        );
        let aliases = schema.aliases_for(entity);
        if !aliases.is_empty() {
            println!("      aliases: {}", aliases.join(", "));
        }
    }
}

fn print_estimate(estimate: &CostEstimate) {
    println!("Cost estimate:");
    println!("  Model:          {}", estimate.model);
    println!("  Estimated cost: ${:.4}", estimate.amount);
    println!("  Input tokens:   {}", estimate.estimated_input_tokens);
    println!("  Output tokens:  {}", estimate.estimated_output_tokens);
}

fn print_result(result: &TranslationResult, show_cost: bool) {
    match result {
        TranslationResult::Success(t) => {
            println!("{}", t.sql);
            println!();
            println!("Provider:   {}", t.provider);
            println!("Confidence: {:.2}%", t.confidence * 100.0);
            if !t.entities.is_empty() {
                println!("Entities:   {}", t.entities.join(", "));
            }
            for path in &t.paths {
                println!("Path:       {}", path);
            }
            if !t.explanation.is_empty() {
                println!();
                println!("{}", t.explanation);
            }
            if show_cost {
                if let Some(cost) = &t.cost {
                    println!();
                    println!("Cost:");
                    println!("  Estimated: ${:.4}", cost.estimated);
                    println!("  Actual:    ${:.4}", cost.actual);
                    println!(
                        "  Tokens:    {} in / {} out / {} total",
                        cost.input_tokens, cost.output_tokens, cost.total_tokens
                    );
                }
            }
        }
        TranslationResult::Failure(f) => {
            eprintln!("Generation failed: {} ({})", f.message, f.error);
            eprintln!("Provider: {}", f.provider);
            if !f.suggestions.is_empty() {
                eprintln!("Suggestions:");
                for suggestion in &f.suggestions {
                    eprintln!("  - {}", suggestion);
                }
            }
        }
    }

    for warning in result.warnings() {
        eprintln!("Warning: {}", warning);
    }
}
