//! `airq` - fuzzy air-quality evaluation from the command line.
//!
//! ## Commands
//!
//! - `evaluate`: Score one reading
//! - `batch`: Score and aggregate a file of readings
//! - `classify`: Band and advice for a crisp score
//! - `membership`: Term degrees for one variable value
//! - `rules`: List the rule base
//! - `explain`: Per-rule activations behind a score

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, Level};

use airq_core::{
    assess_history, classify, AggregationPolicy, AirQualityEngine, BatchReport, EngineConfig,
    EvaluationResult, Explanation, InMemoryReadingSource, InputPolicy, PollutantLevels,
    ReadingQuery, RuleBase, SensorReading, Variable,
};

#[derive(Parser)]
#[command(name = "airq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fuzzy multi-criteria air-quality evaluation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit results and log lines as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Resolution of the output scale used for defuzzification
    #[arg(long, global = true, env = "AIRQ_OUTPUT_STEP")]
    output_step: Option<f64>,

    /// Feed out-of-range inputs to the rules unclamped
    #[arg(long, global = true, env = "AIRQ_PERMISSIVE")]
    permissive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single reading (bare pollutant levels or a full sensor reading)
    Evaluate {
        /// Reading JSON file
        file: PathBuf,
    },

    /// Score a JSON array of sensor readings and aggregate them
    Batch {
        /// Readings JSON file
        file: PathBuf,

        /// Aggregation method: average, worst or best
        #[arg(short, long, default_value = "average")]
        method: AggregationPolicy,

        /// Only readings from this sensor
        #[arg(long)]
        sensor: Option<String>,

        /// Only readings from this location
        #[arg(long)]
        location: Option<String>,

        /// Only readings from this region
        #[arg(long)]
        region: Option<String>,

        /// Skip this many matching readings
        #[arg(long, default_value = "0")]
        skip: usize,

        /// Use at most this many matching readings
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the band and recommendation for a score
    Classify {
        score: f64,
    },

    /// Print every term degree for one variable value
    Membership {
        /// Variable key (e.g. pm2_5, ozone) or display name (e.g. PM2.5)
        variable: String,
        value: f64,
    },

    /// List the rule base
    Rules,

    /// Score a reading and show each rule's activation
    Explain {
        /// Reading JSON file
        file: PathBuf,
    },
}

/// Either shape accepted by `evaluate` and `explain`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReadingInput {
    Reading(SensorReading),
    Levels(PollutantLevels),
}

impl ReadingInput {
    fn levels(&self) -> &PollutantLevels {
        match self {
            Self::Reading(reading) => &reading.pollutants,
            Self::Levels(levels) => levels,
        }
    }

    fn label(&self) -> &str {
        match self {
            Self::Reading(reading) => &reading.sensor_id,
            Self::Levels(_) => "reading",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    airq_core::init_tracing(cli.json, level);

    let engine = build_engine(&cli)?;

    match cli.command {
        Commands::Evaluate { file } => cmd_evaluate(&engine, &file, cli.json),
        Commands::Batch {
            file,
            method,
            sensor,
            location,
            region,
            skip,
            limit,
        } => {
            let query = ReadingQuery {
                sensor_id: sensor,
                location,
                region,
                skip,
                limit,
                ..ReadingQuery::default()
            };
            cmd_batch(Arc::new(engine), &file, &query, method, cli.json).await
        }
        Commands::Classify { score } => cmd_classify(score, cli.json),
        Commands::Membership { variable, value } => {
            cmd_membership(&engine, &variable, value, cli.json)
        }
        Commands::Rules => cmd_rules(engine.rule_base(), cli.json),
        Commands::Explain { file } => cmd_explain(&engine, &file, cli.json),
    }
}

fn build_engine(cli: &Cli) -> Result<AirQualityEngine> {
    let mut config = EngineConfig::from_env().context("Invalid engine configuration")?;
    if let Some(step) = cli.output_step {
        config = config.with_output_step(step);
    }
    if cli.permissive {
        config = config.with_input_policy(InputPolicy::Permissive);
    }
    AirQualityEngine::with_config(config).context("Failed to build evaluation engine")
}

fn cmd_evaluate(engine: &AirQualityEngine, file: &PathBuf, json: bool) -> Result<()> {
    let input: ReadingInput = read_json_file(file)?;
    let result = engine
        .evaluate(input.levels())
        .with_context(|| format!("Failed to evaluate {}", input.label()))?;
    info!(score = result.score, band = %result.band, "evaluated {}", input.label());

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_result_text(&result));
    }
    Ok(())
}

async fn cmd_batch(
    engine: Arc<AirQualityEngine>,
    file: &PathBuf,
    query: &ReadingQuery,
    method: AggregationPolicy,
    json: bool,
) -> Result<()> {
    let readings: Vec<SensorReading> = read_json_file(file)?;
    let source = InMemoryReadingSource::new(readings);
    if source.is_empty() {
        return Err(anyhow!("No readings in {:?}", file));
    }
    info!(readings = source.len(), "loaded readings from {:?}", file);
    let report = assess_history(engine, &source, query, method)
        .await
        .with_context(|| format!("Failed to assess readings in {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_batch_text(&report));
    }
    Ok(())
}

fn cmd_classify(score: f64, json: bool) -> Result<()> {
    let band = classify(score);
    if json {
        println!("{}", serde_json::to_string_pretty(&band)?);
    } else {
        println!("{:.2}: {} ({})", score, band.description, band.severity);
        println!("{}", band.recommendation);
    }
    Ok(())
}

fn cmd_membership(engine: &AirQualityEngine, name: &str, value: f64, json: bool) -> Result<()> {
    let variable = Variable::parse(name).ok_or_else(|| anyhow!("Unknown variable: {name}"))?;
    let degrees = engine.membership_model().degrees(variable, value);

    if json {
        let map: serde_json::Map<String, serde_json::Value> = degrees
            .iter()
            .map(|(label, degree)| (label.to_string(), serde_json::json!(degree)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        println!("{} = {}", variable.display_name(), value);
        for (label, degree) in degrees {
            println!("  {:<10} {:.4}", label.to_string(), degree);
        }
    }
    Ok(())
}

fn cmd_rules(rules: &RuleBase, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rules.rules())?);
    } else {
        print!("{}", render_rules_text(rules));
    }
    Ok(())
}

fn cmd_explain(engine: &AirQualityEngine, file: &PathBuf, json: bool) -> Result<()> {
    let input: ReadingInput = read_json_file(file)?;
    let explanation = engine
        .explain(input.levels())
        .with_context(|| format!("Failed to evaluate {}", input.label()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
    } else {
        print!("{}", render_explanation_text(engine.rule_base(), &explanation));
    }
    Ok(())
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

fn render_result_text(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Score:          {:.2}", result.score);
    let _ = writeln!(out, "Band:           {} ({})", result.description, result.band);
    let _ = writeln!(out, "Recommendation: {}", result.recommendation);
    out
}

fn render_batch_text(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} readings, aggregated by {}",
        report.total_readings, report.aggregation_method
    );
    out.push_str(&render_result_text(&report.summary));
    out.push('\n');
    for scored in &report.detailed_results {
        let _ = writeln!(
            out,
            "  {}  {:<16} {:<20} {:>5.2}  {}",
            scored.timestamp.format("%Y-%m-%d %H:%M"),
            scored.sensor_id,
            scored.location,
            scored.result.score,
            scored.result.band
        );
    }
    out
}

fn render_rules_text(rules: &RuleBase) -> String {
    let mut out = String::new();
    for rule in rules.rules() {
        let _ = writeln!(
            out,
            "{:<3} IF {} THEN {}  # {}",
            rule.id, rule.antecedent, rule.consequent, rule.description
        );
    }
    out
}

fn render_explanation_text(rules: &RuleBase, explanation: &Explanation) -> String {
    let mut out = render_result_text(&explanation.result);
    out.push_str("\nRule activations:\n");
    for activation in &explanation.activations {
        let description = rules
            .rules()
            .iter()
            .find(|r| r.id == activation.rule_id)
            .map(|r| r.description.as_str())
            .unwrap_or("");
        let _ = writeln!(
            out,
            "  {:<3} {:.4} -> {:<10} {}",
            activation.rule_id,
            activation.strength,
            activation.consequent.to_string(),
            description
        );
    }
    match explanation.dominant {
        Some(severity) => {
            let _ = writeln!(out, "\nDominant category: {severity}");
        }
        None => out.push_str("\nDominant category: none (no rule fired)\n"),
    }
    out.push_str("\nCategory strengths:\n");
    for (severity, strength) in explanation.result.category_strengths.iter() {
        let _ = writeln!(out, "  {:<10} {:.4}", severity.to_string(), strength);
    }
    out
}
