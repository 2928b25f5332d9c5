//! fuzzy-advisor CLI: fuzzy recommendation scoring.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};

use fuzzy_advisor::infer::{Defuzzifier, InferenceResult, Inputs};
use fuzzy_advisor::manifest::SystemManifest;
use fuzzy_advisor::presets;
use fuzzy_advisor::stats::RuleStatistics;
use fuzzy_advisor::system::FuzzySystem;

#[derive(Parser)]
#[command(name = "fuzzy-advisor", version, about = "Fuzzy inference for recommendation scoring")]
struct Cli {
    /// System manifest (TOML). Defaults to the bundled movie recommender.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Defuzzification method: centroid, bisector, mom, som, lom.
    #[arg(long, global = true)]
    method: Option<Defuzzifier>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one item.
    Infer {
        /// Crisp input as name=value; repeat for every input variable.
        #[arg(long = "input", short, value_parser = parse_input, required = true)]
        inputs: Vec<(String, f64)>,

        /// Rules to explain per output term.
        #[arg(long, default_value = "3")]
        explain: usize,
    },

    /// Score every item of a JSON file and rank them.
    Batch {
        /// JSON array of objects mapping input names to numbers, with an
        /// optional "name" label.
        #[arg(long)]
        file: PathBuf,

        /// Drop items scoring below this value.
        #[arg(long, default_value = "0")]
        min_score: f64,

        /// Show at most this many items.
        #[arg(long)]
        top: Option<usize>,
    },

    /// List the rules of the system.
    Rules,

    /// Show the variables, terms and settings of the system.
    Info,

    /// Audit the rule base for coverage gaps and conflicts.
    Check,
}

fn parse_input(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got \"{s}\""))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid number for \"{name}\": {e}"))?;
    Ok((name.trim().to_string(), value))
}

/// One entry of a batch file.
#[derive(Deserialize)]
struct BatchEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(flatten)]
    inputs: Inputs,
}

#[derive(Serialize)]
struct RankedItem<'a> {
    rank: usize,
    name: String,
    result: &'a InferenceResult,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let system = load_system(&cli)?;

    match cli.command {
        Commands::Infer { inputs, explain } => {
            let inputs: Inputs = inputs.into_iter().collect();
            let result = system.infer(&inputs)?;
            if cli.json {
                let json = serde_json::to_string_pretty(&result).into_diagnostic()?;
                println!("{json}");
            } else {
                print_result(&system, &result, explain);
            }
        }

        Commands::Batch {
            file,
            min_score,
            top,
        } => {
            let content = std::fs::read_to_string(&file).into_diagnostic()?;
            let entries: Vec<BatchEntry> = serde_json::from_str(&content).into_diagnostic()?;
            let batch: Vec<Inputs> = entries.iter().map(|e| e.inputs.clone()).collect();

            let mut scored = Vec::with_capacity(entries.len());
            for (i, (entry, result)) in entries.iter().zip(system.infer_batch(&batch)).enumerate() {
                let name = entry.name.clone().unwrap_or_else(|| format!("#{}", i + 1));
                scored.push((name, result?));
            }

            let mut stats = RuleStatistics::new();
            stats.extend(scored.iter().map(|(_, r)| r));

            scored.retain(|(_, r)| r.score >= min_score);
            scored.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
            scored.truncate(top.unwrap_or(usize::MAX));

            if cli.json {
                let ranked: Vec<RankedItem> = scored
                    .iter()
                    .enumerate()
                    .map(|(i, (name, result))| RankedItem {
                        rank: i + 1,
                        name: name.clone(),
                        result,
                    })
                    .collect();
                let json = serde_json::to_string_pretty(&ranked).into_diagnostic()?;
                println!("{json}");
            } else {
                println!("{} item(s) scored, {} shown", batch.len(), scored.len());
                for (i, (name, result)) in scored.iter().enumerate() {
                    println!(
                        "{:>3}. {:<30} {:>6.1}  {}",
                        i + 1,
                        name,
                        result.score,
                        result.dominant_term.as_deref().unwrap_or("-")
                    );
                }
                println!(
                    "Fallbacks: {}/{}",
                    stats.fallbacks(),
                    stats.inferences()
                );
                for (rule_id, activity) in stats.most_active(5) {
                    println!(
                        "  rule {rule_id}: fired {} time(s), mean strength {:.3}",
                        activity.activations,
                        activity.mean_strength()
                    );
                }
            }
        }

        Commands::Rules => {
            if cli.json {
                let rules: Vec<serde_json::Value> = system
                    .rules()
                    .rules()
                    .iter()
                    .map(|r| {
                        serde_json::json!({
                            "id": r.id,
                            "rule": r.to_string(),
                            "confidence": r.confidence,
                            "description": r.description,
                        })
                    })
                    .collect();
                let json = serde_json::to_string_pretty(&rules).into_diagnostic()?;
                println!("{json}");
            } else {
                for rule in system.rules().rules() {
                    println!("{rule}  [confidence {:.1}]", rule.confidence);
                    if !rule.description.is_empty() {
                        println!("    {}", rule.description);
                    }
                }
            }
        }

        Commands::Info => {
            let summary = system.summary();
            if cli.json {
                let json = serde_json::to_string_pretty(&summary).into_diagnostic()?;
                println!("{json}");
            } else {
                println!("{summary}");
            }
        }

        Commands::Check => {
            let audit = system.audit();
            if cli.json {
                let json = serde_json::to_string_pretty(&serde_json::json!({
                    "uncovered_terms": audit.uncovered_terms,
                    "conflicts": audit.conflicts,
                }))
                .into_diagnostic()?;
                println!("{json}");
            } else if audit.is_clean() {
                println!(
                    "{}: {} rules, every output term covered, no conflicts",
                    system.name(),
                    system.rules().len()
                );
            } else {
                for term in &audit.uncovered_terms {
                    println!("uncovered output term: {term}");
                }
                for (first, second) in &audit.conflicts {
                    println!("conflict: rules {first} and {second} share antecedents");
                }
            }
        }
    }

    Ok(())
}

fn load_system(cli: &Cli) -> Result<FuzzySystem> {
    let system = match &cli.config {
        Some(path) => SystemManifest::load(path)?.build()?,
        None => presets::movie_recommender()?,
    };
    Ok(match cli.method {
        Some(method) => system.with_defuzzifier(method),
        None => system,
    })
}

fn print_result(system: &FuzzySystem, result: &InferenceResult, top_n: usize) {
    println!(
        "Score: {:.1} ({})",
        result.score,
        result.dominant_term.as_deref().unwrap_or("no dominant term")
    );
    println!("Confidence: {:.2}", result.confidence);
    println!("Defuzzifier: {}", result.defuzzifier);
    println!("{}", result.explanation);

    println!("Memberships:");
    for (variable, terms) in &result.membership_degrees {
        let degrees: Vec<String> = terms
            .iter()
            .filter(|(_, d)| **d > 0.0)
            .map(|(t, d)| format!("{t} {d:.2}"))
            .collect();
        println!("  {variable}: {}", degrees.join(", "));
    }

    if result.fallback {
        return;
    }
    let grouped = system.explain(result, top_n);
    println!("Fired rules:");
    let output_terms = system
        .registry()
        .output()
        .map(|v| v.terms.iter().map(|t| t.name.as_str()).collect::<Vec<_>>())
        .unwrap_or_default();
    for term in output_terms.into_iter().rev() {
        let Some(explanations) = grouped.get(term) else {
            continue;
        };
        println!("  {term}:");
        for e in explanations {
            println!("    {} (strength {:.3})", e.rule_text, e.strength);
            if !e.description.is_empty() {
                println!("      {}", e.description);
            }
        }
    }
}
