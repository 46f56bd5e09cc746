//! Incident Triage CLI
//!
//! Inspects a taxonomy, scores risk pairs and hydrates stored incident records.
//! The taxonomy comes from a JSON file (`--taxonomy`) or, when omitted, from the
//! backend named in the YAML configuration.
//!
//! Usage:
//!   cargo run --features cli --bin incident_triage -- tree --taxonomy taxonomy.json
//!   cargo run --features cli --bin incident_triage -- classify --severity 4 --probability 5
//!   cargo run --features cli --bin incident_triage -- hydrate --record incident.json

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use incident_triage::config::{LoggingConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use incident_triage::incident_types::{IncidentRecord, Tag, TagId, Tree};
use incident_triage::{
    HttpTaxonomySource, IncidentEditSession, RiskChoice, RiskClassifier, RiskInputs,
    StaticTaxonomySource, TaxonomyIndex, TaxonomySource, TaxonomyStore, TriageConfig,
};

#[derive(Parser, Debug)]
#[command(name = "incident_triage")]
#[command(about = "Incident classification and risk resolution")]
struct Args {
    /// Taxonomy JSON file; the configured backend is used when omitted
    #[arg(long, short = 't', global = true)]
    taxonomy: Option<PathBuf>,

    /// Configuration file
    #[arg(long, short = 'c', global = true, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print both category trees and the risk vocabularies
    Tree,

    /// Score a severity/probability pair
    Classify {
        /// Severity vocabulary id, or a bare 1-5 ordinal when there is no vocabulary
        #[arg(long, short = 's')]
        severity: i64,

        /// Probability vocabulary id, or a bare 1-5 ordinal when there is no vocabulary
        #[arg(long, short = 'p')]
        probability: i64,
    },

    /// Rebuild selection state from a stored incident record
    Hydrate {
        /// Incident record JSON file
        #[arg(long, short = 'r')]
        record: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = if args.taxonomy.is_none() {
        let path = args.config.display().to_string();
        Some(
            TriageConfig::from_file(&path)
                .with_context(|| format!("Failed to load configuration from {}", path))?,
        )
    } else {
        None
    };

    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let source: Arc<dyn TaxonomySource> = match (&args.taxonomy, &config) {
        (Some(path), _) => {
            let path = path.display().to_string();
            Arc::new(
                StaticTaxonomySource::from_file(&path)
                    .with_context(|| format!("Failed to read taxonomy from {}", path))?,
            )
        }
        (None, Some(config)) => Arc::new(
            HttpTaxonomySource::new(&config.taxonomy)
                .context("Failed to create taxonomy HTTP client")?,
        ),
        (None, None) => anyhow::bail!("No taxonomy source configured"),
    };

    let store = TaxonomyStore::from_source(source);
    let index = store.get().await;
    if index.is_empty() {
        tracing::warn!("Taxonomy is empty; every lookup will come back empty");
    }

    match args.command {
        Command::Tree => print_tree(&index),
        Command::Classify {
            severity,
            probability,
        } => {
            let inputs = RiskInputs {
                severity: Some(choice(severity, &index.severities())),
                probability: Some(choice(probability, &index.probabilities())),
            };
            let assessment = RiskClassifier::new(index.clone()).assess(&inputs);
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
        Command::Hydrate { record } => {
            let path = record.display().to_string();
            let content = std::fs::read_to_string(&record)
                .with_context(|| format!("Failed to read record from {}", path))?;
            let record: IncidentRecord = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse record in {}", path))?;

            let session = IncidentEditSession::open(index.clone(), &record);
            let output = serde_json::json!({
                "session": session.snapshot(),
                "report": session.hydration_report(),
                "update": session.to_update(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let default_filter = logging.filter.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Vocabulary id when a vocabulary exists, otherwise a raw ordinal
fn choice(value: i64, vocabulary: &[&Tag]) -> RiskChoice {
    match u8::try_from(value) {
        Ok(n) if vocabulary.is_empty() => RiskChoice::Ordinal(n),
        _ => RiskChoice::Tag(TagId(value)),
    }
}

fn print_tree(index: &TaxonomyIndex) {
    for tree in Tree::ALL {
        println!("{} categories:", tree);
        for root in index.roots(tree) {
            print_branch(index, root, 1);
        }
    }

    for (label, vocabulary) in [
        ("Incident levels", index.incident_levels()),
        ("Severities", index.severities()),
        ("Probabilities", index.probabilities()),
    ] {
        println!("{}:", label);
        for tag in vocabulary {
            println!("  [{}] {}", tag.id, tag.name);
        }
    }

    println!("Buildings: {}", index.buildings().len());
    for issue in index.structural_issues() {
        println!("warning: {:?}", issue);
    }
}

fn print_branch(index: &TaxonomyIndex, tag: &Tag, depth: usize) {
    println!("{}[{}] {}", "  ".repeat(depth), tag.id, tag.name);
    let Some(slot) = tag.kind.category_slot() else {
        return;
    };
    let Some(child_slot) = slot.child() else {
        return;
    };
    for child in index.children_of(child_slot.kind(), Some(tag.id)) {
        print_branch(index, child, depth + 1);
    }
}
