//! CLI commands: run debates and dialectic loops from the terminal,
//! and score saved traces.
//!
//! Events are printed to stdout in SSE wire framing, so the output of a
//! run is exactly what a streaming transport would deliver.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use crate::config::{ProviderKind, ProviderSettings, RunConfig, RunPreset};
use crate::evaluation::{compare_traces, evaluate_trace};
use crate::llm::{build_client, LlmClient};
use crate::memory::graph::ArgumentGraph;
use crate::orchestrator::{DebateOrchestrator, DialecticOrchestrator};
use crate::storage::{DebateRecord, JsonlSink, RecordSink, SessionRecord, UtteranceRecord};
use crate::utils::sse::sse_event;

/// Multi-agent debate engine.
#[derive(Debug, Parser)]
#[command(name = "debate-forge", version, about = "Orchestrate, score and map structured LLM debates")]
pub struct Cli {
    /// Log level when RUST_LOG is not set.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a pro/con debate and stream its events to stdout.
    Debate {
        /// Debate topic (1-500 characters).
        #[arg(long)]
        topic: String,
        /// Number of rounds (1-10); presets may cap it lower.
        #[arg(long, default_value_t = 3)]
        rounds: u32,
        /// Provider: deepseek, openai, gemini, claude or mock.
        #[arg(long, default_value = "mock")]
        provider: String,
        /// Model identifier for the provider.
        #[arg(long, default_value = "mock")]
        model: String,
        /// Sampling temperature override.
        #[arg(long)]
        temperature: Option<f64>,
        /// Reproducibility seed (honoured by the mock provider).
        #[arg(long)]
        seed: Option<u64>,
        /// Named preset: basic, quality or budget.
        #[arg(long)]
        preset: Option<String>,
        /// Stream argument chunks instead of whole utterances.
        #[arg(long)]
        streaming: bool,
        /// Append session, utterance and debate records to this JSONL file.
        #[arg(long)]
        record: Option<PathBuf>,
        /// Distinct provider for the pro side.
        #[arg(long)]
        pro_provider: Option<String>,
        /// Distinct model for the pro side.
        #[arg(long)]
        pro_model: Option<String>,
        /// Distinct provider for the con side.
        #[arg(long)]
        con_provider: Option<String>,
        /// Distinct model for the con side.
        #[arg(long)]
        con_model: Option<String>,
    },
    /// Run a thesis/antithesis/synthesis loop and stream its events.
    Dialectic {
        #[arg(long)]
        topic: String,
        /// Number of rounds; clamped to 5-10.
        #[arg(long, default_value_t = 5)]
        rounds: u32,
        #[arg(long, default_value = "mock")]
        provider: String,
        #[arg(long, default_value = "mock")]
        model: String,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Score a saved debate trace.
    Evaluate {
        /// Path to a trace JSON file.
        #[arg(long)]
        trace: PathBuf,
    },
    /// Compare two saved debate traces.
    Compare {
        #[arg(long)]
        left: PathBuf,
        #[arg(long)]
        right: PathBuf,
    },
}

/// Parses the command line.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses the command line and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs an already-parsed command line.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Debate {
            topic,
            rounds,
            provider,
            model,
            temperature,
            seed,
            preset,
            streaming,
            record,
            pro_provider,
            pro_model,
            con_provider,
            con_model,
        } => {
            run_debate(DebateRun {
                topic,
                rounds,
                provider,
                model,
                temperature,
                seed,
                preset,
                streaming,
                record,
                pro_provider,
                pro_model,
                con_provider,
                con_model,
            })
            .await
        }
        Commands::Dialectic {
            topic,
            rounds,
            provider,
            model,
            temperature,
            seed,
        } => run_dialectic(&topic, rounds, &provider, &model, temperature, seed).await,
        Commands::Evaluate { trace } => {
            let trace = read_json(&trace)?;
            let result = evaluate_trace(&trace);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Compare { left, right } => {
            let left = read_json(&left)?;
            let right = read_json(&right)?;
            let result = compare_traces(&left, &right);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

fn read_json(path: &std::path::Path) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading trace file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Parameters of one debate run.
struct DebateRun {
    topic: String,
    rounds: u32,
    provider: String,
    model: String,
    temperature: Option<f64>,
    seed: Option<u64>,
    preset: Option<String>,
    streaming: bool,
    record: Option<PathBuf>,
    pro_provider: Option<String>,
    pro_model: Option<String>,
    con_provider: Option<String>,
    con_model: Option<String>,
}

/// Resolves a per-side client, falling back to the session default.
fn side_client(
    provider_override: Option<&str>,
    model_override: Option<&str>,
    default_provider: ProviderKind,
    default_model: &str,
    default_client: &Arc<dyn LlmClient>,
    seed: Option<u64>,
) -> anyhow::Result<Arc<dyn LlmClient>> {
    if provider_override.is_none() && model_override.is_none() {
        return Ok(Arc::clone(default_client));
    }
    let provider = match provider_override {
        Some(name) => ProviderKind::parse(name)?,
        None => default_provider,
    };
    let model = model_override.unwrap_or(default_model);
    let settings = ProviderSettings::from_env(provider)?;
    Ok(build_client(&settings, model, seed)?)
}

async fn run_debate(run: DebateRun) -> anyhow::Result<()> {
    let provider = ProviderKind::parse(&run.provider)?;
    let preset = run.preset.as_deref().map(RunPreset::parse).transpose()?;
    let settings = ProviderSettings::from_env(provider)?;
    let config = RunConfig::resolve(
        provider,
        &run.model,
        run.rounds,
        run.temperature,
        run.seed,
        preset,
    );
    let client = build_client(&settings, &run.model, config.seed)?;

    let pro_client = side_client(
        run.pro_provider.as_deref(),
        run.pro_model.as_deref(),
        provider,
        &run.model,
        &client,
        config.seed,
    )?;
    let con_client = side_client(
        run.con_provider.as_deref(),
        run.con_model.as_deref(),
        provider,
        &run.model,
        &client,
        config.seed,
    )?;

    let topic = run.topic.as_str();
    let streaming = run.streaming;
    let record = run.record;

    let mut orchestrator = DebateOrchestrator::new();
    orchestrator.setup_debate_split(topic, config.clone(), pro_client, con_client, client)?;

    let (tx, rx) = mpsc::channel(256);
    let printer = tokio::spawn(async move {
        let mut events = ReceiverStream::new(rx);
        while let Some(event) = events.next().await {
            print!("{}", sse_event(&event));
        }
    });

    let result = if streaming {
        orchestrator.run_streaming(tx).await
    } else {
        orchestrator.run(tx).await
    };
    printer.await.ok();
    result.map_err(|e| anyhow::anyhow!(e))?;

    if let Some(path) = record {
        persist_debate(&orchestrator, topic, &config, &path).await?;
        tracing::info!(path = %path.display(), "debate record written");
    }

    Ok(())
}

/// Writes the session, its utterances and the completed debate record.
async fn persist_debate(
    orchestrator: &DebateOrchestrator,
    topic: &str,
    config: &RunConfig,
    path: &std::path::Path,
) -> anyhow::Result<()> {
    let Some(memory) = orchestrator.memory() else {
        return Ok(());
    };
    let sink = JsonlSink::new(path);
    let config_value = serde_json::to_value(config)?;

    let session = SessionRecord::new("debate", topic, config_value.clone());
    sink.write_session(&session).await?;

    for argument in memory.arguments() {
        sink.write_utterance(&UtteranceRecord {
            session_id: session.id.clone(),
            role: argument.agent_name.clone(),
            content: argument.content.clone(),
            metadata: serde_json::json!({
                "round": argument.round,
                "side": argument.side.as_str(),
            }),
            timestamp: argument.timestamp,
        })
        .await?;
    }

    let graph = ArgumentGraph::from_transcript(topic, &memory.get_debate_history());
    let standings = memory.get_current_standings();
    let verdict = memory.verdict();
    sink.write_debate_record(&DebateRecord {
        session_id: session.id,
        topic: topic.to_string(),
        pro_total: standings.pro_total_score,
        con_total: standings.con_total_score,
        winner: verdict.map(|v| v.winner.as_str().to_string()).unwrap_or_default(),
        margin: verdict
            .map(|v| serde_json::to_value(v.margin).ok())
            .flatten()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
        trace: orchestrator.build_trace(),
        graph: graph.to_json(),
        verdict: serde_json::to_value(verdict)?,
        evaluations: serde_json::to_value(memory.evaluations())?,
        config: config_value,
        created_at: chrono::Utc::now(),
    })
    .await?;

    Ok(())
}

async fn run_dialectic(
    topic: &str,
    rounds: u32,
    provider: &str,
    model: &str,
    temperature: Option<f64>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let provider = ProviderKind::parse(provider)?;
    let settings = ProviderSettings::from_env(provider)?;
    let config = RunConfig::resolve(provider, model, rounds, temperature, seed, None);
    let client = build_client(&settings, model, config.seed)?;

    let mut orchestrator = DialecticOrchestrator::new();
    orchestrator.setup(topic, config, client)?;

    let (tx, rx) = mpsc::channel(256);
    let printer = tokio::spawn(async move {
        let mut events = ReceiverStream::new(rx);
        while let Some(event) = events.next().await {
            print!("{}", sse_event(&event));
        }
    });

    let result = orchestrator.run(tx).await;
    printer.await.ok();
    result.map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_debate_command() {
        let cli = Cli::try_parse_from([
            "debate-forge",
            "debate",
            "--topic",
            "AI and work",
            "--rounds",
            "2",
            "--seed",
            "123",
            "--streaming",
        ])
        .unwrap();

        match cli.command {
            Commands::Debate {
                topic,
                rounds,
                provider,
                seed,
                streaming,
                ..
            } => {
                assert_eq!(topic, "AI and work");
                assert_eq!(rounds, 2);
                assert_eq!(provider, "mock");
                assert_eq!(seed, Some(123));
                assert!(streaming);
            }
            _ => panic!("expected debate command"),
        }
    }

    #[test]
    fn test_cli_parses_compare_command() {
        let cli = Cli::try_parse_from([
            "debate-forge",
            "compare",
            "--left",
            "a.json",
            "--right",
            "b.json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Compare { .. }));
    }
}
