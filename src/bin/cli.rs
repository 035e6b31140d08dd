//! Development/demo CLI for the prediction dispatcher. Not the engine's
//! production HTTP surface — a thin entry point wiring a static repository,
//! the inference HTTP client, and engine config through the pipeline
//! orchestrator.

use admission_dispatcher::prelude::*;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "admission-dispatcher", about = "University-admission prediction dispatcher CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the L1 (priority-based) pipeline for a student.
    PredictL1 {
        student_id: String,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Run the L2 (exam-based) pipeline for a student.
    PredictL2 {
        student_id: String,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Run the L3 (transcript-based) pipeline for a student.
    PredictL3 {
        student_id: String,
        #[arg(long)]
        user_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load()?;
    let http = PredictionHttpClient::new(config.inference_base_url.clone(), config.request_timeout())?;
    let repository = StaticRepository::new();
    let orchestrator = PipelineOrchestrator::new(repository, http, config);

    match cli.command {
        Command::PredictL1 { student_id, user_id } => {
            let results = orchestrator.run_l1(&student_id, user_id.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::PredictL2 { student_id, user_id } => {
            let results = orchestrator.run_l2(&student_id, user_id.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::PredictL3 { student_id, user_id } => {
            let results = orchestrator.run_l3(&student_id, user_id.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
