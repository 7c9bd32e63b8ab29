use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::Arc;

mod catalog;
mod config;
mod form;
mod machines;
mod persist;
mod runtime;
mod submit;
mod telemetry;

use catalog::StaticReasonCatalog;
use form::FormState;
use machines::{FormCommand, FormSeed, Orchestrator, OrchestratorState, ReferralCommand};
use persist::{document, FilePersistence, PersistError, Persistence};
use runtime::{ActorId, FieldEvent};
use submit::{ScriptedTransport, SimulatedTransport, SubmissionTransport};

#[derive(Parser)]
#[command(name = "careform")]
#[command(about = "Clinical documentation workflow driven by a tree of FSM actors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a scripted documentation session: fill the newest session tab,
    /// answer the screening survey, file a referral, then submit and save.
    Run {
        /// Override the configured state file path
        #[arg(long)]
        state_file: Option<String>,
        /// Force the first submission attempt to fail to exercise the retry path
        #[arg(long)]
        fail_first: bool,
    },
    /// Print the saved form document, if any
    Show {
        /// Override the configured state file path
        #[arg(long)]
        state_file: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config()?;
    let cfg = config::config()?;
    telemetry::init_telemetry(&cfg.observability.log_level)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            state_file,
            fail_first,
        } => run(state_file, fail_first).await,
        Commands::Show { state_file } => show(state_file).await,
    }
}

fn state_file_path(overridden: Option<String>) -> String {
    overridden.unwrap_or_else(|| {
        config::config()
            .map(|cfg| cfg.persistence.state_file_path.clone())
            .unwrap_or_default()
    })
}

async fn run(state_file: Option<String>, fail_first: bool) -> Result<()> {
    let cfg = config::config()?;
    let store = FilePersistence::new(state_file_path(state_file));

    let document = match store.load("latest").await {
        Ok(document) => Some(document),
        Err(PersistError::Missing { .. }) => None,
        Err(err) => return Err(err.into()),
    };
    let form = document
        .as_ref()
        .and_then(|doc| doc.get("form_state"))
        .and_then(|value| serde_json::from_value::<FormState>(value.clone()).ok())
        .unwrap_or_default();

    let transport: Arc<dyn SubmissionTransport> = if fail_first {
        Arc::new(ScriptedTransport::new([false], true))
    } else {
        Arc::new(SimulatedTransport::new(
            cfg.submission.success_rate,
            std::time::Duration::from_millis(cfg.submission.latency_ms),
        ))
    };
    let catalog = Arc::new(StaticReasonCatalog::new(
        cfg.submission.callback_reason.clone(),
    ));

    let mut orchestrator = Orchestrator::new(FormSeed { form, document }, catalog, transport);
    let session = orchestrator.editable_session();
    println!(
        "Documenting session {} (editable tab: {session})",
        orchestrator.form_state().session_count
    );

    // Fill the newest session tab; requesting the survey spawns the GAD-7 actor.
    for (key, value) in [
        ("date", json!("2026-08-23")),
        ("appointment_duration", json!(50)),
        ("reason_or_stressors", json!("Work-related stress, poor sleep")),
        ("techniques_used", json!("Cognitive restructuring")),
        ("update_gad", json!(true)),
    ] {
        orchestrator
            .handle(FormCommand::Field {
                target: session.clone(),
                event: FieldEvent::update(key, value),
            })
            .await;
    }

    orchestrator
        .handle(FormCommand::Field {
            target: ActorId::survey(),
            event: FieldEvent::update(
                "survey",
                json!({ "1": 2, "2": 1, "3": 2, "4": 1, "5": 0, "6": 1, "7": 1 }),
            ),
        })
        .await;
    if let Some(survey) = orchestrator.form_state().survey() {
        println!("GAD-7 score {} ({})", survey.score, survey.severity);
    }

    // File a FlexCare referral with a callback date.
    orchestrator
        .handle(FormCommand::Referral(ReferralCommand::Add))
        .await;
    orchestrator
        .handle(FormCommand::Referral(ReferralCommand::Field {
            index: 0,
            event: FieldEvent::update("primary_reason", json!("FlexCare")),
        }))
        .await;
    orchestrator
        .handle(FormCommand::Referral(ReferralCommand::Field {
            index: 0,
            event: FieldEvent::update("callback", json!({ "date": "2026-09-01" })),
        }))
        .await;

    // Submit, retrying on simulated transport failure.
    let mut attempts = 0;
    while orchestrator.state() != OrchestratorState::Submitted {
        attempts += 1;
        orchestrator.handle(FormCommand::Submit).await;
        if let Some(error) = orchestrator.last_error() {
            println!("Attempt {attempts} failed: {error}; retrying");
        }
        if attempts >= 10 {
            anyhow::bail!("submission did not succeed after {attempts} attempts");
        }
    }

    if let Some(receipt) = orchestrator.receipt() {
        println!("Submitted after {attempts} attempt(s): {}", receipt.id);
    }

    let snapshot = orchestrator.form_state();
    let saved = json!({
        "form_state": snapshot,
        "fields": {
            "behavioral_health_gad": snapshot.survey().map(document::gad_field),
        },
    });
    let id = store.save(&saved).await?;
    println!("Saved form document as {id}");
    Ok(())
}

async fn show(state_file: Option<String>) -> Result<()> {
    let store = FilePersistence::new(state_file_path(state_file));
    match store.load("latest").await {
        Ok(document) => {
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
        Err(PersistError::Missing { path }) => {
            println!("No saved form document at {path}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
