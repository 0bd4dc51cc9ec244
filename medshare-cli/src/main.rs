//! medshare - operator CLI for ledger-backed document sharing

mod args;

use anyhow::Context;
use args::{Args, Command, PatientAction};
use clap::Parser;
use medshare_client::{NewPatient, Patient};
use medshare_sdk::{
    spawn_refresh_task, ActivitySummary, ParticipantView, ShareClient, ShareError, SymptomReport,
    TransferRecord, UploadDetails, UploadRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logs go to stderr so stdout stays scriptable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "medshare_cli={lvl},medshare_sdk={lvl},medshare_client={lvl},warn",
                    lvl = args.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        match e.downcast_ref::<ShareError>() {
            Some(share_error) => eprintln!("{}", share_error.user_message()),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.share_config()?;
    let client = ShareClient::from_config(config)?;
    let json = args.json;

    match args.command {
        Command::Sent => print_view(&client.sent_view().await?, &client, json)?,
        Command::Received => print_view(&client.received_view().await?, &client, json)?,

        Command::Share {
            file,
            to,
            patient_name,
            document_type,
            notes,
        } => {
            let (tx, mut rx) = mpsc::unbounded_channel::<medshare_sdk::upload::UploadProgress>();
            let printer = tokio::spawn(async move {
                while let Some(progress) = rx.recv().await {
                    eprintln!("[{}] {}", progress.state, progress.message);
                }
            });

            let mut orchestrator = client.orchestrator().with_progress(tx);
            let result = orchestrator
                .share(UploadRequest {
                    sender: client.participant().ok().cloned(),
                    receiver: to,
                    file: Some(file),
                    details: UploadDetails {
                        patient_name,
                        document_type,
                        notes,
                    },
                })
                .await;
            drop(orchestrator);
            let _ = printer.await;

            let receipt = result?;
            for warning in &receipt.warnings {
                eprintln!("warning: {}", warning);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&receipt.record)?);
            } else {
                println!("content id: {}", receipt.record.content_id);
                println!("receiver:   {}", receipt.record.receiver.to_checksum());
                println!("tx:         {}", receipt.tx_hash);
                println!("link:       {}", client.gateway_url(&receipt.record));
            }
        }

        Command::Watch { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| client.config().refresh.interval());
            let refresher = Arc::new(client.refresher()?);
            let mut updates = refresher.subscribe();
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let task = spawn_refresh_task(refresher, interval, shutdown_rx);

            info!(interval_secs = interval.as_secs(), "Watching for transfers, Ctrl-C to stop");
            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = updates.borrow_and_update().clone();
                        if let Some(snapshot) = snapshot {
                            println!("--- refresh #{} at {} ---", snapshot.seq, snapshot.refreshed_at.format("%H:%M:%S"));
                            print_view(&snapshot.views.received, &client, json)?;
                            print_view(&snapshot.views.sent, &client, json)?;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            let _ = shutdown_tx.send(true);
            task.await.context("refresh task panicked")?;
        }

        Command::Pending => {
            let participant = client.participant()?;
            let records = client.pending().list(participant).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No pending transfers for {}", participant.short());
            } else {
                print_records(&records, participant.as_str(), &client);
            }
        }

        Command::ClearPending { all } => {
            if all {
                let cleared = client.pending().clear_all().await?;
                println!("Cleared {} pending list(s)", cleared);
            } else {
                let participant = client.participant()?;
                client.pending().clear(participant).await?;
                println!("Cleared pending transfers for {}", participant.short());
            }
        }

        Command::Summary { days } => {
            let today = chrono::Utc::now().date_naive();
            let summary = match days {
                Some(days) => {
                    let views = client.views().await?;
                    ActivitySummary::from_views(&views.sent, &views.received, today, days)
                }
                None => client.activity(today).await?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "sent: {}  received: {}  pending: {}",
                    summary.total_sent, summary.total_received, summary.pending
                );
                for day in &summary.days {
                    println!("{:>7}  sent {:>3}  received {:>3}", day.label, day.sent, day.received);
                }
            }
        }

        Command::Guidance {
            symptoms,
            history,
            duration,
            severity,
        } => {
            let report = SymptomReport {
                symptoms,
                medical_history: history,
                duration,
                severity,
            };
            println!("{}", client.guidance(&report).await?);
        }

        Command::Patients { action } => run_patients(&client, action, json).await?,
    }

    Ok(())
}

async fn run_patients(client: &ShareClient, action: PatientAction, json: bool) -> anyhow::Result<()> {
    let records = client.records();
    match action {
        PatientAction::List => {
            let patients = records.list_patients().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&patients)?);
            } else {
                for patient in &patients {
                    print_patient_row(patient);
                }
            }
        }
        PatientAction::Show { id } => match records.get_patient(&id).await? {
            Some(patient) => println!("{}", serde_json::to_string_pretty(&patient)?),
            None => anyhow::bail!("no patient with id {}", id),
        },
        PatientAction::Create { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let input: NewPatient = serde_json::from_str(&raw).context("parsing patient JSON")?;
            let created = records.create_patient(&input).await?;
            println!("created {}", created.id);
        }
        PatientAction::Delete { id } => {
            if records.delete_patient(&id).await? {
                println!("deleted {}", id);
            } else {
                anyhow::bail!("no patient with id {}", id);
            }
        }
    }
    Ok(())
}

fn print_patient_row(patient: &Patient) {
    println!(
        "{:<26} {:<24} {:>3} {:<10} {}",
        patient.id, patient.patient_name, patient.age, patient.department, patient.diagnosis
    );
}

fn print_view(view: &ParticipantView, client: &ShareClient, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!("{} ({})", view.direction, view.records.len());
    if let Some(warning) = &view.warning {
        println!("  ! {}", warning);
    }
    print_records(&view.records, view.participant.as_str(), client);
    Ok(())
}

fn print_records(records: &[TransferRecord], participant: &str, client: &ShareClient) {
    for record in records {
        let counterpart = if record.sender.as_str() == participant {
            &record.receiver
        } else {
            &record.sender
        };
        let when = record
            .shared_at()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if record.is_pending() { " (pending)" } else { "" };
        println!(
            "  {}  {}  {}{}\n      {}",
            when,
            counterpart.short(),
            record.content_id,
            marker,
            client.gateway_url(record)
        );
    }
}
