//! Command-line driver for the tablechat workflows.
//!
//! Each subcommand runs one workflow with a managed progress reporter and
//! prints every published snapshot, so the console shows the same step
//! sequence a UI would render.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tablechat::app;
use tablechat::config::Config;
use tablechat::stores::EndpointStore;
use tablechat::types::UserProfile;
use tablechat::workflows::{
    analyze_file, create_db, push_to_db, quick_connect, temp_db, Progress,
};
use tablechat_sdk::{
    log_info, log_warning, ProgressReporter, ProgressStep, StepStatus, UiSignal,
};

#[derive(Parser, Debug)]
#[command(name = "tablechat", about = "Push tabular files to databases and analyze them with AI agents")]
struct Cli {
    /// Advanced analyst endpoint id (see `tablechat endpoints`)
    #[arg(long, global = true)]
    advanced: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse free-text connection details and have both agents test them
    QuickConnect {
        /// Connection details in any textual form
        details: String,
    },
    /// Provision a database and connect the agents to it
    CreateDb {
        /// Nickname for the new database
        nickname: String,
        /// Identity-provider subject for the analytics webhook
        #[arg(long)]
        user_sub: Option<String>,
        /// Email for the analytics webhook
        #[arg(long)]
        user_email: Option<String>,
    },
    /// Upload a tabular file into the connected database
    Push {
        /// File to upload
        file: PathBuf,
        /// Connection details to connect with first (one CLI run is one session)
        #[arg(long)]
        details: Option<String>,
    },
    /// Provision a temporary database and load the file into it
    ProvisionTemp {
        /// File to upload
        file: PathBuf,
    },
    /// Preview a local file with an LLM-inferred schema
    AnalyzeFile {
        /// File to analyze
        file: PathBuf,
        /// Also load the file into the shared analysis database
        #[arg(long)]
        upload: bool,
    },
    /// List the configured advanced analyst endpoints
    Endpoints,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env();

    if let Command::Endpoints = cli.command {
        if config.advanced_endpoints.is_empty() {
            log_warning!("No advanced analyst endpoints configured");
        }
        for endpoint in &config.advanced_endpoints {
            println!("{}: {} [{}]", endpoint.id, endpoint.name, endpoint.tier);
            println!("   {}", endpoint.description);
        }
        return Ok(());
    }

    let endpoints = EndpointStore::new(config.default_advanced_endpoint().cloned());
    if let Some(id) = cli.advanced {
        let endpoint = config
            .advanced_endpoints
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow!("Unknown advanced endpoint id {id}; run `tablechat endpoints`"))?;
        endpoints.select(endpoint.clone());
    }
    let advanced = endpoints.selected().ok_or_else(|| {
        anyhow!("No advanced analyst endpoint configured; set ADV_ANALYST_ENDPOINT_GEMINI or a sibling variable")
    })?;

    let ctx = app::build_context(&config);
    let services = app::build_services(&config, &advanced)?;
    let signal_printer = spawn_signal_printer(&ctx);

    match cli.command {
        Command::QuickConnect { details } => {
            let reporter = ProgressReporter::new(quick_connect::steps());
            let printer = spawn_progress_printer(&reporter);
            let result = quick_connect::run(
                &services,
                &ctx,
                &details,
                "",
                Progress::managed(&reporter),
            )
            .await;
            drop(reporter);
            printer.await.ok();
            let credentials = result?;
            log_info!("Connected to {} ({})", credentials.host, credentials.db_type.as_str());
            print_latest_replies(&ctx);
        }
        Command::CreateDb {
            nickname,
            user_sub,
            user_email,
        } => {
            let webhook = app::build_webhook(&config);
            let user = match (user_sub, user_email) {
                (Some(sub), Some(email)) => Some(UserProfile { sub, email }),
                _ => None,
            };
            let reporter = ProgressReporter::new(create_db::steps());
            let printer = spawn_progress_printer(&reporter);
            let result = create_db::run(
                &services,
                &ctx,
                &webhook,
                &nickname,
                user.as_ref(),
                Progress::managed(&reporter),
            )
            .await;
            drop(reporter);
            printer.await.ok();
            let database = result?;
            log_info!(
                "Database {} ready at {}:{}",
                database.database_name,
                database.hostname,
                database.port
            );
            print_latest_replies(&ctx);
        }
        Command::Push { file, details } => {
            if let Some(details) = details {
                quick_connect::run(&services, &ctx, &details, "", Progress::deferred()).await?;
                log_info!("Connected; pushing {}", file.display());
            }
            let reporter = ProgressReporter::new(push_to_db::steps());
            let printer = spawn_progress_printer(&reporter);
            let result =
                push_to_db::run(&services, &ctx, &file, Progress::managed(&reporter)).await;
            drop(reporter);
            printer.await.ok();
            match result? {
                push_to_db::PushOutcome::AwaitingDatabaseChoice => {
                    log_warning!(
                        "No database connected. Pass --details, or run `tablechat provision-temp {}`",
                        file.display()
                    );
                }
                push_to_db::PushOutcome::Completed(table) => {
                    log_info!(
                        "Loaded {} rows into {}",
                        table.row_count,
                        table.table_name
                    );
                    print_latest_replies(&ctx);
                }
            }
        }
        Command::ProvisionTemp { file } => {
            let reporter = ProgressReporter::new(temp_db::steps());
            let printer = spawn_progress_printer(&reporter);
            let result = temp_db::run(&services, &ctx, &file, Progress::managed(&reporter)).await;
            drop(reporter);
            printer.await.ok();
            let table = result?;
            log_info!("Loaded {} rows into {}", table.row_count, table.table_name);
            print_latest_replies(&ctx);
        }
        Command::AnalyzeFile { file, upload } => {
            let preview = analyze_file::preview(&services, &file).await?;
            log_info!(
                "Delimiter '{}', {} columns",
                preview.delimiter,
                preview.schema.columns.len()
            );
            for column in &preview.schema.columns {
                println!("  {} {} - {}", column.name, column.column_type, column.description);
            }
            if upload {
                let reporter = ProgressReporter::new(analyze_file::steps());
                let printer = spawn_progress_printer(&reporter);
                let result = analyze_file::upload_llm_assisted(
                    &services,
                    &ctx,
                    &file,
                    config.shared_analysis_db.as_ref(),
                    Progress::managed(&reporter),
                )
                .await;
                drop(reporter);
                printer.await.ok();
                let table = result?;
                log_info!("Loaded {} rows into {}", table.row_count, table.table_name);
            }
        }
        Command::Endpoints => unreachable!("handled above"),
    }

    drop(ctx);
    signal_printer.await.ok();
    Ok(())
}

/// Print every published step snapshot until the reporter is dropped
fn spawn_progress_printer(reporter: &ProgressReporter) -> tokio::task::JoinHandle<()> {
    let mut rx = reporter.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(snapshot) => render_steps(&snapshot),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn render_steps(steps: &[ProgressStep]) {
    println!();
    for step in steps {
        match step.status {
            StepStatus::Pending => println!("  [ ] {}", step.message),
            StepStatus::InProgress => println!("\x1b[36m  [>] {}\x1b[0m", step.message),
            StepStatus::Completed => println!("\x1b[32m  [x] {}\x1b[0m", step.message),
            StepStatus::Error => println!(
                "\x1b[31m  [!] {} ({})\x1b[0m",
                step.message,
                step.error.as_deref().unwrap_or("error")
            ),
        }
    }
}

/// Print UI signals as they arrive (chart artifacts, chat activation)
fn spawn_signal_printer(ctx: &tablechat::workflows::WorkflowContext) -> tokio::task::JoinHandle<()> {
    let mut rx = ctx.signals.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(UiSignal::ChartArtifactAdded { url, source }) => {
                    log_info!("Chart from {} agent: {}", source, url);
                }
                Ok(UiSignal::ChatTabActivated) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Print the newest reply of each analyst thread
fn print_latest_replies(ctx: &tablechat::workflows::WorkflowContext) {
    use tablechat::stores::ThreadKind;
    for (kind, label) in [
        (ThreadKind::General, "General analyst"),
        (ThreadKind::Advanced, "Advanced analyst"),
    ] {
        if let Some(message) = ctx.threads.messages(kind).last() {
            println!("\n\x1b[1m{label}:\x1b[0m\n{}", message.content);
        }
    }
}
