use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use onboard_rs::onboarding::server;
use onboard_rs::onboarding::{OnboardingConfig, Supervisor};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the onboarding HTTP API
    Serve {
        /// Port to listen on (overrides configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Process one onboarding message
    Turn {
        /// Session to continue; a new one is started when omitted
        #[arg(short, long)]
        session: Option<String>,

        /// The user's message
        #[arg(short, long)]
        message: String,
    },
    /// Print a stored session
    Show {
        #[arg(short, long)]
        session: String,
    },
    /// List stored sessions, most recent first
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = OnboardingConfig::load(args.config.as_deref()).context("loading configuration")?;
    let supervisor = Supervisor::from_config(&config)
        .await
        .context("building supervisor")?;

    match args.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            server::serve(Arc::new(supervisor), &config.server.host, port).await?;
        }
        Commands::Turn { session, message } => {
            let result = supervisor.process_turn(session.as_deref(), &message).await?;
            println!("{}", result.message);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Show { session } => {
            let session = supervisor.get_session(&session).await?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Commands::List => {
            for summary in supervisor.list_sessions().await? {
                println!(
                    "{}\t{:?}\t{}\t{}",
                    summary.session_id,
                    summary.status,
                    summary.onboarding_id.as_deref().unwrap_or("-"),
                    summary.updated_at.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}
