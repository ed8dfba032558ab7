//! Churn Service - Main Entry Point

use clap::Parser;
use churn_service::cli::{cmd_evaluate, cmd_info, cmd_predict, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churn_service=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port, host }) => {
            cmd_serve(host, port).await?;
        }
        Some(Commands::Evaluate { model, metric, data, output, test_size, seed }) => {
            tokio::task::spawn_blocking(move || {
                cmd_evaluate(&model, &metric, data.as_deref(), output.as_deref(), test_size, seed)
            })
            .await??;
        }
        Some(Commands::Predict { data, model_path, strict }) => {
            cmd_predict(&data, model_path.as_deref(), strict)?;
        }
        Some(Commands::Info { model_path }) => {
            cmd_info(model_path.as_deref())?;
        }
        None => {
            // No subcommand: run the API
            cmd_serve(None, None).await?;
        }
    }

    Ok(())
}
