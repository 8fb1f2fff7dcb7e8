//! `renku-cli` -- import a dataset from one Renku project into another.
//!
//! Checks that the source and destination projects carry compatible
//! metadata versions, submits the import job, then polls its status
//! until it completes, fails, or exceeds the polling budget. Status
//! changes are printed as they are observed; Ctrl-C cancels a running
//! import cleanly.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default | Description                                  |
//! |-----------------------|----------|---------|----------------------------------------------|
//! | `RENKU_API_URL`       | yes      | --      | Base API URL, e.g. `https://renkulab.io/api` |
//! | `SOURCE_PROJECT`      | yes      | --      | Project the dataset comes from               |
//! | `DESTINATION_PROJECT` | yes      | --      | Project the dataset is imported into         |
//! | `SOURCE_DATASET_URL`  | yes      | --      | URL of the dataset to import                 |
//! | `POLL_INTERVAL_SECS`  | no       | `6`     | Seconds between job status polls             |

mod config;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use renku_import::{ImportWorkflow, RenkuApi, WorkflowConfig};

use crate::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "renku_cli=info,renku_import=info,renku_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CliConfig::from_env()?;

    tracing::info!(
        api_url = %config.api_url,
        source = %config.source_project,
        destination = %config.destination_project,
        "starting dataset import"
    );

    let api = RenkuApi::new(config.api_url.clone());
    let mut workflow = ImportWorkflow::with_config(
        api,
        WorkflowConfig {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        },
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling import");
            interrupt.cancel();
        }
    });

    let result = workflow
        .run(
            &config.source_project,
            &config.destination_project,
            &config.source_dataset_url,
            &cancel,
            |update| println!("{} ({} s)", update.text, update.elapsed_secs),
        )
        .await;

    match result {
        Ok(outcome) => {
            println!("Dataset imported: {}", outcome.redirect);
            Ok(())
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
