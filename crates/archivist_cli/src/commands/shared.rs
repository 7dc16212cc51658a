//! Shared wiring for CLI commands.

use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;

use archivist::remote::ApiClient;
use archivist::transport::reqwest_transport::ReqwestTransport;

use crate::config::Config;

/// Open the mirror database, running any pending migrations.
pub async fn open_database(config: &Config) -> anyhow::Result<DatabaseConnection> {
    let url = config.database_url()?;
    archivist::connect_and_migrate(&url)
        .await
        .with_context(|| format!("cannot open mirror database at {url}"))
}

/// Build the retry-wrapped API client from configuration.
pub fn api_client(config: &Config) -> anyhow::Result<Arc<ApiClient>> {
    let remote = config.remote_config()?;
    Ok(Arc::new(ApiClient::new(
        Arc::new(ReqwestTransport::default()),
        Arc::new(remote),
    )))
}

/// Print the first few failure messages of a run or batch.
pub fn print_failures<'a, I>(failures: I, limit: usize)
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut shown = 0usize;
    let mut hidden = 0usize;
    for (id, message) in failures {
        if shown < limit {
            eprintln!("  - {id}: {message}");
            shown += 1;
        } else {
            hidden += 1;
        }
    }
    if hidden > 0 {
        eprintln!("  ... and {hidden} more failures");
    }
}
