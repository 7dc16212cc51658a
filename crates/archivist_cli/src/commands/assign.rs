use std::sync::Arc;

use archivist::batch::{self, DEFAULT_BATCH_CONCURRENCY, run_all};
use archivist::remote::IssueSource;

use crate::commands::shared;
use crate::config::Config;

pub async fn run(
    config: &Config,
    assignee: &str,
    issues: Vec<String>,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    let client = shared::api_client(config)?;
    let source = Arc::new(IssueSource::new(client));
    let concurrency = concurrency.unwrap_or(DEFAULT_BATCH_CONCURRENCY);
    let total = issues.len();

    let op_source = Arc::clone(&source);
    let assignee_owned = assignee.to_string();
    let outcomes = run_all(issues, concurrency, move |issue: String| {
        let source = Arc::clone(&op_source);
        let assignee = assignee_owned.clone();
        async move { source.assign(&issue, &assignee).await }
    })
    .await;

    let (succeeded, failed) = batch::tally(&outcomes);
    println!("{succeeded} succeeded, {failed} failed");

    if failed > 0 {
        let failures: Vec<(String, String)> = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| {
                let message = o
                    .result
                    .as_ref()
                    .err()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                (o.input.clone(), message)
            })
            .collect();
        shared::print_failures(failures.iter().map(|(id, m)| (id.as_str(), m.as_str())), 5);
        anyhow::bail!("{failed} of {total} assignments failed");
    }

    Ok(())
}
