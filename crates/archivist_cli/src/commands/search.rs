use tabled::{Table, Tabled, settings::Style};

use archivist::mirror;

use crate::commands::shared;
use crate::config::Config;

#[derive(Tabled)]
struct HitRow {
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "SCOPE")]
    scope: String,
    #[tabled(rename = "TITLE")]
    title: String,
}

pub async fn run(config: &Config, query: &str, limit: u64) -> anyhow::Result<()> {
    let db = shared::open_database(config).await?;
    let hits = mirror::search(&db, query, limit).await?;

    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    let rows: Vec<HitRow> = hits
        .into_iter()
        .map(|h| HitRow {
            kind: h.source_kind.to_string(),
            id: h.remote_id,
            scope: h.scope_key,
            title: h.title,
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}
