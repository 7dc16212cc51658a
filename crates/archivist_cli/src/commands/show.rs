use anyhow::Context;
use console::style;

use archivist::SourceKind;
use archivist::mirror;

use crate::commands::shared;
use crate::config::Config;

pub async fn run(config: &Config, kind: &str, remote_id: &str) -> anyhow::Result<()> {
    let kind: SourceKind = kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e} (expected `issue` or `page`)"))?;

    let db = shared::open_database(config).await?;
    let item = mirror::get(&db, kind, remote_id)
        .await?
        .with_context(|| {
            format!("{kind}/{remote_id} is not mirrored; run `archivist sync` first")
        })?;

    println!("{}", style(&item.title).bold());
    let mut meta = format!(
        "{} {} in {} {}",
        kind,
        item.remote_id,
        kind.scope_label(),
        item.scope_key
    );
    if let Some(rev) = item.remote_revision {
        meta.push_str(&format!(" · revision {rev}"));
    }
    meta.push_str(&format!(
        " · synced {}",
        item.synced_at.format("%Y-%m-%d %H:%M")
    ));
    println!("{}", style(meta).dim());
    println!();
    println!("{}", item.body);

    Ok(())
}
