use anyhow::Context;

use archivist::migration::{Migrator, MigratorTrait};

use crate::MigrateAction;
use crate::config::Config;

pub async fn run(config: &Config, action: MigrateAction) -> anyhow::Result<()> {
    let url = config.database_url()?;
    // Connect without the auto-migrate wrapper; this command drives the
    // migrator explicitly.
    let db = archivist::connect(&url)
        .await
        .with_context(|| format!("cannot open mirror database at {url}"))?;

    match action {
        MigrateAction::Up => {
            Migrator::up(&db, None).await.context("migration failed")?;
            println!("Migrations applied.");
        }
        MigrateAction::Status => {
            Migrator::status(&db).await.context("cannot read migration status")?;
        }
        MigrateAction::Fresh => {
            Migrator::fresh(&db).await.context("fresh migration failed")?;
            println!("Database recreated from scratch.");
        }
    }

    Ok(())
}
