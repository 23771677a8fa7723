//! Applies module migrations once each, tracked in `_shelf_migrations`.

use anyhow::Context;
use sqlx::{Connection, SqliteConnection};

use crate::Database;

const CREATE_LEDGER: &str = "CREATE TABLE IF NOT EXISTS _shelf_migrations (
    module TEXT NOT NULL,
    id TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (module, id)
)";

/// Migration definition contributed by a module.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

impl Database {
    /// Run every `(module, migration)` pair not yet recorded in the ledger.
    ///
    /// Each migration and its ledger row commit in one transaction.
    /// Returns the number of migrations applied.
    pub async fn run_migrations(
        &self,
        migrations: &[(String, Migration)],
    ) -> anyhow::Result<usize> {
        let mut conn = self
            .acquire()
            .await
            .with_context(|| "failed to acquire connection for migrations")?;

        sqlx::query(CREATE_LEDGER)
            .execute(&mut *conn)
            .await
            .with_context(|| "failed to create migration ledger")?;

        let mut applied = 0;
        for (module, migration) in migrations {
            if is_applied(&mut conn, module, migration.id).await? {
                tracing::debug!(
                    target: "shelf-db",
                    module = %module,
                    id = migration.id,
                    "migration already applied"
                );
                continue;
            }

            apply(&mut conn, module, migration)
                .await
                .with_context(|| format!("migration '{}/{}' failed", module, migration.id))?;

            tracing::info!(
                target: "shelf-db",
                module = %module,
                id = migration.id,
                "migration applied"
            );
            applied += 1;
        }

        Ok(applied)
    }
}

async fn is_applied(conn: &mut SqliteConnection, module: &str, id: &str) -> anyhow::Result<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM _shelf_migrations WHERE module = ? AND id = ?")
            .bind(module)
            .bind(id)
            .fetch_optional(conn)
            .await
            .with_context(|| "failed to read migration ledger")?;
    Ok(found.is_some())
}

async fn apply(
    conn: &mut SqliteConnection,
    module: &str,
    migration: &Migration,
) -> anyhow::Result<()> {
    let mut tx = conn.begin().await?;

    sqlx::raw_sql(migration.up).execute(&mut *tx).await?;
    sqlx::query("INSERT INTO _shelf_migrations (module, id) VALUES (?, ?)")
        .bind(module)
        .bind(migration.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
