use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tracing::{info, instrument};

const UP_SUFFIX: &str = ".up.sql";
const DOWN_SUFFIX: &str = ".down.sql";

/// A single versioned schema change, stored on disk as
/// `NNN_name.up.sql` / `NNN_name.down.sql`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub name: String,
    pub up_sql: String,
    pub down_sql: String,
}

impl Migration {
    pub fn new(
        version: u32, name: impl Into<String>, up_sql: impl Into<String>,
        down_sql: impl Into<String>,
    ) -> Self {
        Self {
            version,
            name: name.into(),
            up_sql: up_sql.into(),
            down_sql: down_sql.into(),
        }
    }

    /// Splits `001_create_users.up.sql` into `(1, "create_users")`.
    pub fn parse_file_name(file_name: &str) -> Option<(u32, String)> {
        let stem = file_name.strip_suffix(UP_SUFFIX)?;
        let (version, name) = stem.split_once('_')?;
        if version.len() != 3 || name.is_empty() {
            return None;
        }
        let version = version.parse().ok()?;
        Some((version, name.to_string()))
    }

    /// Loads every `*.up.sql` in `dir` together with its `.down.sql`
    /// sibling. A missing down file yields an empty rollback.
    pub fn load_dir(dir: &Path) -> anyhow::Result<Vec<Migration>> {
        let mut migrations = Vec::new();
        let entries = fs::read_dir(dir).with_context(|| {
            format!("Failed to read migrations directory {}", dir.display())
        })?;

        for entry in entries {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|f| f.to_str())
            else {
                continue;
            };
            let Some((version, name)) = Self::parse_file_name(file_name)
            else {
                continue;
            };

            let up_sql = fs::read_to_string(&path).with_context(|| {
                format!("Failed to read {}", path.display())
            })?;
            let down_path =
                dir.join(format!("{version:03}_{name}{DOWN_SUFFIX}"));
            let down_sql = if down_path.exists() {
                fs::read_to_string(&down_path).with_context(|| {
                    format!("Failed to read {}", down_path.display())
                })?
            }
            else {
                String::new()
            };

            migrations.push(Migration::new(version, name, up_sql, down_sql));
        }

        migrations.sort_by_key(|m| m.version);
        Ok(migrations)
    }

    /// Writes an empty up/down pair using the next free version in `dir`.
    pub fn create_files(
        dir: &Path, name: &str,
    ) -> anyhow::Result<(PathBuf, PathBuf)> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\', '.']) {
            bail!("Invalid migration name: {name:?}");
        }

        fs::create_dir_all(dir).with_context(|| {
            format!("Failed to create directory {}", dir.display())
        })?;

        let next_version = Self::load_dir(dir)?
            .last()
            .map(|m| m.version + 1)
            .unwrap_or(1);
        if next_version > 999 {
            bail!("Migration versions are exhausted in {}", dir.display());
        }

        let up_path = dir.join(format!("{next_version:03}_{name}{UP_SUFFIX}"));
        let down_path =
            dir.join(format!("{next_version:03}_{name}{DOWN_SUFFIX}"));

        fs::write(&up_path, format!("-- Migration: {name} (up)\n"))?;
        fs::write(&down_path, format!("-- Migration: {name} (down)\n"))?;

        Ok((up_path, down_path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: u32,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// Applies and rolls back plain SQL migrations, recording progress in the
/// `_migrations` table. Each migration runs in its own transaction.
pub struct SqlMigrator {
    pool: Pool,
    migrations: Vec<Migration>,
}

impl SqlMigrator {
    pub fn new(pool: Pool, mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by_key(|m| m.version);
        Self { pool, migrations }
    }

    pub fn migrations(&self) -> &[Migration] { &self.migrations }

    async fn create_migration_table(&self) -> anyhow::Result<()> {
        let client = self.pool.get().await?;
        client
            .batch_execute(
                r#"
                CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    name VARCHAR(255) NOT NULL,
                    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#,
            )
            .await
            .context("Failed to create _migrations table")?;
        Ok(())
    }

    /// List applied migrations in version order
    pub async fn applied(&self) -> anyhow::Result<Vec<AppliedMigration>> {
        self.create_migration_table().await?;

        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT version, name, applied_at FROM _migrations ORDER BY \
                 version",
                &[],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let version: i32 = row.get("version");
                AppliedMigration {
                    version: version as u32,
                    name: row.get("name"),
                    applied_at: row.get("applied_at"),
                }
            })
            .collect())
    }

    /// Known migrations that have not been applied yet
    pub async fn pending(&self) -> anyhow::Result<Vec<&Migration>> {
        let applied = self.applied().await?;
        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.iter().any(|a| a.version == m.version))
            .collect())
    }

    /// Applies pending migrations in ascending order, at most `steps` of
    /// them when given. Returns the versions applied.
    #[instrument(skip(self))]
    pub async fn up(&self, steps: Option<usize>) -> anyhow::Result<Vec<u32>> {
        let pending = self.pending().await?;
        let limit = steps.unwrap_or(pending.len());
        let mut done = Vec::new();

        for migration in pending.into_iter().take(limit) {
            info!(
                "Applying migration {:03}_{}",
                migration.version, migration.name
            );

            let mut client = self.pool.get().await?;
            let tx = client.transaction().await?;
            tx.batch_execute(&migration.up_sql).await.with_context(|| {
                format!(
                    "Failed to apply migration {:03}_{}",
                    migration.version, migration.name
                )
            })?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES \
                 ($1, $2, NOW())",
                &[&(migration.version as i32), &migration.name],
            )
            .await?;
            tx.commit().await?;

            done.push(migration.version);
        }

        Ok(done)
    }

    /// Rolls back the `steps` most recently applied migrations.
    #[instrument(skip(self))]
    pub async fn down(&self, steps: usize) -> anyhow::Result<Vec<u32>> {
        let applied = self.applied().await?;
        let mut done = Vec::new();

        for record in applied.iter().rev().take(steps) {
            let Some(migration) =
                self.migrations.iter().find(|m| m.version == record.version)
            else {
                bail!(
                    "Applied migration {:03}_{} has no matching files",
                    record.version,
                    record.name
                );
            };

            info!(
                "Rolling back migration {:03}_{}",
                migration.version, migration.name
            );

            let mut client = self.pool.get().await?;
            let tx = client.transaction().await?;
            if !migration.down_sql.trim().is_empty() {
                tx.batch_execute(&migration.down_sql).await.with_context(
                    || {
                        format!(
                            "Failed to roll back migration {:03}_{}",
                            migration.version, migration.name
                        )
                    },
                )?;
            }
            tx.execute(
                "DELETE FROM _migrations WHERE version = $1",
                &[&(migration.version as i32)],
            )
            .await?;
            tx.commit().await?;

            done.push(migration.version);
        }

        Ok(done)
    }

    /// Rolls back everything that was applied, newest first.
    pub async fn reset(&self) -> anyhow::Result<Vec<u32>> {
        let applied = self.applied().await?.len();
        self.down(applied).await
    }

    /// Rewrites the bookkeeping so that exactly the known migrations up to
    /// and including `version` are recorded as applied. No migration SQL is
    /// executed. `version` 0 clears the table.
    #[instrument(skip(self))]
    pub async fn force(&self, version: u32) -> anyhow::Result<()> {
        if version != 0 && !self.migrations.iter().any(|m| m.version == version)
        {
            bail!("No migration with version {:03}", version);
        }
        self.create_migration_table().await?;

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        tx.execute(
            "DELETE FROM _migrations WHERE version > $1",
            &[&(version as i32)],
        )
        .await?;
        for migration in self.migrations.iter().filter(|m| m.version <= version)
        {
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES \
                 ($1, $2, NOW()) ON CONFLICT (version) DO NOTHING",
                &[&(migration.version as i32), &migration.name],
            )
            .await?;
        }
        tx.commit().await?;

        info!("Forced migration bookkeeping to version {:03}", version);
        Ok(())
    }
}
