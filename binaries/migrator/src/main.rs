use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sql_connection::{
    Migration, PostgresDbConfig, SqlMigrator, connect_postgres_db,
};
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "migrator")]
#[command(about = "Apply, roll back and scaffold SQL schema migrations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL", help = "PostgreSQL connection URL")]
    database_url: Option<String>,

    #[arg(
        long,
        help = "Directory of NNN_name.up.sql / NNN_name.down.sql files \
                (defaults to the built-in user migrations)"
    )]
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an empty up/down pair with the next free version
    Create {
        #[arg(short, long)]
        name: String,
    },

    #[command(flatten)]
    Db(DbCommand),
}

/// Commands that need a database connection
#[derive(Subcommand)]
enum DbCommand {
    /// Apply pending migrations
    Up {
        #[arg(short, long)]
        steps: Option<usize>,
    },

    /// Roll back the most recently applied migrations
    Down {
        #[arg(short, long, default_value = "1")]
        steps: usize,
    },

    /// Roll back every applied migration
    Reset,

    /// Show applied and pending migrations
    Status,

    /// Mark migrations up to VERSION as applied without running their SQL
    Force {
        #[arg(short, long)]
        version: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Create { name } => create(cli.path.as_deref(), &name),
        Commands::Db(command) => {
            let migrator =
                connect(cli.database_url, cli.path.as_deref()).await?;
            run(command, &migrator).await
        }
    }
}

fn create(path: Option<&Path>, name: &str) -> Result<()> {
    let Some(dir) = path
    else {
        bail!("create needs --path pointing at a migrations directory");
    };
    let (up, down) = Migration::create_files(dir, name)?;
    info!("Created {}", up.display());
    info!("Created {}", down.display());
    Ok(())
}

async fn run(command: DbCommand, migrator: &SqlMigrator) -> Result<()> {
    match command {
        DbCommand::Up { steps } => {
            info!("Running pending migrations...");
            let applied = migrator.up(steps).await?;
            if applied.is_empty() {
                info!("Database is up to date");
            }
            else {
                info!("✓ Applied {} migration(s): {:?}", applied.len(), applied);
            }
        }
        DbCommand::Down { steps } => {
            info!("Rolling back {} migration(s)...", steps);
            let rolled_back = migrator.down(steps).await?;
            if rolled_back.is_empty() {
                info!("No migrations to roll back");
            }
            else {
                info!("✓ Rolled back: {:?}", rolled_back);
            }
        }
        DbCommand::Reset => {
            info!(
                "⚠️  WARNING: This will roll back ALL migrations and DELETE \
                 ALL DATA!"
            );
            info!("Press Ctrl+C to cancel, or wait 5 seconds to continue...");
            tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

            let rolled_back = migrator.reset().await?;
            info!("✓ Rolled back {} migration(s)", rolled_back.len());
        }
        DbCommand::Status => {
            let applied = migrator.applied().await?;
            if applied.is_empty() {
                info!("No migrations have been applied");
            }
            else {
                info!("Applied migrations:");
                for migration in &applied {
                    info!(
                        "  ✓ {:03}_{} ({})",
                        migration.version,
                        migration.name,
                        migration.applied_at.to_rfc3339()
                    );
                }
            }

            let pending = migrator.pending().await?;
            if !pending.is_empty() {
                info!("Pending migrations:");
                for migration in pending {
                    info!("  • {:03}_{}", migration.version, migration.name);
                }
            }
        }
        DbCommand::Force { version } => {
            migrator.force(version).await?;
            info!("✓ Forced database to version {}", version);
        }
    }

    Ok(())
}

async fn connect(
    database_url: Option<String>, path: Option<&Path>,
) -> Result<SqlMigrator> {
    let Some(database_url) = database_url
    else {
        bail!("--database-url or DATABASE_URL must be set");
    };

    let migrations = load_migrations(path)?;

    let mut config = PostgresDbConfig::from_uri(database_url);
    config.max_conn = Some(2);
    let db = connect_postgres_db(&config)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database successfully");

    Ok(SqlMigrator::new(db.pool().clone(), migrations))
}

fn load_migrations(path: Option<&Path>) -> Result<Vec<Migration>> {
    match path {
        Some(dir) => Migration::load_dir(dir),
        None => Ok(user_dao::migrations()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_down_defaults_to_one_step() {
        let cli = Cli::try_parse_from([
            "migrator",
            "--database-url",
            "postgres://localhost/users",
            "down",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Db(DbCommand::Down { steps: 1 })
        ));
    }

    #[test]
    fn test_up_accepts_steps_and_path() {
        let cli = Cli::try_parse_from([
            "migrator", "--path", "migrations", "up", "--steps", "2",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Db(DbCommand::Up { steps: Some(2) })
        ));
        assert_eq!(cli.path, Some(PathBuf::from("migrations")));
    }

    #[test]
    fn test_force_takes_a_version() {
        let cli =
            Cli::try_parse_from(["migrator", "force", "--version", "3"])
                .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Db(DbCommand::Force { version: 3 })
        ));
        assert!(Cli::try_parse_from(["migrator", "force"]).is_err());
    }

    #[test]
    fn test_create_parses_without_database_url() {
        let cli =
            Cli::try_parse_from(["migrator", "create", "--name", "add_index"])
                .unwrap();

        assert!(
            matches!(cli.command, Commands::Create { ref name } if name == "add_index")
        );
    }

    #[test]
    fn test_create_requires_a_path() {
        assert!(create(None, "add_index").is_err());
    }

    #[test]
    fn test_default_migrations_are_the_user_schema() {
        let migrations = load_migrations(None).unwrap();

        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].name, "create_users");
    }
}
