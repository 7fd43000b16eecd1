use crate::config::AppConfig;
use crate::entities::{files, folders, orphan_blobs, users};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(config: &AppConfig) -> anyhow::Result<DatabaseConnection> {
    info!("📂 Database: {}", config.database_url);

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    // Every pooled connection to "sqlite::memory:" would be its own database.
    if config.database_url.contains(":memory:") {
        opt.max_connections(1);
    }

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;

    Ok(db)
}

/// Creates the tables from the entity definitions; existing tables are kept.
pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    info!("🔄 Ensuring schema...");
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Referenced tables first.
    let stmts = vec![
        schema
            .create_table_from_entity(users::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(folders::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(files::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(orphan_blobs::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for stmt in stmts {
        db.execute(builder.build(&stmt)).await?;
    }

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_folders_owner ON folders(owner_id)",
        "CREATE INDEX IF NOT EXISTS idx_folders_parent ON folders(parent_id)",
        "CREATE INDEX IF NOT EXISTS idx_files_folder ON files(folder_id)",
        "CREATE INDEX IF NOT EXISTS idx_files_owner ON files(owner_id)",
    ];
    for sql in indexes {
        db.execute(sea_orm::Statement::from_string(builder, sql.to_string()))
            .await?;
    }

    Ok(())
}
