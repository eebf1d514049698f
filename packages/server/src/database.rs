use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

const ENTRIES_TYPE_CHECK: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_constraint WHERE conname = 'entries_type_check') THEN
        ALTER TABLE entries
            ADD CONSTRAINT entries_type_check CHECK ("type" IN ('link', 'file'));
    END IF;
END
$$;
"#;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Ensure table constraints that schema-sync cannot express.
///
/// Failures are logged and do not stop the server.
pub async fn ensure_constraints(db: &DatabaseConnection) -> Result<(), DbErr> {
    match db.execute_unprepared(ENTRIES_TYPE_CHECK).await {
        Ok(_) => info!("Ensured constraint entries_type_check exists"),
        Err(e) => warn!(error = %e, "Failed to ensure constraint entries_type_check"),
    }
    Ok(())
}
