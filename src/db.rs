use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

const MAX_CONNECTIONS: u32 = 10;

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        name VARCHAR(255) NOT NULL,
        role VARCHAR(16) NOT NULL,
        manager_id BIGINT UNSIGNED NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        CONSTRAINT fk_users_manager FOREIGN KEY (manager_id)
            REFERENCES users (id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS vacation_requests (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT UNSIGNED NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        status VARCHAR(16) NOT NULL DEFAULT 'PENDING',
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        INDEX idx_vacation_status_dates (status, start_date, end_date),
        CONSTRAINT fk_vacation_user FOREIGN KEY (user_id) REFERENCES users (id)
    )
    "#,
];

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}

/// Creates the tables on a fresh database; existing tables are left alone.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Database schema ready");
    Ok(())
}
