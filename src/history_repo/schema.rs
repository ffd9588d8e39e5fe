// Table and index definitions. Series tables share the (timestamp) index the sweeper deletes by.

use sqlx::SqlitePool;

const SERIES_TABLES: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS network_traffic (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        upload_speed REAL NOT NULL,
        download_speed REAL NOT NULL,
        total_upload INTEGER NOT NULL,
        total_download INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS network_latency (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        target TEXT NOT NULL,
        latency REAL NOT NULL,
        packet_loss REAL NOT NULL DEFAULT 0,
        jitter REAL NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS router_status (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        cpu_usage REAL NOT NULL,
        memory_usage REAL NOT NULL,
        memory_total INTEGER NOT NULL,
        memory_used INTEGER NOT NULL,
        temperature REAL NOT NULL DEFAULT 0,
        uptime INTEGER NOT NULL,
        load_average REAL NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS connection_quality (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp INTEGER NOT NULL,
        signal_strength REAL NOT NULL,
        connection_stability REAL NOT NULL,
        error_rate REAL NOT NULL DEFAULT 0,
        retransmission_rate REAL NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    )
    "#,
];

pub(super) async fn create_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    for ddl in SERIES_TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    for (table, index) in [
        ("network_traffic", "idx_traffic_timestamp"),
        ("network_latency", "idx_latency_timestamp"),
        ("router_status", "idx_status_timestamp"),
        ("connection_quality", "idx_quality_timestamp"),
    ] {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}(timestamp)",
            index, table
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS online_devices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            mac_address TEXT NOT NULL UNIQUE,
            ip_address TEXT NOT NULL,
            hostname TEXT,
            device_type TEXT,
            is_online INTEGER NOT NULL DEFAULT 1,
            last_seen INTEGER NOT NULL,
            upload_speed REAL NOT NULL DEFAULT 0,
            download_speed REAL NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bandwidth_usage (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            period_type TEXT NOT NULL CHECK (period_type IN ('daily', 'monthly')),
            total_upload INTEGER NOT NULL,
            total_download INTEGER NOT NULL,
            peak_upload_speed REAL NOT NULL DEFAULT 0,
            peak_download_speed REAL NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (date, period_type)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
