use anyhow::Context;
use rusqlite::Connection;

// Migrations are embedded so that :memory: databases get the full schema.
// Append new entries; never edit an applied one.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_bookings",
        "CREATE TABLE IF NOT EXISTS bookings (
            id TEXT PRIMARY KEY,
            service TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL DEFAULT 60,
            client_name TEXT NOT NULL,
            client_email TEXT NOT NULL,
            client_phone TEXT,
            message TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            confirmed_at TEXT,
            cancelled_at TEXT,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status);
        CREATE INDEX IF NOT EXISTS idx_bookings_date ON bookings(date);",
    ),
    (
        "002_modification_tokens",
        "CREATE TABLE IF NOT EXISTS modification_tokens (
            id TEXT PRIMARY KEY,
            digest TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'modify',
            booking_id TEXT NOT NULL REFERENCES bookings(id),
            expires_at TEXT NOT NULL,
            consumed_at TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tokens_digest ON modification_tokens(digest);
        CREATE INDEX IF NOT EXISTS idx_tokens_booking ON modification_tokens(booking_id);",
    ),
];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
