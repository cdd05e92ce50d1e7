//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `users`, `settings` and `transactions`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,               -- Argon2 PHC string
    device_id     TEXT,
    is_admin      INTEGER NOT NULL DEFAULT 0   -- boolean 0/1
);

-- ----------------------------------------------------------------
-- Settings (exactly one row, id = 1)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS settings (
    id        INTEGER PRIMARY KEY CHECK (id = 1),
    latitude  REAL NOT NULL,
    longitude REAL NOT NULL,
    radius    INTEGER NOT NULL DEFAULT 0 CHECK (radius >= 0),   -- meters
    in_time   TEXT NOT NULL,                                    -- "HH:MM"
    out_time  TEXT NOT NULL,                                    -- "HH:MM"
    timezone  TEXT NOT NULL DEFAULT 'UTC'                       -- IANA name
);

-- ----------------------------------------------------------------
-- Transactions (append-only check-in / check-out log)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS transactions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER,                                  -- NULL once the user is deleted
    timestamp  TEXT NOT NULL,                            -- RFC-3339 UTC, fixed width
    photo      TEXT,                                     -- blob store reference
    device_id  TEXT,                                     -- reported by the stamping device
    stamp_type INTEGER NOT NULL CHECK (stamp_type IN (0, 1)),

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_user_id ON transactions(user_id);
CREATE INDEX IF NOT EXISTS idx_transactions_timestamp ON transactions(timestamp);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
