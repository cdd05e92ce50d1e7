//! The append-only transaction log and its filtered read.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter};

use attendance_shared::StampType;

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::models::{NewTransaction, Transaction, TransactionFilter};

const TRANSACTION_COLUMNS: &str = "id, user_id, timestamp, photo, device_id, stamp_type";

/// Fixed-width RFC-3339 so that lexical order in SQLite equals time order.
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl TransactionFilter {
    /// Render the filter as a `WHERE` clause (empty when unconstrained) and
    /// its positional parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(user_id) = self.user_id {
            clauses.push("user_id = ?");
            values.push(Value::Integer(user_id));
        }
        if let Some(stamp_type) = self.stamp_type {
            clauses.push("stamp_type = ?");
            values.push(Value::Integer(stamp_type.code()));
        }
        if let Some(from) = &self.from {
            clauses.push("timestamp >= ?");
            values.push(Value::Text(encode_timestamp(from)));
        }
        if let Some(to) = &self.to {
            clauses.push("timestamp <= ?");
            values.push(Value::Text(encode_timestamp(to)));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

impl Database {
    /// Append a stamp timestamped now.
    ///
    /// Fails with [`StoreError::NotFound`] when `user_id` names no user.
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        self.insert_transaction_at(tx, Utc::now())
    }

    pub(crate) fn insert_transaction_at(
        &self,
        tx: &NewTransaction,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction> {
        // Explicit check so an unknown user is NotFound rather than a FK error.
        self.get_user(tx.user_id)?;

        self.conn().execute(
            "INSERT INTO transactions (user_id, timestamp, photo, device_id, stamp_type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tx.user_id,
                encode_timestamp(&timestamp),
                tx.photo,
                tx.device_id,
                tx.stamp_type.code(),
            ],
        )?;

        self.get_transaction(self.conn().last_insert_rowid())
    }

    pub fn get_transaction(&self, id: i64) -> Result<Transaction> {
        self.conn()
            .query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                params![id],
                row_to_transaction,
            )
            .map_err(not_found)
    }

    /// Every transaction matching all supplied predicates, ascending by id.
    pub fn query_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let (where_clause, values) = filter.to_sql();
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions{where_clause} ORDER BY id ASC"
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), row_to_transaction)?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(row?);
        }
        Ok(transactions)
    }

    #[cfg(test)]
    pub(crate) fn count_transactions(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let ts_str: String = row.get(2)?;
    let stamp_code: i64 = row.get(5)?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let stamp_type = StampType::from_code(stamp_code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Integer,
            Box::new(StoreError::Corrupt(format!("stamp_type {stamp_code}"))),
        )
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp,
        photo: row.get(3)?,
        device_id: row.get(4)?,
        stamp_type,
    })
}
