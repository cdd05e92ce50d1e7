//! CRUD operations for [`User`] records.

use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::{not_found, unique_violation, Result, StoreError};
use crate::models::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, username, password_hash, device_id, is_admin";

impl Database {
    /// Insert a user and return the stored row.
    ///
    /// Fails with [`StoreError::Duplicate`] when the username is taken.
    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        self.conn()
            .execute(
                "INSERT INTO users (username, password_hash, device_id, is_admin)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.username,
                    user.password_hash,
                    user.device_id,
                    user.is_admin as i32,
                ],
            )
            .map_err(|e| unique_violation(e, "Username"))?;

        self.get_user(self.conn().last_insert_rowid())
    }

    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Exact, case-sensitive username lookup.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))?;
        let rows = stmt.query_map([], row_to_user)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    pub fn count_users(&self) -> Result<i64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Apply the provided fields in a single statement and return the row.
    pub fn update_user(&self, id: i64, changes: &UserChanges) -> Result<User> {
        let affected = self
            .conn()
            .execute(
                "UPDATE users SET
                    username      = COALESCE(?1, username),
                    password_hash = COALESCE(?2, password_hash),
                    device_id     = COALESCE(?3, device_id)
                 WHERE id = ?4",
                params![
                    changes.username,
                    changes.password_hash,
                    changes.device_id,
                    id
                ],
            )
            .map_err(|e| unique_violation(e, "Username"))?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_user(id)
    }

    // transactions keep their rows; user_id becomes NULL (ON DELETE SET NULL)
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let is_admin_int: i32 = row.get(4)?;

    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        device_id: row.get(3)?,
        is_admin: is_admin_int != 0,
    })
}
