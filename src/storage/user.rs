//! User storage: registration, lookup by id or email, listing, deletion.

use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use crate::model::{Role, User};

use super::{Result, Storage, StorageError, parse_timestamp, parse_uuid};

const USER_COLUMNS: &str =
    "id, name, surname, second_surname, email, password_digest, role, created_at";

/// Raw column values in `USER_COLUMNS` order.
type UserRow = (
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    String,
    String,
);

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn user_from_row(raw: UserRow) -> Result<User> {
    let (id, name, surname, second_surname, email, password_digest, role, created_at) = raw;
    Ok(User {
        id: parse_uuid("user id", &id)?,
        name,
        surname,
        second_surname,
        email,
        password_digest,
        role: parse_role(&role)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

fn parse_role(value: &str) -> Result<Role> {
    match value {
        "admin" => Ok(Role::Admin),
        "driver" => Ok(Role::Driver),
        other => Err(StorageError::Corrupt(format!("unknown role: {other}"))),
    }
}

impl Storage {
    /// Registers a new user. Emails are unique.
    pub fn create_user(&self, user: &User) -> Result<()> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM user WHERE email = ?1",
                [&user.email],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StorageError::EmailTaken(user.email.clone()));
        }
        self.conn.execute(
            "INSERT INTO user (id, name, surname, second_surname, email, password_digest, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id.to_string(),
                &user.name,
                &user.surname,
                &user.second_surname,
                &user.email,
                &user.password_digest,
                user.role.as_str(),
                user.created_at.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Loads a single user by id.
    pub fn load_user(&self, id: Uuid) -> Result<User> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM user WHERE id = ?1"),
                [id.to_string()],
                read_user,
            )
            .optional()?
            .ok_or(StorageError::UserNotFound(id))?;
        user_from_row(raw)
    }

    /// Finds a user by login email.
    pub fn find_user_by_email(&self, email: &str) -> Result<User> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM user WHERE email = ?1"),
                [email],
                read_user,
            )
            .optional()?
            .ok_or_else(|| StorageError::EmailNotFound(email.to_string()))?;
        user_from_row(raw)
    }

    /// Lists all users, oldest first.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM user"))?;
        let rows = stmt.query_map([], read_user)?;
        let mut users = Vec::new();
        for raw in rows {
            users.push(user_from_row(raw?)?);
        }
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    /// Deletes a user.
    pub fn delete_user(&self, id: Uuid) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM user WHERE id = ?1", [id.to_string()])?;
        if rows == 0 {
            return Err(StorageError::UserNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("fleet")).unwrap();
        (dir, storage)
    }

    fn sample_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Rosa".into(),
            surname: "Mendoza".into(),
            second_surname: Some("Ortiz".into()),
            email: email.into(),
            password_digest: "salt$digest".into(),
            role: Role::Driver,
            created_at: Timestamp::now(),
        }
    }

    #[test]
    fn create_and_load_user() {
        let (_dir, storage) = test_storage();
        let user = sample_user("rosa@example.com");

        storage.create_user(&user).unwrap();
        let loaded = storage.load_user(user.id).unwrap();

        assert_eq!(loaded.id, user.id);
        assert_eq!(loaded.email, "rosa@example.com");
        assert_eq!(loaded.role, Role::Driver);
        assert_eq!(loaded.second_surname.as_deref(), Some("Ortiz"));
    }

    #[test]
    fn duplicate_email_fails() {
        let (_dir, storage) = test_storage();
        storage.create_user(&sample_user("rosa@example.com")).unwrap();
        let err = storage
            .create_user(&sample_user("rosa@example.com"))
            .unwrap_err();
        assert!(matches!(err, StorageError::EmailTaken(_)));
    }

    #[test]
    fn find_by_email() {
        let (_dir, storage) = test_storage();
        let user = sample_user("rosa@example.com");
        storage.create_user(&user).unwrap();

        let found = storage.find_user_by_email("rosa@example.com").unwrap();
        assert_eq!(found.id, user.id);

        let err = storage.find_user_by_email("nadie@example.com").unwrap_err();
        assert!(matches!(err, StorageError::EmailNotFound(_)));
    }

    #[test]
    fn delete_user_removes_the_row() {
        let (_dir, storage) = test_storage();
        let user = sample_user("rosa@example.com");
        storage.create_user(&user).unwrap();

        storage.delete_user(user.id).unwrap();
        let err = storage.load_user(user.id).unwrap_err();
        assert!(matches!(err, StorageError::UserNotFound(_)));
    }

    #[test]
    fn delete_nonexistent_user_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.delete_user(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StorageError::UserNotFound(_)));
    }

    #[test]
    fn list_users_oldest_first() {
        let (_dir, storage) = test_storage();
        let mut first = sample_user("a@example.com");
        first.created_at = Timestamp::new(1_000_000_000, 0).unwrap();
        let mut second = sample_user("b@example.com");
        second.created_at = Timestamp::new(2_000_000_000, 0).unwrap();

        // Create in reverse order to verify sorting.
        storage.create_user(&second).unwrap();
        storage.create_user(&first).unwrap();

        let users = storage.list_users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "a@example.com");
        assert_eq!(users[1].email, "b@example.com");
    }
}
