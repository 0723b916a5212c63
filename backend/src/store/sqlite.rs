use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use deep_thoughts_common::{FriendSummary, IdentityClaim, Reaction, Thought, User};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use super::{validation, StoreError};
use crate::auth::{hash_password, verify_password};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS thoughts (
        id TEXT PRIMARY KEY,
        thought_text TEXT NOT NULL,
        username TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS reactions (
        id TEXT PRIMARY KEY,
        thought_id TEXT NOT NULL,
        reaction_body TEXT NOT NULL,
        username TEXT NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY (thought_id) REFERENCES thoughts(id)
    );
    CREATE TABLE IF NOT EXISTS friendships (
        user_id TEXT NOT NULL,
        friend_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (user_id, friend_id),
        FOREIGN KEY (user_id) REFERENCES users(id),
        FOREIGN KEY (friend_id) REFERENCES users(id)
    );
    CREATE INDEX IF NOT EXISTS idx_thoughts_username ON thoughts(username);
    CREATE INDEX IF NOT EXISTS idx_thoughts_created_at ON thoughts(created_at);
    CREATE INDEX IF NOT EXISTS idx_reactions_thought_id ON reactions(thought_id);
";

/// Row counts reported by `/metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub users: i64,
    pub thoughts: i64,
}

/// SQLite-backed store for the social graph.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database. Accepts a bare path, a `sqlite:`
    /// prefixed path or `:memory:`.
    pub fn open(database_url: &str) -> Result<Self, StoreError> {
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
            Connection::open(path)?
        };

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!("Store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    pub fn counts(&self) -> Result<Counts, StoreError> {
        let conn = self.lock()?;
        let users = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let thoughts = conn.query_row("SELECT COUNT(*) FROM thoughts", [], |row| row.get(0))?;
        Ok(Counts { users, thoughts })
    }

    /// Register a new user. Username and email must both be unused.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, StoreError> {
        let username = validation::username(username)?;
        let email = validation::email(email)?;
        validation::password(password)?;

        // Hash before taking the lock; Argon2 is deliberately slow.
        let password_hash = hash_password(password)?;
        let id = uuid::Uuid::new_v4().to_string();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, username, email, password_hash, now_timestamp()],
        )
        .map_err(|e| match duplicate_field(&e) {
            Some(field) => StoreError::Duplicate(field.to_string()),
            None => StoreError::from(e),
        })?;

        tracing::info!("Created new user: {} ({})", username, email);

        load_user(&conn, &id)?.ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    /// Look up a user by email and check the password. Unknown email and
    /// wrong password produce the same error.
    pub fn authenticate_user(&self, email: &str, password: &str) -> Result<User, StoreError> {
        let row: Option<(String, String)> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT id, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
        };

        let Some((id, password_hash)) = row else {
            return Err(StoreError::InvalidCredentials);
        };
        if !verify_password(password, &password_hash) {
            return Err(StoreError::InvalidCredentials);
        }

        let conn = self.lock()?;
        load_user(&conn, &id)?.ok_or(StoreError::InvalidCredentials)
    }

    pub fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        load_user(&conn, id)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => load_user(&conn, &id),
            None => Ok(None),
        }
    }

    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id, username, email FROM users ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, username, email)| assemble_user(&conn, id, username, email))
            .collect()
    }

    /// Thoughts newest first, optionally restricted to one author.
    pub fn thoughts(&self, username: Option<&str>) -> Result<Vec<Thought>, StoreError> {
        let conn = self.lock()?;
        load_thoughts(&conn, username)
    }

    pub fn thought(&self, id: &str) -> Result<Option<Thought>, StoreError> {
        let conn = self.lock()?;
        load_thought(&conn, id)
    }

    pub fn add_thought(&self, author: &IdentityClaim, text: &str) -> Result<Thought, StoreError> {
        let text = validation::text("Thought", text)?;
        let id = uuid::Uuid::new_v4().to_string();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO thoughts (id, thought_text, username, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, text, author.username, now_timestamp()],
        )?;

        tracing::debug!("Added thought {} by {}", id, author.username);

        load_thought(&conn, &id)?.ok_or_else(|| StoreError::NotFound(format!("thought {}", id)))
    }

    pub fn add_reaction(
        &self,
        author: &IdentityClaim,
        thought_id: &str,
        body: &str,
    ) -> Result<Thought, StoreError> {
        let body = validation::text("Reaction", body)?;

        let conn = self.lock()?;
        if !exists(&conn, "SELECT 1 FROM thoughts WHERE id = ?1", thought_id)? {
            return Err(StoreError::NotFound(format!("thought {}", thought_id)));
        }

        conn.execute(
            "INSERT INTO reactions (id, thought_id, reaction_body, username, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                uuid::Uuid::new_v4().to_string(),
                thought_id,
                body,
                author.username,
                now_timestamp(),
            ],
        )?;

        load_thought(&conn, thought_id)?
            .ok_or_else(|| StoreError::NotFound(format!("thought {}", thought_id)))
    }

    /// Add `friend_id` to the user's friends. Adding an existing friend is a
    /// no-op.
    pub fn add_friend(&self, user: &IdentityClaim, friend_id: &str) -> Result<User, StoreError> {
        let conn = self.lock()?;
        if !exists(&conn, "SELECT 1 FROM users WHERE id = ?1", &user.id)? {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        if !exists(&conn, "SELECT 1 FROM users WHERE id = ?1", friend_id)? {
            return Err(StoreError::NotFound(format!("user {}", friend_id)));
        }

        conn.execute(
            "INSERT OR IGNORE INTO friendships (user_id, friend_id, created_at) VALUES (?1, ?2, ?3)",
            params![user.id, friend_id, now_timestamp()],
        )?;

        load_user(&conn, &user.id)?.ok_or_else(|| StoreError::NotFound(format!("user {}", user.id)))
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Which unique column a failed insert collided with.
fn duplicate_field(err: &rusqlite::Error) -> Option<&'static str> {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) if e.code == ErrorCode::ConstraintViolation => {
            if msg.contains("users.username") {
                Some("username")
            } else if msg.contains("users.email") {
                Some("email")
            } else {
                None
            }
        }
        _ => None,
    }
}

fn exists(conn: &Connection, sql: &str, id: &str) -> Result<bool, StoreError> {
    let found: Option<i64> = conn.query_row(sql, params![id], |row| row.get(0)).optional()?;
    Ok(found.is_some())
}

fn load_user(conn: &Connection, id: &str) -> Result<Option<User>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, username, email FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, username, email)| assemble_user(conn, id, username, email))
        .transpose()
}

fn assemble_user(
    conn: &Connection,
    id: String,
    username: String,
    email: String,
) -> Result<User, StoreError> {
    let friends = load_friends(conn, &id)?;
    let thoughts = load_thoughts(conn, Some(&username))?;

    Ok(User {
        friend_count: friends.len(),
        id,
        username,
        email,
        thoughts,
        friends,
    })
}

fn load_friends(conn: &Connection, user_id: &str) -> Result<Vec<FriendSummary>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username, u.email
         FROM friendships f JOIN users u ON u.id = f.friend_id
         WHERE f.user_id = ?1
         ORDER BY f.rowid",
    )?;
    let friends = stmt
        .query_map(params![user_id], |row| {
            Ok(FriendSummary {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(friends)
}

fn load_thoughts(conn: &Connection, username: Option<&str>) -> Result<Vec<Thought>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, thought_text, created_at, username FROM thoughts
         WHERE (?1 IS NULL OR username = ?1)
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map(params![username], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, thought_text, created_at, username)| {
            build_thought(conn, id, thought_text, created_at, username)
        })
        .collect()
}

fn load_thought(conn: &Connection, id: &str) -> Result<Option<Thought>, StoreError> {
    let row = conn
        .query_row(
            "SELECT id, thought_text, created_at, username FROM thoughts WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, thought_text, created_at, username)| {
        build_thought(conn, id, thought_text, created_at, username)
    })
    .transpose()
}

fn build_thought(
    conn: &Connection,
    id: String,
    thought_text: String,
    created_at: String,
    username: String,
) -> Result<Thought, StoreError> {
    let reactions = load_reactions(conn, &id)?;
    Ok(Thought {
        reaction_count: reactions.len(),
        id,
        thought_text,
        created_at,
        username,
        reactions,
    })
}

fn load_reactions(conn: &Connection, thought_id: &str) -> Result<Vec<Reaction>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, reaction_body, created_at, username FROM reactions
         WHERE thought_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let reactions = stmt
        .query_map(params![thought_id], |row| {
            Ok(Reaction {
                id: row.get(0)?,
                reaction_body: row.get(1)?,
                created_at: row.get(2)?,
                username: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::open(":memory:").unwrap()
    }

    fn claim_for(user: &User) -> IdentityClaim {
        user.claim()
    }

    #[test]
    fn test_create_user_returns_public_record() {
        let store = store();
        let user = store.create_user(" alice ", "a@x.com", "password").unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.friend_count, 0);
        assert!(user.thoughts.is_empty());
    }

    #[test]
    fn test_duplicate_username_is_rejected() {
        let store = store();
        store.create_user("alice", "a@x.com", "password").unwrap();
        let err = store.create_user("alice", "other@x.com", "password").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref f) if f == "username"));
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let store = store();
        store.create_user("alice", "a@x.com", "password").unwrap();
        let err = store.create_user("bob", "a@x.com", "password").unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref f) if f == "email"));
    }

    #[test]
    fn test_create_user_validates_input() {
        let store = store();
        assert!(matches!(
            store.create_user("alice", "not-an-email", "password"),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.create_user("alice", "a@x.com", "1234"),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_authenticate_user() {
        let store = store();
        let created = store.create_user("alice", "a@x.com", "password").unwrap();

        let user = store.authenticate_user("a@x.com", "password").unwrap();
        assert_eq!(user.id, created.id);

        assert!(matches!(
            store.authenticate_user("a@x.com", "wrong-password"),
            Err(StoreError::InvalidCredentials)
        ));
        assert!(matches!(
            store.authenticate_user("nobody@x.com", "password"),
            Err(StoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_thoughts_are_newest_first_and_filterable() {
        let store = store();
        let alice = store.create_user("alice", "a@x.com", "password").unwrap();
        let bob = store.create_user("bob", "b@x.com", "password").unwrap();

        store.add_thought(&claim_for(&alice), "first").unwrap();
        store.add_thought(&claim_for(&bob), "second").unwrap();
        store.add_thought(&claim_for(&alice), "third").unwrap();

        let all: Vec<String> = store
            .thoughts(None)
            .unwrap()
            .into_iter()
            .map(|t| t.thought_text)
            .collect();
        assert_eq!(all, vec!["third", "second", "first"]);

        let alices = store.thoughts(Some("alice")).unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|t| t.username == "alice"));
    }

    #[test]
    fn test_add_thought_rejects_empty_text() {
        let store = store();
        let alice = store.create_user("alice", "a@x.com", "password").unwrap();
        assert!(matches!(
            store.add_thought(&claim_for(&alice), ""),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_add_reaction() {
        let store = store();
        let alice = store.create_user("alice", "a@x.com", "password").unwrap();
        let bob = store.create_user("bob", "b@x.com", "password").unwrap();
        let thought = store.add_thought(&claim_for(&alice), "hello").unwrap();

        let updated = store
            .add_reaction(&claim_for(&bob), &thought.id, "nice")
            .unwrap();
        assert_eq!(updated.reaction_count, 1);
        assert_eq!(updated.reactions[0].username, "bob");
        assert_eq!(updated.reactions[0].reaction_body, "nice");
    }

    #[test]
    fn test_add_reaction_to_missing_thought() {
        let store = store();
        let alice = store.create_user("alice", "a@x.com", "password").unwrap();
        assert!(matches!(
            store.add_reaction(&claim_for(&alice), "missing", "nice"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_friend_is_idempotent() {
        let store = store();
        let alice = store.create_user("alice", "a@x.com", "password").unwrap();
        let bob = store.create_user("bob", "b@x.com", "password").unwrap();

        let once = store.add_friend(&claim_for(&alice), &bob.id).unwrap();
        let twice = store.add_friend(&claim_for(&alice), &bob.id).unwrap();

        assert_eq!(once.friend_count, 1);
        assert_eq!(twice.friend_count, 1);
        assert_eq!(twice.friends[0].username, "bob");
    }

    #[test]
    fn test_add_unknown_friend() {
        let store = store();
        let alice = store.create_user("alice", "a@x.com", "password").unwrap();
        assert!(matches!(
            store.add_friend(&claim_for(&alice), "missing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_user_lookup() {
        let store = store();
        let alice = store.create_user("alice", "a@x.com", "password").unwrap();
        store.add_thought(&claim_for(&alice), "hello").unwrap();

        let by_name = store.user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, alice.id);
        assert_eq!(by_name.thoughts.len(), 1);

        assert!(store.user_by_username("nobody").unwrap().is_none());
        assert!(store.user_by_id("missing").unwrap().is_none());
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_counts() {
        let store = store();
        assert_eq!(store.counts().unwrap(), Counts { users: 0, thoughts: 0 });

        let alice = store.create_user("alice", "a@x.com", "password").unwrap();
        store.add_thought(&claim_for(&alice), "hello").unwrap();
        assert_eq!(store.counts().unwrap(), Counts { users: 1, thoughts: 1 });
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("thoughts.db");
        let url = format!("sqlite:{}", path.display());

        {
            let store = Store::open(&url).unwrap();
            store.create_user("alice", "a@x.com", "password").unwrap();
        }

        let reopened = Store::open(&url).unwrap();
        assert!(reopened.user_by_username("alice").unwrap().is_some());
    }
}
