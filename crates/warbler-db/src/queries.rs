use crate::models::{MessageRow, UserRow};
use crate::{Database, DbError, DbResult};
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, Row};
use warbler_types::api::ProfileUpdate;
use warbler_types::models::{MessageId, ProfileStats, UserId};

const USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.password, u.image_url, u.header_image_url, u.bio, u.location, u.created_at";

const MESSAGE_COLUMNS: &str = "m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        image_url: Option<&str>,
    ) -> DbResult<UserId> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![username, email, password_hash, image_url],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user(&self, id: UserId) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1");
            conn.query_row(&sql, [id], user_from_row).optional()
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1");
            conn.query_row(&sql, [username], user_from_row).optional()
        })
    }

    pub fn user_exists(&self, id: UserId) -> DbResult<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?)
        })
    }

    /// All users, optionally filtered by a username substring.
    pub fn list_users(&self, search: Option<&str>) -> DbResult<Vec<UserRow>> {
        self.with_conn(|conn| match search {
            Some(term) => {
                let sql = format!(
                    "SELECT {USER_COLUMNS} FROM users u WHERE u.username LIKE ?1 ESCAPE '\\' ORDER BY u.username"
                );
                let pattern = format!("%{}%", escape_like(term));
                collect_users(conn, &sql, rusqlite::params![pattern])
            }
            None => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.username");
                collect_users(conn, &sql, rusqlite::params![])
            }
        })
    }

    /// Applies a profile update. Returns false if the user no longer exists.
    pub fn update_user(&self, id: UserId, update: &ProfileUpdate) -> DbResult<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users
                 SET username = ?2, email = ?3, image_url = ?4, header_image_url = ?5, bio = ?6, location = ?7
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    update.username,
                    update.email,
                    update.image_url,
                    update.header_image_url,
                    update.bio,
                    update.location,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Deletes a user; messages, follows and likes go with it through
    /// `ON DELETE CASCADE`. Returns how many messages were removed, or
    /// `None` if the user did not exist.
    pub fn delete_user(&self, id: UserId) -> DbResult<Option<usize>> {
        self.transaction(|tx| {
            let messages: i64 = tx.query_row(
                "SELECT COUNT(*) FROM messages WHERE user_id = ?1",
                [id],
                |row| row.get(0),
            )?;
            let deleted = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok((deleted > 0).then_some(messages as usize))
        })
    }

    pub fn profile_stats(&self, id: UserId) -> DbResult<ProfileStats> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE follower_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE followed_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [id],
                |row| {
                    Ok(ProfileStats {
                        messages: row.get::<_, i64>(0)? as usize,
                        following: row.get::<_, i64>(1)? as usize,
                        followers: row.get::<_, i64>(2)? as usize,
                        likes: row.get::<_, i64>(3)? as usize,
                    })
                },
            )?)
        })
    }

    // -- Messages --

    /// Inserts a message stamped with the current time and returns it joined
    /// with its author.
    pub fn insert_message(&self, text: &str, user_id: UserId) -> DbResult<MessageRow> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.transaction(|tx| {
            tx.execute(
                "INSERT INTO messages (text, timestamp, user_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![text, timestamp, user_id],
            )?;
            let id = tx.last_insert_rowid();
            query_message(tx, id)?.ok_or(DbError::MissingReference)
        })
    }

    pub fn get_message(&self, id: MessageId) -> DbResult<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    pub fn delete_message(&self, id: MessageId) -> DbResult<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM messages WHERE id = ?1", [id])? > 0))
    }

    pub fn messages_by_user(&self, user_id: UserId, limit: u32) -> DbResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m
                 JOIN users u ON m.user_id = u.id
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            );
            collect_messages(conn, &sql, rusqlite::params![user_id, limit])
        })
    }

    /// Messages by the user and by everyone they follow, newest first.
    pub fn timeline(&self, user_id: UserId, limit: u32) -> DbResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM messages m
                 JOIN users u ON m.user_id = u.id
                 WHERE m.user_id = ?1
                    OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1)
                 ORDER BY m.timestamp DESC, m.id DESC
                 LIMIT ?2"
            );
            collect_messages(conn, &sql, rusqlite::params![user_id, limit])
        })
    }

    // -- Follows --

    /// Returns true if a new edge was written.
    pub fn insert_follow(&self, follower_id: UserId, followed_id: UserId) -> DbResult<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followed_id) VALUES (?1, ?2)",
                [follower_id, followed_id],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn delete_follow(&self, follower_id: UserId, followed_id: UserId) -> DbResult<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                [follower_id, followed_id],
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn follow_exists(&self, follower_id: UserId, followed_id: UserId) -> DbResult<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followed_id = ?2)",
                [follower_id, followed_id],
                |row| row.get(0),
            )?)
        })
    }

    /// Users that `user_id` follows.
    pub fn following(&self, user_id: UserId) -> DbResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS}
                 FROM follows f
                 JOIN users u ON f.followed_id = u.id
                 WHERE f.follower_id = ?1
                 ORDER BY u.username"
            );
            collect_users(conn, &sql, [user_id])
        })
    }

    /// Users following `user_id`.
    pub fn followers(&self, user_id: UserId) -> DbResult<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS}
                 FROM follows f
                 JOIN users u ON f.follower_id = u.id
                 WHERE f.followed_id = ?1
                 ORDER BY u.username"
            );
            collect_users(conn, &sql, [user_id])
        })
    }

    // -- Likes --

    pub fn insert_like(&self, user_id: UserId, message_id: MessageId) -> DbResult<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?1, ?2)",
                [user_id, message_id],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn delete_like(&self, user_id: UserId, message_id: MessageId) -> DbResult<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                [user_id, message_id],
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn like_exists(&self, user_id: UserId, message_id: MessageId) -> DbResult<bool> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2)",
                [user_id, message_id],
                |row| row.get(0),
            )?)
        })
    }

    pub fn liked_messages(&self, user_id: UserId) -> DbResult<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS}
                 FROM likes l
                 JOIN messages m ON l.message_id = m.id
                 JOIN users u ON m.user_id = u.id
                 WHERE l.user_id = ?1
                 ORDER BY m.timestamp DESC, m.id DESC"
            );
            collect_messages(conn, &sql, [user_id])
        })
    }

    pub fn liked_message_ids(&self, user_id: UserId) -> DbResult<Vec<MessageId>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT message_id FROM likes WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        image_url: row.get(4)?,
        header_image_url: row.get(5)?,
        bio: row.get(6)?,
        location: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        username: row.get(4)?,
        user_image_url: row.get(5)?,
    })
}

fn collect_users<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> DbResult<Vec<UserRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn collect_messages<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> DbResult<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_message(conn: &Connection, id: MessageId) -> DbResult<Option<MessageRow>> {
    let sql = format!(
        "SELECT {MESSAGE_COLUMNS}
         FROM messages m
         JOIN users u ON m.user_id = u.id
         WHERE m.id = ?1"
    );
    conn.query_row(&sql, [id], message_from_row).optional()
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> DbResult<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> DbResult<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_users() -> (Database, UserId, UserId) {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("testuser", "test@test.com", "HASH", None).unwrap();
        let b = db
            .create_user("testuser2", "test2@test.com", "HASH_2", Some("img.png"))
            .unwrap();
        (db, a, b)
    }

    #[test]
    fn new_user_has_no_messages_or_followers() {
        let (db, a, _) = db_with_users();
        assert_eq!(db.profile_stats(a).unwrap(), ProfileStats::default());
        assert!(db.followers(a).unwrap().is_empty());
    }

    #[test]
    fn duplicate_username_is_classified() {
        let (db, _, _) = db_with_users();
        let err = db
            .create_user("testuser", "other@test.com", "HASH", None)
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate { ref column } if column == "username"));

        let err = db
            .create_user("other", "test@test.com", "HASH", None)
            .unwrap_err();
        assert!(matches!(err, DbError::Duplicate { ref column } if column == "email"));
    }

    #[test]
    fn message_for_unknown_user_is_missing_reference() {
        let (db, _, _) = db_with_users();
        let err = db.insert_message("test text", 40).unwrap_err();
        assert!(matches!(err, DbError::MissingReference));
    }

    #[test]
    fn follow_edges() {
        let (db, a, b) = db_with_users();
        assert!(!db.follow_exists(a, b).unwrap());

        assert!(db.insert_follow(a, b).unwrap());
        assert!(!db.insert_follow(a, b).unwrap()); // already there
        assert!(db.follow_exists(a, b).unwrap());
        assert!(!db.follow_exists(b, a).unwrap());

        let following: Vec<String> = db.following(a).unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(following, vec!["testuser2"]);
        let followers: Vec<String> = db.followers(b).unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(followers, vec!["testuser"]);

        assert!(db.delete_follow(a, b).unwrap());
        assert!(!db.delete_follow(a, b).unwrap());
        assert!(!db.follow_exists(a, b).unwrap());
    }

    #[test]
    fn like_edges() {
        let (db, a, b) = db_with_users();
        let msg = db.insert_message("Hello", b).unwrap();

        assert!(db.insert_like(a, msg.id).unwrap());
        assert!(!db.insert_like(a, msg.id).unwrap());
        assert_eq!(db.liked_message_ids(a).unwrap(), vec![msg.id]);
        assert_eq!(db.liked_messages(a).unwrap()[0].text, "Hello");

        assert!(db.delete_like(a, msg.id).unwrap());
        assert!(!db.like_exists(a, msg.id).unwrap());
    }

    #[test]
    fn timeline_includes_followed_users() {
        let (db, a, b) = db_with_users();
        db.insert_message("mine", a).unwrap();
        db.insert_message("theirs", b).unwrap();

        let texts = |rows: Vec<MessageRow>| rows.into_iter().map(|m| m.text).collect::<Vec<_>>();
        assert_eq!(texts(db.timeline(a, 100).unwrap()), vec!["mine"]);

        db.insert_follow(a, b).unwrap();
        assert_eq!(texts(db.timeline(a, 100).unwrap()), vec!["theirs", "mine"]);
    }

    #[test]
    fn delete_user_cascades() {
        let (db, a, b) = db_with_users();
        let msg = db.insert_message("bye", a).unwrap();
        db.insert_follow(b, a).unwrap();
        db.insert_like(b, msg.id).unwrap();

        assert_eq!(db.delete_user(a).unwrap(), Some(1));
        assert!(db.get_user(a).unwrap().is_none());
        assert!(db.get_message(msg.id).unwrap().is_none());
        assert!(db.following(b).unwrap().is_empty());
        assert!(db.liked_message_ids(b).unwrap().is_empty());

        assert_eq!(db.delete_user(a).unwrap(), None);
    }

    #[test]
    fn search_escapes_wildcards() {
        let (db, _, _) = db_with_users();
        db.create_user("under_score", "u@test.com", "HASH", None).unwrap();

        let names = |rows: Vec<UserRow>| rows.into_iter().map(|u| u.username).collect::<Vec<_>>();
        assert_eq!(names(db.list_users(Some("_")).unwrap()), vec!["under_score"]);
        assert_eq!(names(db.list_users(Some("user2")).unwrap()), vec!["testuser2"]);
        assert_eq!(db.list_users(None).unwrap().len(), 3);
    }
}
