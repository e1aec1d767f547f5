mod chat;
mod mbti;
mod user;

use std::path::Path;

use anyhow::Result;
use rusqlite::Connection as RawConnection;
use rusqlite::Transaction as RawTransaction;

use crate::types::user::{Identity, ProfilePatch};

use super::{
    ChatMessageRecord, CreateUserParams, MbtiResultRecord, QuestionRecord, Transaction,
    UserPassword,
};

/// SQLite-based storage. Supports both file-based and in-memory databases.
pub struct Sqlite {
    conn: RawConnection,
}

pub struct SqliteTransaction<'a> {
    tx: RawTransaction<'a>,
}

impl Sqlite {
    /// Opens a SQLite database file, creating it and all tables if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = RawConnection::open(path)?;
        Self::init_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Creates a new in-memory database, recommended for testing only.
    pub fn memory() -> Result<Self> {
        let conn = RawConnection::open_in_memory()?;
        Self::init_tables(&conn)?;
        Ok(Self { conn })
    }

    pub fn transaction(&mut self) -> Result<SqliteTransaction<'_>> {
        let tx = self.conn.transaction()?;
        Ok(SqliteTransaction { tx })
    }

    fn init_tables(conn: &RawConnection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        user::create_tables(conn)?;
        chat::create_tables(conn)?;
        mbti::create_tables(conn)?;
        Ok(())
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn create_user(&self, params: CreateUserParams) -> Result<u64> {
        user::create_user(&self.tx, params)
    }

    fn has_user_conflict(&self, username: &str, email: &str) -> Result<bool> {
        user::has_user_conflict(&self.tx, username, email)
    }

    fn get_identity(&self, id: u64) -> Result<Option<Identity>> {
        user::get_identity(&self.tx, id)
    }

    fn get_password_by_name(&self, username: &str) -> Result<Option<UserPassword>> {
        user::get_password_by_name(&self.tx, username)
    }

    fn get_password_by_id(&self, id: u64) -> Result<Option<UserPassword>> {
        user::get_password_by_id(&self.tx, id)
    }

    fn update_profile(&self, id: u64, patch: &ProfilePatch, update_time: u64) -> Result<bool> {
        user::update_profile(&self.tx, id, patch, update_time)
    }

    fn update_password(&self, id: u64, hash: &str, salt: &str, update_time: u64) -> Result<()> {
        user::update_password(&self.tx, id, hash, salt, update_time)
    }

    fn update_avatar(&self, id: u64, avatar: &str, update_time: u64) -> Result<Option<String>> {
        user::update_avatar(&self.tx, id, avatar, update_time)
    }

    fn update_mbti_type(&self, id: u64, mbti_type: &str, update_time: u64) -> Result<bool> {
        user::update_mbti_type(&self.tx, id, mbti_type, update_time)
    }

    fn create_chat_message(&self, message: ChatMessageRecord) -> Result<ChatMessageRecord> {
        chat::create_message(&self.tx, message)
    }

    fn list_chat_messages(
        &self,
        user_id: u64,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ChatMessageRecord>> {
        chat::list_messages(&self.tx, user_id, limit, offset)
    }

    fn create_question(&self, question: QuestionRecord) -> Result<u64> {
        mbti::create_question(&self.tx, question)
    }

    fn list_questions(&self) -> Result<Vec<QuestionRecord>> {
        mbti::list_questions(&self.tx)
    }

    fn create_mbti_result(&self, result: MbtiResultRecord) -> Result<u64> {
        mbti::create_result(&self.tx, result)
    }

    fn get_latest_mbti_result(&self, user_id: u64) -> Result<Option<MbtiResultRecord>> {
        mbti::get_latest_result(&self.tx, user_id)
    }

    fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::db::Database;

    use super::*;

    pub fn create_test_user(db: &Database, username: &str) -> u64 {
        db.with_transaction(|tx| {
            tx.create_user(CreateUserParams {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password: format!("{username}_hash"),
                salt: format!("{username}_salt"),
                avatar: String::from("default_avatar.png"),
                create_time: 100,
            })
        })
        .unwrap()
    }

    #[test]
    fn test_file() {
        let path = std::env::temp_dir().join("test_mindcare_sqlite.db");
        let _ = fs::remove_file(&path);

        let db = Database::new(Sqlite::open(&path).unwrap());
        let id = create_test_user(&db, "alice");
        drop(db);

        // reopen, tables must not be recreated
        let db = Database::new(Sqlite::open(&path).unwrap());
        let identity = db
            .with_transaction(|tx| tx.get_identity(id))
            .unwrap()
            .unwrap();
        assert_eq!(identity.username, "alice");

        fs::remove_file(&path).unwrap();
    }
}
