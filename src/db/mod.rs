mod sql;
mod sqlite;

pub mod config;

use std::sync::Mutex;

use anyhow::{bail, Result};
use sqlite::Sqlite;

use crate::mbti::{Dimension, ScoreTally};
use crate::types::user::{Identity, ProfilePatch};

/// Database transaction trait that defines all database operations
pub trait Transaction {
    // User operations
    /// Creates a new user, returns its id
    fn create_user(&self, params: CreateUserParams) -> Result<u64>;
    /// Checks whether the username or the email is already taken
    fn has_user_conflict(&self, username: &str, email: &str) -> Result<bool>;
    /// Retrieves a user by id without its password fields
    fn get_identity(&self, id: u64) -> Result<Option<Identity>>;
    fn get_password_by_name(&self, username: &str) -> Result<Option<UserPassword>>;
    fn get_password_by_id(&self, id: u64) -> Result<Option<UserPassword>>;
    /// Applies the present fields of the patch, returns false if the user doesn't exist
    fn update_profile(&self, id: u64, patch: &ProfilePatch, update_time: u64) -> Result<bool>;
    fn update_password(&self, id: u64, hash: &str, salt: &str, update_time: u64) -> Result<()>;
    /// Replaces the avatar and returns the previous one
    fn update_avatar(&self, id: u64, avatar: &str, update_time: u64) -> Result<Option<String>>;
    /// Returns false if the user doesn't exist
    fn update_mbti_type(&self, id: u64, mbti_type: &str, update_time: u64) -> Result<bool>;

    // Chat operations
    fn create_chat_message(&self, message: ChatMessageRecord) -> Result<ChatMessageRecord>;
    /// Lists messages of a user, newest first
    fn list_chat_messages(
        &self,
        user_id: u64,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ChatMessageRecord>>;

    // MBTI operations
    fn create_question(&self, question: QuestionRecord) -> Result<u64>;
    fn list_questions(&self) -> Result<Vec<QuestionRecord>>;
    fn create_mbti_result(&self, result: MbtiResultRecord) -> Result<u64>;
    fn get_latest_mbti_result(&self, user_id: u64) -> Result<Option<MbtiResultRecord>>;

    fn commit(self) -> Result<()>
    where
        Self: Sized;
    fn rollback(self) -> Result<()>
    where
        Self: Sized;
}

#[derive(Debug, Clone, Default)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub password: String,
    pub salt: String,
    pub avatar: String,
    pub create_time: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPassword {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub salt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessageRecord {
    pub id: u64,
    pub user_id: u64,
    pub content: String,
    pub is_user: bool,
    /// Unix milliseconds, unlike the other tables which store seconds.
    pub create_time: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub id: u64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub dimension: Dimension,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MbtiResultRecord {
    pub id: u64,
    pub user_id: u64,
    pub mbti_type: String,
    pub scores: ScoreTally,
    pub create_time: u64,
}

pub struct Database {
    conn: Mutex<Sqlite>,
}

impl Database {
    pub fn new(conn: Sqlite) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        Self::new(Sqlite::memory().unwrap())
    }

    /// Runs `f` inside a transaction. The transaction is committed when `f`
    /// returns `Ok` and rolled back otherwise.
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Transaction) -> Result<T>,
    {
        let mut conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(e) => bail!("failed to lock connection: {:#}", e),
        };
        let tx = conn.transaction()?;

        let result = f(&tx);

        if result.is_ok() {
            tx.commit()
        } else {
            tx.rollback()
        }?;

        result
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;

    #[test]
    fn test_rollback() {
        let db = Database::new_test();
        let result: Result<()> = db.with_transaction(|tx| {
            tx.create_user(CreateUserParams {
                username: String::from("none"),
                email: String::from("none@example.com"),
                password: String::from("hash"),
                salt: String::from("salt"),
                avatar: String::from("default_avatar.png"),
                create_time: 50,
            })?;
            bail!("rollback");
        });
        assert!(result.is_err());

        db.with_transaction(|tx| {
            assert!(!tx.has_user_conflict("none", "none@example.com")?);
            assert!(tx.get_password_by_name("none")?.is_none());
            Ok(())
        })
        .unwrap();
    }
}
