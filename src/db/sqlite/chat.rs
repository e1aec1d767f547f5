use anyhow::Result;
use log::debug;
use rusqlite::{params, Connection, Row, Transaction};

use crate::db::ChatMessageRecord;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS chat_message (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    is_user INTEGER NOT NULL,
    create_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chat_message_user ON chat_message(user_id, create_time);
"#;

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES)?;
    Ok(())
}

pub fn create_message(tx: &Transaction, mut message: ChatMessageRecord) -> Result<ChatMessageRecord> {
    let sql = r#"
    INSERT INTO chat_message (user_id, content, is_user, create_time)
    VALUES (?, ?, ?, ?)
    "#;
    debug!(
        "Database create_chat_message: user {}, is_user {}",
        message.user_id, message.is_user
    );
    tx.execute(
        sql,
        params![
            message.user_id,
            message.content,
            message.is_user,
            message.create_time
        ],
    )?;
    message.id = tx.last_insert_rowid() as u64;
    Ok(message)
}

pub fn list_messages(
    tx: &Transaction,
    user_id: u64,
    limit: u64,
    offset: u64,
) -> Result<Vec<ChatMessageRecord>> {
    let sql = r#"
    SELECT id, user_id, content, is_user, create_time
    FROM chat_message
    WHERE user_id = ?
    ORDER BY create_time DESC, id DESC
    LIMIT ? OFFSET ?
    "#;
    debug!("Database list_chat_messages: user {user_id}, limit {limit}, offset {offset}");
    let mut stmt = tx.prepare(sql)?;
    let rows = stmt.query_map(params![user_id, limit, offset], convert_message)?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(row?);
    }
    Ok(messages)
}

fn convert_message(row: &Row) -> rusqlite::Result<ChatMessageRecord> {
    Ok(ChatMessageRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        is_user: row.get(3)?,
        create_time: row.get(4)?,
    })
}
