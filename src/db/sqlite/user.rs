use anyhow::Result;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};

use crate::db::sql::Update;
use crate::db::{CreateUserParams, UserPassword};
use crate::types::user::{Identity, ProfilePatch};

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    salt TEXT NOT NULL,
    avatar TEXT NOT NULL,
    mbti_type TEXT,
    age INTEGER,
    gender TEXT,
    grade TEXT,
    bio TEXT,
    create_time INTEGER NOT NULL,
    update_time INTEGER NOT NULL
);
"#;

const IDENTITY_FIELDS: &str = "id, username, email, avatar, mbti_type, age, gender, grade, bio";

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES)?;
    Ok(())
}

pub fn create_user(tx: &Transaction, params: CreateUserParams) -> Result<u64> {
    let sql = r#"
    INSERT INTO user (username, email, password, salt, avatar, create_time, update_time)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    "#;
    debug!("Database create_user: {}", params.username);
    tx.execute(
        sql,
        params![
            params.username,
            params.email,
            params.password,
            params.salt,
            params.avatar,
            params.create_time,
            params.create_time,
        ],
    )?;
    Ok(tx.last_insert_rowid() as u64)
}

pub fn has_user_conflict(tx: &Transaction, username: &str, email: &str) -> Result<bool> {
    let sql = "SELECT COUNT(1) FROM user WHERE username = ? OR email = ?";
    let count: i64 = tx.query_row(sql, params![username, email], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn get_identity(tx: &Transaction, id: u64) -> Result<Option<Identity>> {
    let sql = format!("SELECT {IDENTITY_FIELDS} FROM user WHERE id = ?");
    debug!("Database get_identity: {id}");
    let identity = tx
        .query_row(&sql, params![id], convert_identity)
        .optional()?;
    Ok(identity)
}

pub fn get_password_by_name(tx: &Transaction, username: &str) -> Result<Option<UserPassword>> {
    let sql = "SELECT id, username, password, salt FROM user WHERE username = ?";
    let up = tx
        .query_row(sql, params![username], convert_password)
        .optional()?;
    Ok(up)
}

pub fn get_password_by_id(tx: &Transaction, id: u64) -> Result<Option<UserPassword>> {
    let sql = "SELECT id, username, password, salt FROM user WHERE id = ?";
    let up = tx.query_row(sql, params![id], convert_password).optional()?;
    Ok(up)
}

pub fn update_profile(
    tx: &Transaction,
    id: u64,
    patch: &ProfilePatch,
    update_time: u64,
) -> Result<bool> {
    let mut update = Update::new("user");

    if let Some(age) = patch.age {
        update.add_field("age", age.map_or(Value::Null, |age| Value::Integer(age as i64)));
    }
    if let Some(ref gender) = patch.gender {
        update.add_field("gender", text_or_null(gender));
    }
    if let Some(ref grade) = patch.grade {
        update.add_field("grade", text_or_null(grade));
    }
    if let Some(ref bio) = patch.bio {
        update.add_field("bio", text_or_null(bio));
    }
    update.add_field("update_time", Value::Integer(update_time as i64));
    update.add_where("id = ?", Value::Integer(id as i64));

    let (sql, values) = update.build();
    debug!("Database update_profile: {sql}, {values:?}");
    let count = tx.execute(&sql, params_from_iter(values.iter()))?;
    Ok(count > 0)
}

fn text_or_null(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

pub fn update_password(
    tx: &Transaction,
    id: u64,
    hash: &str,
    salt: &str,
    update_time: u64,
) -> Result<()> {
    let sql = "UPDATE user SET password = ?, salt = ?, update_time = ? WHERE id = ?";
    debug!("Database update_password: {id}");
    tx.execute(sql, params![hash, salt, update_time, id])?;
    Ok(())
}

pub fn update_avatar(
    tx: &Transaction,
    id: u64,
    avatar: &str,
    update_time: u64,
) -> Result<Option<String>> {
    let old: Option<String> = tx
        .query_row("SELECT avatar FROM user WHERE id = ?", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    if old.is_none() {
        return Ok(None);
    }

    let sql = "UPDATE user SET avatar = ?, update_time = ? WHERE id = ?";
    debug!("Database update_avatar: {id}, {avatar}");
    tx.execute(sql, params![avatar, update_time, id])?;
    Ok(old)
}

pub fn update_mbti_type(tx: &Transaction, id: u64, mbti_type: &str, update_time: u64) -> Result<bool> {
    let sql = "UPDATE user SET mbti_type = ?, update_time = ? WHERE id = ?";
    debug!("Database update_mbti_type: {id}, {mbti_type}");
    let count = tx.execute(sql, params![mbti_type, update_time, id])?;
    Ok(count > 0)
}

fn convert_identity(row: &Row) -> rusqlite::Result<Identity> {
    Ok(Identity {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        avatar: row.get(3)?,
        mbti_type: row.get(4)?,
        age: row.get(5)?,
        gender: row.get(6)?,
        grade: row.get(7)?,
        bio: row.get(8)?,
    })
}

fn convert_password(row: &Row) -> rusqlite::Result<UserPassword> {
    Ok(UserPassword {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        salt: row.get(3)?,
    })
}
