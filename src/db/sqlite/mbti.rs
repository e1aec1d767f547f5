use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::db::{MbtiResultRecord, QuestionRecord};
use crate::mbti::{Dimension, ScoreTally};

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS mbti_question (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_text TEXT NOT NULL,
    option_a TEXT NOT NULL,
    option_b TEXT NOT NULL,
    dimension TEXT NOT NULL CHECK (dimension IN ('EI', 'SN', 'TF', 'JP'))
);
CREATE TABLE IF NOT EXISTS mbti_result (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
    mbti_type TEXT NOT NULL,
    e_score INTEGER NOT NULL,
    i_score INTEGER NOT NULL,
    s_score INTEGER NOT NULL,
    n_score INTEGER NOT NULL,
    t_score INTEGER NOT NULL,
    f_score INTEGER NOT NULL,
    j_score INTEGER NOT NULL,
    p_score INTEGER NOT NULL,
    create_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_mbti_result_user ON mbti_result(user_id);
"#;

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES)?;
    Ok(())
}

pub fn create_question(tx: &Transaction, question: QuestionRecord) -> Result<u64> {
    let sql = r#"
    INSERT INTO mbti_question (question_text, option_a, option_b, dimension)
    VALUES (?, ?, ?, ?)
    "#;
    tx.execute(
        sql,
        params![
            question.question_text,
            question.option_a,
            question.option_b,
            question.dimension.as_str(),
        ],
    )?;
    Ok(tx.last_insert_rowid() as u64)
}

pub fn list_questions(tx: &Transaction) -> Result<Vec<QuestionRecord>> {
    let sql = r#"
    SELECT id, question_text, option_a, option_b, dimension
    FROM mbti_question
    ORDER BY id
    "#;
    let mut stmt = tx.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        let id: u64 = row.get(0)?;
        let question_text: String = row.get(1)?;
        let option_a: String = row.get(2)?;
        let option_b: String = row.get(3)?;
        let dimension: String = row.get(4)?;
        Ok((id, question_text, option_a, option_b, dimension))
    })?;

    let mut questions = Vec::new();
    for row in rows {
        let (id, question_text, option_a, option_b, dimension) = row?;
        let dimension: Dimension = dimension
            .parse()
            .with_context(|| format!("parse dimension of question {id}"))?;
        questions.push(QuestionRecord {
            id,
            question_text,
            option_a,
            option_b,
            dimension,
        });
    }
    Ok(questions)
}

pub fn create_result(tx: &Transaction, result: MbtiResultRecord) -> Result<u64> {
    let sql = r#"
    INSERT INTO mbti_result (
        user_id, mbti_type,
        e_score, i_score, s_score, n_score, t_score, f_score, j_score, p_score,
        create_time
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    "#;
    debug!(
        "Database create_mbti_result: user {}, type {}",
        result.user_id, result.mbti_type
    );
    let s = &result.scores;
    tx.execute(
        sql,
        params![
            result.user_id,
            result.mbti_type,
            s.e,
            s.i,
            s.s,
            s.n,
            s.t,
            s.f,
            s.j,
            s.p,
            result.create_time,
        ],
    )?;
    Ok(tx.last_insert_rowid() as u64)
}

pub fn get_latest_result(tx: &Transaction, user_id: u64) -> Result<Option<MbtiResultRecord>> {
    let sql = r#"
    SELECT id, user_id, mbti_type,
        e_score, i_score, s_score, n_score, t_score, f_score, j_score, p_score,
        create_time
    FROM mbti_result
    WHERE user_id = ?
    ORDER BY id DESC
    LIMIT 1
    "#;
    let result = tx
        .query_row(sql, params![user_id], |row| {
            Ok(MbtiResultRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                mbti_type: row.get(2)?,
                scores: ScoreTally {
                    e: row.get(3)?,
                    i: row.get(4)?,
                    s: row.get(5)?,
                    n: row.get(6)?,
                    t: row.get(7)?,
                    f: row.get(8)?,
                    j: row.get(9)?,
                    p: row.get(10)?,
                },
                create_time: row.get(11)?,
            })
        })
        .optional()?;
    Ok(result)
}
