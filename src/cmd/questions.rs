use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::config::ConfigArgs;
use crate::db::QuestionRecord;
use crate::logs::{self, LogLevel};
use crate::mbti::Dimension;
use crate::types::mbti::NewQuestion;

use super::DbOnlyConfig;

/// Import MBTI questions from a JSON file.
///
/// The file holds an array of objects with `question_text`, `option_a`,
/// `option_b` and `dimension` (one of EI, SN, TF, JP). Either all questions
/// are imported or none.
#[derive(Args)]
pub struct ImportQuestionsArgs {
    /// Path of the question bank file.
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ImportQuestionsArgs {
    pub fn run(&self) -> Result<()> {
        let cfg: DbOnlyConfig = self.config.load("server")?;
        logs::init(LogLevel::Warn)?;

        let data = fs::read(&self.file)
            .with_context(|| format!("read question file {}", self.file.display()))?;
        let questions: Vec<NewQuestion> =
            serde_json::from_slice(&data).context("parse question file")?;
        let records = convert_questions(questions)?;

        let db = cfg.db.build()?;
        let count = records.len();
        db.with_transaction(|tx| {
            for record in records {
                tx.create_question(record)?;
            }
            Ok(())
        })?;

        println!("Imported {count} questions");
        Ok(())
    }
}

fn convert_questions(questions: Vec<NewQuestion>) -> Result<Vec<QuestionRecord>> {
    let mut records = Vec::with_capacity(questions.len());
    for (idx, q) in questions.into_iter().enumerate() {
        if q.question_text.trim().is_empty() {
            bail!("question #{idx}: question_text is required");
        }
        let dimension: Dimension = q
            .dimension
            .parse()
            .with_context(|| format!("question #{idx}"))?;
        records.push(QuestionRecord {
            id: 0,
            question_text: q.question_text,
            option_a: q.option_a,
            option_b: q.option_b,
            dimension,
        });
    }
    Ok(records)
}
