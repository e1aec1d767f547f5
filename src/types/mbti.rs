use serde::{Deserialize, Serialize};

use crate::db::{MbtiResultRecord, QuestionRecord};
use crate::mbti::{Answer, Dimension, MbtiError, ScoreTally};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub dimension: Dimension,
}

impl From<QuestionRecord> for Question {
    fn from(record: QuestionRecord) -> Self {
        Self {
            id: record.id,
            question_text: record.question_text,
            option_a: record.option_a,
            option_b: record.option_b,
            dimension: record.dimension,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
}

/// Entry of a question bank file, see the `import-questions` command.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestion {
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub dimension: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

/// Raw answer as sent by clients. Tags are kept as strings so that unknown
/// values can be reported with a proper message.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub dimension: String,
    pub choice: String,
}

impl SubmitRequest {
    pub fn parse_answers(&self) -> Result<Vec<Answer>, MbtiError> {
        self.answers
            .iter()
            .map(|a| Answer::parse(&a.dimension, &a.choice))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MbtiResult {
    pub mbti_type: String,
    pub scores: ScoreTally,
}

impl From<MbtiResultRecord> for MbtiResult {
    fn from(record: MbtiResultRecord) -> Self {
        Self {
            mbti_type: record.mbti_type,
            scores: record.scores,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    #[serde(rename = "hasResult")]
    pub has_result: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<MbtiResult>,
}
