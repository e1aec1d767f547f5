use std::sync::Arc;

use actix_web::web::{Bytes, Data};
use actix_web::HttpRequest;
use log::{debug, error, info};
use serde::Serialize;

use crate::db::MbtiResultRecord;
use crate::mbti::{self, MbtiType, ScoreTally};
use crate::server::context::ServerContext;
use crate::server::response::{self, Response};
use crate::time::now_secs;
use crate::types::mbti::{QuestionsResponse, ResultResponse, SubmitRequest};

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub mbti_type: MbtiType,
    pub scores: ScoreTally,
}

pub async fn get_questions(req: HttpRequest, sc: Data<Arc<ServerContext>>) -> Response<QuestionsResponse> {
    let op = crate::auth_request!(sc, req);

    match sc.db.with_transaction(|tx| tx.list_questions()) {
        Ok(records) => {
            debug!("Found {} mbti questions for user {}", records.len(), op.id);
            Response::ok(QuestionsResponse {
                questions: records.into_iter().map(Into::into).collect(),
            })
        }
        Err(e) => {
            error!("Failed to list mbti questions: {e:#}");
            Response::error(response::DATABASE_ERROR)
        }
    }
}

pub async fn submit(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> Response<SubmitResponse> {
    let op = crate::auth_request!(sc, req);
    let submit: SubmitRequest = crate::parse_json!(req, body);

    let answers = match submit.parse_answers() {
        Ok(answers) => answers,
        Err(e) => return Response::bad_request(format!("Invalid answer: {e}")),
    };
    let (scores, mbti_type) = mbti::score(&answers);
    info!(
        "User {} submitted {} answers, type {mbti_type}",
        op.id,
        answers.len()
    );

    let now = now_secs();
    let result = sc.db.with_transaction(|tx| {
        tx.create_mbti_result(MbtiResultRecord {
            id: 0,
            user_id: op.id,
            mbti_type: mbti_type.to_string(),
            scores,
            create_time: now,
        })
    });
    if let Err(e) = result {
        error!("Failed to save mbti result of user {}: {e:#}", op.id);
        return Response::error(response::DATABASE_ERROR);
    }

    // the result row stays even if this second write fails
    let result = sc
        .db
        .with_transaction(|tx| tx.update_mbti_type(op.id, &mbti_type.to_string(), now));
    match result {
        Ok(true) => {}
        Ok(false) => error!("User {} not found when updating mbti type", op.id),
        Err(e) => {
            error!("Failed to update mbti type of user {}: {e:#}", op.id);
            return Response::error(response::DATABASE_ERROR);
        }
    }

    Response::ok(SubmitResponse { mbti_type, scores })
}

pub async fn get_result(req: HttpRequest, sc: Data<Arc<ServerContext>>) -> Response<ResultResponse> {
    let op = crate::auth_request!(sc, req);

    match sc.db.with_transaction(|tx| tx.get_latest_mbti_result(op.id)) {
        Ok(result) => Response::ok(ResultResponse {
            has_result: result.is_some(),
            result: result.map(Into::into),
        }),
        Err(e) => {
            error!("Failed to get mbti result of user {}: {e:#}", op.id);
            Response::error(response::DATABASE_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::header;
    use actix_web::test::TestRequest;
    use serde_json::json;

    use crate::db::QuestionRecord;
    use crate::mbti::Dimension;
    use crate::server::handlers::tests::{assert_failed, register_user};

    use super::*;

    #[actix_web::test]
    async fn test_questions() {
        let sc = Arc::new(ServerContext::new_test());
        let app = crate::test_app!(sc);
        let (_, alice) = register_user(&sc, "alice", "secret123");

        let req = TestRequest::get()
            .uri("/api/mbti/questions")
            .insert_header((header::AUTHORIZATION, alice.as_str()));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 200);
        assert_eq!(body, json!({"success": true, "questions": []}));

        let id = sc
            .db
            .with_transaction(|tx| {
                tx.create_question(QuestionRecord {
                    id: 0,
                    question_text: String::from("At a party you"),
                    option_a: String::from("talk to many people"),
                    option_b: String::from("stay with friends"),
                    dimension: Dimension::EI,
                })
            })
            .unwrap();

        let req = TestRequest::get()
            .uri("/api/mbti/questions")
            .insert_header((header::AUTHORIZATION, alice.as_str()));
        let (_, body) = crate::call_json!(app, req);
        assert_eq!(
            body["questions"],
            json!([{
                "id": id,
                "question_text": "At a party you",
                "option_a": "talk to many people",
                "option_b": "stay with friends",
                "dimension": "EI",
            }])
        );
    }

    #[actix_web::test]
    async fn test_submit() {
        let sc = Arc::new(ServerContext::new_test());
        let app = crate::test_app!(sc);
        let (id, alice) = register_user(&sc, "alice", "secret123");

        let req = TestRequest::get()
            .uri("/api/mbti/result")
            .insert_header((header::AUTHORIZATION, alice.as_str()));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 200);
        assert_eq!(body, json!({"success": true, "hasResult": false}));

        let req = TestRequest::post()
            .uri("/api/mbti/submit")
            .insert_header((header::AUTHORIZATION, alice.as_str()))
            .set_json(json!({"answers": [
                {"dimension": "EI", "choice": "A"},
                {"dimension": "SN", "choice": "B"},
                {"dimension": "TF", "choice": "A"},
                {"dimension": "JP", "choice": "B"},
            ]}));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 200);
        let scores = json!({"E": 1, "I": 0, "S": 0, "N": 1, "T": 1, "F": 0, "J": 0, "P": 1});
        assert_eq!(
            body,
            json!({"success": true, "mbti_type": "ENTP", "scores": scores})
        );

        let identity = sc
            .db
            .with_transaction(|tx| tx.get_identity(id))
            .unwrap()
            .unwrap();
        assert_eq!(identity.mbti_type.as_deref(), Some("ENTP"));

        // empty submission is valid and ties go to the second letter
        let req = TestRequest::post()
            .uri("/api/mbti/submit")
            .insert_header((header::AUTHORIZATION, alice.as_str()))
            .set_json(json!({"answers": []}));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 200);
        assert_eq!(body["mbti_type"], "INFP");

        let req = TestRequest::get()
            .uri("/api/mbti/result")
            .insert_header((header::AUTHORIZATION, alice.as_str()));
        let (_, body) = crate::call_json!(app, req);
        assert_eq!(body["hasResult"], true);
        assert_eq!(body["result"]["mbti_type"], "INFP");

        let req = TestRequest::get()
            .uri("/api/profile")
            .insert_header((header::AUTHORIZATION, alice.as_str()));
        let (_, body) = crate::call_json!(app, req);
        assert_eq!(body["user"]["mbti_type"], "INFP");
    }

    #[actix_web::test]
    async fn test_submit_invalid() {
        let sc = Arc::new(ServerContext::new_test());
        let app = crate::test_app!(sc);
        let (id, alice) = register_user(&sc, "alice", "secret123");

        let cases = [
            (
                json!({"answers": [{"dimension": "XY", "choice": "A"}]}),
                "Invalid answer: unknown dimension 'XY', expect one of EI, SN, TF, JP",
            ),
            (
                json!({"answers": [{"dimension": "EI", "choice": "C"}]}),
                "Invalid answer: unknown choice 'C', expect A or B",
            ),
        ];
        for (payload, message) in cases {
            let req = TestRequest::post()
                .uri("/api/mbti/submit")
                .insert_header((header::AUTHORIZATION, alice.as_str()))
                .set_json(payload);
            let (status, body) = crate::call_json!(app, req);
            assert_eq!(status, 400);
            assert_failed(&body, message);
        }

        let req = TestRequest::post()
            .uri("/api/mbti/submit")
            .insert_header((header::AUTHORIZATION, alice.as_str()))
            .set_json(json!({"answers": [{"dimension": "EI"}]}));
        let (status, _) = crate::call_json!(app, req);
        assert_eq!(status, 400);

        // nothing was recorded
        let result = sc
            .db
            .with_transaction(|tx| tx.get_latest_mbti_result(id))
            .unwrap();
        assert!(result.is_none());

        let req = TestRequest::post()
            .uri("/api/mbti/submit")
            .set_json(json!({"answers": []}));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 401);
        assert_failed(&body, "Not authorized, no token");
    }
}
