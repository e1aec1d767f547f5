use std::sync::Arc;

use actix_web::web::{Bytes, Data};
use actix_web::HttpRequest;
use log::{debug, error};

use crate::db::ChatMessageRecord;
use crate::server::context::ServerContext;
use crate::server::response::{self, Response};
use crate::time::now_millis;
use crate::types::chat::{
    HistoryQuery, MessagesResponse, SendMessageRequest, HISTORY_PAGE_SIZE, SIMULATED_REPLY,
};

pub async fn get_history(req: HttpRequest, sc: Data<Arc<ServerContext>>) -> Response<MessagesResponse> {
    let op = crate::auth_request!(sc, req);
    let query: HistoryQuery = crate::parse_query!(req);

    debug!("Get chat history of user {}, page {}", op.id, query.page());
    let result = sc
        .db
        .with_transaction(|tx| tx.list_chat_messages(op.id, HISTORY_PAGE_SIZE, query.offset()));

    match result {
        Ok(records) => Response::ok(MessagesResponse {
            messages: records.into_iter().map(Into::into).collect(),
        }),
        Err(e) => {
            error!("Failed to list chat messages of user {}: {e:#}", op.id);
            Response::error(response::DATABASE_ERROR)
        }
    }
}

pub async fn send_message(
    req: HttpRequest,
    body: Option<Bytes>,
    sc: Data<Arc<ServerContext>>,
) -> Response<MessagesResponse> {
    let op = crate::auth_request!(sc, req);
    let send: SendMessageRequest = crate::parse_json!(req, body);

    let content = send.content.trim();
    if content.is_empty() {
        return Response::bad_request("Message content is required");
    }

    let now = now_millis();
    let result = sc.db.with_transaction(|tx| {
        let question = tx.create_chat_message(ChatMessageRecord {
            id: 0,
            user_id: op.id,
            content: content.to_string(),
            is_user: true,
            create_time: now,
        })?;
        let reply = tx.create_chat_message(ChatMessageRecord {
            id: 0,
            user_id: op.id,
            content: String::from(SIMULATED_REPLY),
            is_user: false,
            create_time: now,
        })?;
        Ok(vec![question, reply])
    });

    match result {
        Ok(records) => Response::ok(MessagesResponse {
            messages: records.into_iter().map(Into::into).collect(),
        }),
        Err(e) => {
            error!("Failed to save chat message of user {}: {e:#}", op.id);
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

    use crate::server::handlers::tests::{assert_failed, register_user};

    use super::*;

    #[actix_web::test]
    async fn test_chat() {
        let sc = Arc::new(ServerContext::new_test());
        let app = crate::test_app!(sc);
        let (_, alice) = register_user(&sc, "alice", "secret123");
        let (_, bob) = register_user(&sc, "bob", "secret123");

        let req = TestRequest::post()
            .uri("/api/chat/send")
            .insert_header((header::AUTHORIZATION, alice.as_str()))
            .set_json(json!({"content": "  I feel tired  "}));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "I feel tired");
        assert_eq!(messages[0]["isUser"], 1);
        assert_eq!(messages[1]["content"], SIMULATED_REPLY);
        assert_eq!(messages[1]["isUser"], 0);
        let timestamp = messages[0]["timestamp"].as_str().unwrap();
        let sent = chrono::DateTime::parse_from_rfc3339(timestamp).unwrap();
        let elapsed = crate::time::now_millis() as i64 - sent.timestamp_millis();
        assert!((0..60_000).contains(&elapsed), "{timestamp}");

        for content in [json!({"content": "   "}), json!({"content": ""}), json!({})] {
            let req = TestRequest::post()
                .uri("/api/chat/send")
                .insert_header((header::AUTHORIZATION, alice.as_str()))
                .set_json(content);
            let (status, body) = crate::call_json!(app, req);
            assert_eq!(status, 400);
            assert_failed(&body, "Message content is required");
        }

        for i in 0..5 {
            let req = TestRequest::post()
                .uri("/api/chat/send")
                .insert_header((header::AUTHORIZATION, alice.as_str()))
                .set_json(json!({"content": format!("message {i}")}));
            let (status, _) = crate::call_json!(app, req);
            assert_eq!(status, 200);
        }

        // 12 messages in total, newest first
        let req = TestRequest::get()
            .uri("/api/chat/history")
            .insert_header((header::AUTHORIZATION, alice.as_str()));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 200);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 10);
        assert_eq!(messages[0]["content"], SIMULATED_REPLY);
        assert_eq!(messages[1]["content"], "message 4");

        for uri in ["/api/chat/history?page=2", "/api/chat/history?page=2&extra=1"] {
            let req = TestRequest::get()
                .uri(uri)
                .insert_header((header::AUTHORIZATION, alice.as_str()));
            let (_, body) = crate::call_json!(app, req);
            let messages = body["messages"].as_array().unwrap();
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[1]["content"], "I feel tired");
        }

        // far past the end is empty, not a database error
        for page in ["922337203685477581", "18446744073709551615"] {
            let req = TestRequest::get()
                .uri(&format!("/api/chat/history?page={page}"))
                .insert_header((header::AUTHORIZATION, alice.as_str()));
            let (status, body) = crate::call_json!(app, req);
            assert_eq!(status, 200, "{page}");
            assert_eq!(body, json!({"success": true, "messages": []}));
        }

        for uri in ["/api/chat/history?page=abc", "/api/chat/history?page=0"] {
            let req = TestRequest::get()
                .uri(uri)
                .insert_header((header::AUTHORIZATION, alice.as_str()));
            let (_, body) = crate::call_json!(app, req);
            assert_eq!(body["messages"].as_array().unwrap().len(), 10);
        }

        let req = TestRequest::get()
            .uri("/api/chat/history")
            .insert_header((header::AUTHORIZATION, bob.as_str()));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 200);
        assert_eq!(body, json!({"success": true, "messages": []}));
    }

    #[actix_web::test]
    async fn test_unauthorized() {
        let sc = Arc::new(ServerContext::new_test());
        let app = crate::test_app!(sc);

        let req = TestRequest::get().uri("/api/chat/history");
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 401);
        assert_failed(&body, "Not authorized, no token");

        for auth in ["Bearer bad.token.here", "Basic abc", "Bearer"] {
            let req = TestRequest::post()
                .uri("/api/chat/send")
                .insert_header((header::AUTHORIZATION, auth))
                .set_json(json!({"content": "hi"}));
            let (status, body) = crate::call_json!(app, req);
            assert_eq!(status, 401);
            assert_failed(&body, "Not authorized");
        }

        let token = sc
            .jwt_generator
            .generate_token(404, crate::time::now_secs())
            .unwrap();
        let req = TestRequest::get()
            .uri("/api/chat/history")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")));
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 401);
        assert_failed(&body, "Not authorized");
    }
}
