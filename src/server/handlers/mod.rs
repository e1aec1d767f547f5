mod account;
mod chat;
mod healthz;
mod mbti;
mod news;
mod profile;
mod uploads;

use actix_web::{web, HttpRequest};

use super::response::Response;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(healthz::get_root))
        .service(
            web::scope("/api/auth")
                .route("/test", web::get().to(healthz::get_auth_test))
                .route("/register", web::post().to(account::register))
                .route("/login", web::post().to(account::login)),
        )
        .service(
            web::scope("/api/chat")
                .route("/history", web::get().to(chat::get_history))
                .route("/send", web::post().to(chat::send_message)),
        )
        .service(
            web::scope("/api/profile")
                .route("", web::get().to(profile::get_profile))
                .route("/", web::get().to(profile::get_profile))
                .route("", web::put().to(profile::put_profile))
                .route("/", web::put().to(profile::put_profile))
                .route("/avatar", web::post().to(profile::post_avatar))
                .route("/password", web::put().to(profile::put_password)),
        )
        .service(
            web::scope("/api/mbti")
                .route("/questions", web::get().to(mbti::get_questions))
                .route("/submit", web::post().to(mbti::submit))
                .route("/result", web::get().to(mbti::get_result)),
        )
        .service(web::scope("/api/psychology").route("/news", web::get().to(news::get_news)))
        .route(
            "/uploads/avatars/{name}",
            web::get().to(uploads::get_avatar),
        );
}

pub async fn default_handler(req: HttpRequest) -> Response<()> {
    let message = format!("No route to {} {}", req.method(), req.uri().path());
    Response::not_found(message)
}

#[cfg(test)]
pub mod tests {
    use serde_json::{json, Value};

    use crate::server::context::ServerContext;

    /// Builds the full application around a test context.
    #[macro_export]
    macro_rules! test_app {
        ($sc:expr) => {
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data(actix_web::web::Data::new($sc.clone()))
                    .app_data(actix_web::web::PayloadConfig::new(2 * 1024 * 1024))
                    .configure($crate::server::handlers::configure)
                    .default_service(
                        actix_web::web::route().to($crate::server::handlers::default_handler),
                    ),
            )
            .await
        };
    }

    /// Sends a request and returns the status with the decoded JSON body.
    #[macro_export]
    macro_rules! call_json {
        ($app:expr, $req:expr) => {{
            let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
            let status = resp.status().as_u16();
            let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
            (status, body)
        }};
    }

    /// Creates an account directly in the database and returns its id with a
    /// valid bearer header value.
    pub fn register_user(sc: &ServerContext, username: &str, password: &str) -> (u64, String) {
        let req = crate::types::user::RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: password.to_string(),
        };
        let id = crate::account::create_account(&sc.db, &req, 100)
            .unwrap()
            .unwrap();
        let token = sc
            .jwt_generator
            .generate_token(id, crate::time::now_secs())
            .unwrap();
        (id, format!("Bearer {token}"))
    }

    pub fn assert_failed(body: &Value, message: &str) {
        assert_eq!(body, &json!({"success": false, "message": message}));
    }

    #[actix_web::test]
    async fn test_default_handler() {
        let sc = std::sync::Arc::new(ServerContext::new_test());
        let app = crate::test_app!(sc);

        let req = actix_web::test::TestRequest::get().uri("/api/unknown");
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 404);
        assert_failed(&body, "No route to GET /api/unknown");

        let req = actix_web::test::TestRequest::delete().uri("/api/chat/unknown");
        let (status, body) = crate::call_json!(app, req);
        assert_eq!(status, 404);
        assert_failed(&body, "No route to DELETE /api/chat/unknown");
    }
}
