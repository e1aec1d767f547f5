use crate::server::response::Response;

pub async fn get_root() -> Response<()> {
    Response::message("Server is running")
}

pub async fn get_auth_test() -> Response<()> {
    Response::message("Auth routes are working")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::test::TestRequest;
    use serde_json::json;

    use crate::server::context::ServerContext;

    #[actix_web::test]
    async fn test_healthz() {
        let sc = Arc::new(ServerContext::new_test());
        let app = crate::test_app!(sc);

        let (status, body) = crate::call_json!(app, TestRequest::get().uri("/"));
        assert_eq!(status, 200);
        assert_eq!(body, json!({"success": true, "message": "Server is running"}));

        let (status, body) = crate::call_json!(app, TestRequest::get().uri("/api/auth/test"));
        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({"success": true, "message": "Auth routes are working"})
        );
    }
}
