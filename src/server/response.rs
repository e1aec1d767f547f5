use actix_web::body::BoxBody;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, Responder};
use serde::Serialize;

pub const DATABASE_ERROR: &str = "database error";
pub const TOKEN_ERROR: &str = "generate token failed";

/// JSON envelope shared by every route: `{"success": bool, "message"?: string}`
/// with the fields of `data` merged into the top level object.
#[derive(Debug, Serialize)]
pub struct Response<T: Serialize> {
    #[serde(skip)]
    pub code: StatusCode,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(flatten)]
    pub data: Option<T>,

    #[serde(skip)]
    pub binary: Option<(&'static str, Vec<u8>)>,
}

impl<T: Serialize> Response<T> {
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, None, Some(data))
    }

    pub fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, None, Some(data))
    }

    /// Successful response carrying only a message.
    pub fn message(message: impl ToString) -> Self {
        Self::new(StatusCode::OK, Some(message.to_string()), None)
    }

    pub fn bad_request(message: impl ToString) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(message.to_string()), None)
    }

    pub fn unauthorized(message: impl ToString) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, Some(message.to_string()), None)
    }

    pub fn not_found(message: impl ToString) -> Self {
        Self::new(StatusCode::NOT_FOUND, Some(message.to_string()), None)
    }

    /// 500 with the message prefixed by `Server error: `.
    pub fn error(message: impl AsRef<str>) -> Self {
        let message = format!("Server error: {}", message.as_ref());
        Self::internal_server_error(message)
    }

    pub fn internal_server_error(message: impl ToString) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(message.to_string()),
            None,
        )
    }

    pub fn binary(content_type: &'static str, data: Vec<u8>) -> Self {
        let mut resp = Self::new(StatusCode::OK, None, None);
        resp.binary = Some((content_type, data));
        resp
    }

    fn new(code: StatusCode, message: Option<String>, data: Option<T>) -> Self {
        Self {
            code,
            success: code.is_success(),
            message,
            data,
            binary: None,
        }
    }
}

impl<T: Serialize> From<Response<T>> for HttpResponse {
    fn from(mut resp: Response<T>) -> Self {
        if let Some((content_type, data)) = resp.binary.take() {
            return HttpResponse::Ok()
                .append_header((CONTENT_TYPE, content_type))
                .body(data);
        }
        HttpResponseBuilder::new(resp.code).json(resp)
    }
}

impl<T: Serialize> Responder for Response<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Serialize)]
    struct Data {
        token: String,
    }

    #[test]
    fn test_envelope() {
        let resp = Response::ok(Data {
            token: String::from("abc"),
        });
        assert_eq!(resp.code, StatusCode::OK);
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"success": true, "token": "abc"})
        );

        let resp = Response::<()>::message("Server is running");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"success": true, "message": "Server is running"})
        );

        let resp = Response::<()>::unauthorized("Not authorized");
        assert_eq!(resp.code, StatusCode::UNAUTHORIZED);
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"success": false, "message": "Not authorized"})
        );

        let resp = Response::<()>::error("boom");
        assert_eq!(resp.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.message.as_deref(), Some("Server error: boom"));

        let resp = Response::created(Data {
            token: String::from("abc"),
        });
        assert_eq!(resp.code, StatusCode::CREATED);
        assert!(resp.success);
    }

    #[test]
    fn test_binary() {
        let resp = Response::<()>::binary("image/png", vec![1, 2, 3]);
        let http: HttpResponse = resp.into();
        assert_eq!(http.status(), StatusCode::OK);
        assert_eq!(
            http.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap(),
            "image/png"
        );
    }
}
