use actix_multipart::Multipart;
use actix_web::error::PayloadError;
use actix_web::http::header;
use actix_web::web::{Bytes, BytesMut, Query};
use actix_web::HttpRequest;
use anyhow::{anyhow, bail, Context, Result};
use futures_util::{stream, StreamExt};
use log::debug;
use serde::de::DeserializeOwned;

/// Decodes the JSON body of a request, returning 400 from the enclosing
/// handler when it is missing or malformed.
#[macro_export]
macro_rules! parse_json {
    ($req:expr, $body:expr) => {
        match $crate::server::request::parse_json_raw(&$req, $body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return $crate::server::response::Response::bad_request(format!(
                    "Invalid request: {e:#}"
                ))
            }
        }
    };
}

/// Same as [`parse_json!`] for the query string.
#[macro_export]
macro_rules! parse_query {
    ($req:expr) => {
        match $crate::server::request::parse_query_raw(&$req) {
            Ok(parsed) => parsed,
            Err(e) => {
                return $crate::server::response::Response::bad_request(format!(
                    "Invalid request: {e:#}"
                ))
            }
        }
    };
}

/// An empty body is read as `{}`. `None` means the payload could not be
/// read at all, usually because it exceeds the size limit.
pub fn parse_json_raw<T>(req: &HttpRequest, body: Option<Bytes>) -> Result<T>
where
    T: DeserializeOwned,
{
    debug!(
        "- {} {}, peer: {:?}, with_body: {:?}",
        req.method(),
        req.path(),
        req.peer_addr(),
        body.as_ref().map(|b| b.len())
    );

    let body = match body {
        Some(body) => body,
        None => bail!("request body is unreadable or too large"),
    };
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_str("{}").context("decode empty body");
    }

    serde_json::from_slice(&body).context("decode json body")
}

pub fn parse_query_raw<T>(req: &HttpRequest) -> Result<T>
where
    T: DeserializeOwned,
{
    debug!(
        "- {} {}, query: {:?}, peer: {:?}",
        req.method(),
        req.path(),
        req.query_string(),
        req.peer_addr()
    );
    let query = Query::<T>::from_query(req.query_string()).context("decode query")?;
    Ok(query.into_inner())
}

/// A file sent to an upload route.
#[derive(Debug)]
pub struct Upload {
    /// Mime type declared for the file, without parameters.
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Extracts the uploaded file from a request body. For `multipart/form-data`
/// this is the part named `field`, `None` when there is no such part. Any
/// other body is the file itself, typed by the request's `Content-Type`.
pub async fn read_upload(req: &HttpRequest, body: Bytes, field: &str) -> Result<Option<Upload>> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase());
    let is_multipart = content_type
        .as_deref()
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    if !is_multipart {
        let content_type = content_type
            .as_deref()
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_string());
        return Ok(Some(Upload {
            content_type,
            data: body,
        }));
    }

    let body = stream::once(async move { Ok::<_, PayloadError>(body) });
    let mut multipart = Multipart::new(req.headers(), body);
    while let Some(part) = multipart.next().await {
        let mut part = part.map_err(|e| anyhow!("read multipart body: {e}"))?;
        let matched = part.name() == Some(field);
        let part_type = part.content_type().map(|m| m.essence_str().to_string());

        let mut data = BytesMut::new();
        while let Some(chunk) = part.next().await {
            let chunk = chunk.map_err(|e| anyhow!("read multipart field: {e}"))?;
            if matched {
                data.extend_from_slice(&chunk);
            }
        }
        if matched {
            debug!("Read upload field '{field}', {} bytes", data.len());
            return Ok(Some(Upload {
                content_type: part_type,
                data: data.freeze(),
            }));
        }
    }
    Ok(None)
}
