use std::fs;
use std::io;
use std::sync::Arc;

use actix_web::web::{Data, Path};
use log::error;

use crate::avatar::AvatarStore;
use crate::server::context::ServerContext;
use crate::server::response::Response;

pub async fn get_avatar(name: Path<String>, sc: Data<Arc<ServerContext>>) -> Response<()> {
    let name = name.into_inner();
    let path = match sc.avatars.path(&name) {
        Some(path) => path,
        None => return Response::not_found("File not found"),
    };

    match fs::read(&path) {
        Ok(data) => Response::binary(AvatarStore::content_type(&name), data),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Response::not_found("File not found"),
        Err(e) => {
            error!("Failed to read avatar file {}: {e:#}", path.display());
            Response::error("read file failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::test::TestRequest;

    use crate::server::handlers::tests::assert_failed;

    use super::*;

    #[actix_web::test]
    async fn test_get_avatar() {
        let sc = Arc::new(ServerContext::new_test());
        let app = crate::test_app!(sc);

        for uri in [
            "/uploads/avatars/missing.png",
            "/uploads/avatars/..%2Fsecret",
            "/uploads/avatars/.hidden",
        ] {
            let (status, body) = crate::call_json!(app, TestRequest::get().uri(uri));
            assert_eq!(status, 404, "{uri}");
            assert_failed(&body, "File not found");
        }
    }
}
