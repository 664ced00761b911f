//! Object serving
//!
//! Every URL the API hands out points here. Only the public buckets are
//! served; key validation in the store rejects traversal.

use crate::app::AppState;
use crate::config::{LOGOS_BUCKET, PREVIEWS_BUCKET};
use crate::error::{AppError, Result};
use actix_web::{http::header, web, HttpResponse};

pub fn configure_storage_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/storage/{bucket}/{path:.*}", web::get().to(get_object));
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

async fn get_object(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (bucket, key) = path.into_inner();
    if bucket != LOGOS_BUCKET && bucket != PREVIEWS_BUCKET {
        return Err(AppError::NotFound(format!("bucket {}", bucket)));
    }

    let data = state.store.get(&bucket, &key).await?;
    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&key))
        .insert_header((header::CACHE_CONTROL, "public, max-age=60"))
        .body(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("u1/a.png"), "image/png");
        assert_eq!(content_type_for("u1/a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("u1/noext"), "application/octet-stream");
    }
}
