//! HTTP surface. Every failure is answered with `{"error": "..."}`.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError, web};
use log::error;
use serde::Deserialize;
use serde_json::json;

use crate::app_state::AppState;
use crate::error::RelayError;
use crate::fb2;
use crate::ranobe::RanobeSource;

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        if self.http_status() >= 500 {
            error!("{}", self);
        }
        HttpResponse::build(ResponseError::status_code(self)).json(json!({ "error": self.to_string() }))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SlugPath {
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct ChapterPath {
    pub slug: String,
    pub chapter_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CacheWrite {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct ChapterUrl {
    pub url: String,
}

fn json_text(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::json()).body(body)
}

async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Pong!" }))
}

async fn search(data: web::Data<AppState>, query: web::Query<SearchQuery>) -> Result<HttpResponse, RelayError> {
    Ok(json_text(data.senkuro.search_json(&query.text).await?))
}

async fn title(data: web::Data<AppState>, path: web::Path<SlugPath>) -> Result<HttpResponse, RelayError> {
    Ok(json_text(data.senkuro.title_json(&path.slug).await?))
}

async fn chapters(data: web::Data<AppState>, path: web::Path<SlugPath>) -> Result<HttpResponse, RelayError> {
    let chapters = data.senkuro.chapters(&path.slug).await?;
    Ok(HttpResponse::Ok().json(chapters))
}

async fn images(data: web::Data<AppState>, path: web::Path<ChapterPath>) -> Result<HttpResponse, RelayError> {
    Ok(json_text(data.senkuro.images_json(&path.slug, &path.chapter_id).await?))
}

async fn get_cache_value(data: web::Data<AppState>, key: web::Path<String>) -> HttpResponse {
    let key = key.into_inner();
    match data.cache.get(&key).await {
        Some(value) => HttpResponse::Ok().json(json!({ "key": key, "value": value })),
        None => HttpResponse::Ok().json(json!({ "key": key, "message": "Key not found" })),
    }
}

async fn set_cache_value(data: web::Data<AppState>, path: web::Path<CacheWrite>) -> HttpResponse {
    let CacheWrite { key, value } = path.into_inner();
    data.cache.set(&key, value.clone()).await;
    HttpResponse::Ok().json(json!({ "key": key, "value": value, "message": "Value set successfully" }))
}

async fn ranobe_fb2(
    data: web::Data<AppState>,
    source: web::Path<String>,
    query: web::Query<ChapterUrl>,
) -> Result<HttpResponse, RelayError> {
    let source: RanobeSource = source.parse()?;
    let document = data.ranobe.download(source, &query.url).await?;
    Ok(HttpResponse::Ok().content_type(fb2::CONTENT_TYPE).body(document))
}

/// Register every route. Specific Senkuro paths come before the catch-all
/// title aliases so they win the match.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default()
            .error_handler(|err, _| RelayError::BadRequest(err.to_string()).into()))
        .app_data(web::PathConfig::default()
            .error_handler(|err, _| RelayError::BadRequest(err.to_string()).into()))
        .route("/ping", web::get().to(ping))
        .route("/cache/{key}", web::get().to(get_cache_value))
        .route("/cache/{key}/{value}", web::post().to(set_cache_value))
        .route("/api/ranobe/{source}/fb2", web::get().to(ranobe_fb2))
        .route("/api/manga/senkuro/search", web::get().to(search))
        .route("/api/manga/senkuro/search/", web::get().to(search))
        .route("/api/manga/senkuro/chapters/{slug}", web::get().to(chapters))
        .route("/api/manga/senkuro/images/{slug}/{chapter_id}", web::get().to(images))
        .route("/api/manga/senkuro/title/{slug}", web::get().to(title))
        .route("/api/manga/senkuro/title/{slug}/{any}", web::get().to(title))
        .route("/api/manga/senkuro/{slug}/{chapter_id}", web::get().to(images))
        .route("/api/manga/{slug}", web::get().to(title))
        .route("/api/manga/{slug}/{any}", web::get().to(title))
        .route("/search", web::get().to(search))
        .route("/title/{slug}", web::get().to(title))
        .route("/chapters/{slug}", web::get().to(chapters))
        .route("/images/{slug}/{chapter_id}", web::get().to(images))
        .route("/manga/{slug}", web::get().to(title))
        .route("/manga/{slug}/{any}", web::get().to(title));
}
