use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::adapters::http::error::{AppError, AppResult};
use crate::adapters::http::state::HttpState;
use crate::application::dto::{ArticleCreatedResponse, DetectResponse};
use crate::domain::{article::StoredArticle, errors::DomainError, upload::UploadedImage};

pub const NO_IMAGE: &str = "No image provided";
pub const ARTICLE_IMAGE_REQUIRED: &str = "Gambar harus diupload";
pub const ARTICLE_DATA_MISSING: &str = "Data artikel tidak ditemukan";

/// Campos de interés de un formulario multipart.
#[derive(Default)]
struct UploadForm {
    image: Option<UploadedImage>,
    data: Option<String>,
}

async fn read_form(multipart: Result<Multipart, MultipartRejection>) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();
    // Ni siquiera es multipart: se trata como un formulario sin campos.
    let Ok(mut multipart) = multipart else { return Ok(form) };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !bytes.is_empty() {
                    form.image = Some(UploadedImage { file_name, content_type, bytes: bytes.to_vec() });
                }
            }
            Some("data") => {
                let text = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !text.trim().is_empty() {
                    form.data = Some(text);
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

/// POST /detect
pub async fn detect(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<DetectResponse>> {
    let form = read_form(multipart).await?;
    let image = form.image.ok_or_else(|| AppError::BadRequest(NO_IMAGE.into()))?;
    let report = st.detection.detect(image).await?;
    Ok(Json(report.into()))
}

/// POST /articles
pub async fn create_article(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ArticleCreatedResponse>)> {
    let form = read_form(multipart).await?;
    let image = form.image.ok_or_else(|| AppError::BadRequest(ARTICLE_IMAGE_REQUIRED.into()))?;
    let data = form.data.ok_or_else(|| AppError::BadRequest(ARTICLE_DATA_MISSING.into()))?;
    let stored = st.articles.create(image, &data).await?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// GET /articles
pub async fn list_articles(State(st): State<HttpState>) -> AppResult<Json<Vec<StoredArticle>>> {
    let articles = st
        .articles
        .list()
        .await
        .map_err(|e| AppError::Internal(format!("Error retrieving articles: {e}")))?;
    Ok(Json(articles))
}

/// GET /articles/:id
pub async fn get_article(
    State(st): State<HttpState>,
    Path(id): Path<String>,
) -> AppResult<Json<StoredArticle>> {
    match st.articles.get(&id).await {
        Ok(article) => Ok(Json(article)),
        Err(e @ DomainError::NotFound(_)) => Err(e.into()),
        Err(e) => Err(AppError::Internal(format!("Error retrieving article: {e}"))),
    }
}
