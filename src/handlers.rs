use crate::auth::AdminToken;
use crate::errors::AppError;
use crate::media::{Upload, content_type_for, local_url};
use crate::models::{
    AuthStatus, ClickTally, DeleteRequest, DeleteResponse, LoginRequest, SiteRecord,
    SuccessResponse, UpdateSiteRequest, UploadResponse, ViewsQuery, ViewsResponse,
};
use crate::session::session_cookie;
use crate::state::AppState;
use crate::ui::{render_admin, render_index, render_login};
use axum::{
    Form, Json,
    extract::{FromRequestParts, Multipart, Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Local;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{error, info, warn};

pub const LOGIN_PAGE: &str = "/admin/login.html";
pub const ADMIN_PAGE: &str = "/admin/upload.html";

/// Extractor for routes that need a logged-in admin. Anyone else is sent to
/// the login page before the request body is even looked at.
pub struct Admin(pub AdminToken);

#[axum::async_trait]
impl FromRequestParts<AppState> for Admin {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match session_cookie(&parts.headers) {
            Some(cookie) if state.sessions.is_active(&cookie).await => Ok(Admin(AdminToken::issue())),
            _ => Err(Redirect::to(LOGIN_PAGE)),
        }
    }
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let record = state.store.read().await;
    Html(render_index(&record, &state.carousel))
}

pub async fn login_page() -> Html<String> {
    Html(render_login())
}

pub async fn admin_page(Admin(_): Admin, State(state): State<AppState>) -> Html<String> {
    let record = state.store.read().await;
    Html(render_admin(&record))
}

pub async fn check_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (StatusCode, Json<AuthStatus>) {
    let logged_in = match session_cookie(&headers) {
        Some(cookie) => state.sessions.is_active(&cookie).await,
        None => false,
    };
    let status = if logged_in {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(AuthStatus { logged_in }))
}

pub async fn get_site_data(State(state): State<AppState>) -> Json<SiteRecord> {
    Json(state.store.read().await)
}

pub async fn update_site_data(
    Admin(token): Admin,
    State(state): State<AppState>,
    Json(payload): Json<UpdateSiteRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .store
        .write(&token, payload.tagline, payload.links)
        .await?;
    info!("site data updated");
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn get_images(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.store.images().await)
}

pub async fn upload_image(
    Admin(token): Admin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, Response> {
    let upload = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|err| upload_failure(StatusCode::BAD_REQUEST, err.to_string()))?;
        let Some(field) = field else {
            return Err(upload_failure(StatusCode::BAD_REQUEST, "No image provided"));
        };
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| upload_failure(StatusCode::BAD_REQUEST, err.to_string()))?;
        if bytes.is_empty() {
            return Err(upload_failure(StatusCode::BAD_REQUEST, "No image provided"));
        }
        break Upload { file_name, bytes };
    };

    let url = state.media.store(upload).await.map_err(|err| {
        error!("media upload error: {err}");
        upload_failure(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed")
    })?;

    state
        .store
        .append_image(&token, url.clone())
        .await
        .map_err(|err| {
            error!("uploaded {url} but could not record it: {err}");
            upload_failure(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed")
        })?;

    Ok(Json(UploadResponse {
        success: true,
        url: Some(url),
        error: None,
    }))
}

fn upload_failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = UploadResponse {
        success: false,
        url: None,
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

pub async fn delete_image(
    Admin(token): Admin,
    State(state): State<AppState>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    // A missing or unreadable body is the same as a missing url.
    let url = payload
        .ok()
        .and_then(|Json(payload)| payload.url)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Image URL required"))?;
    remove_image(&state, &token, url).await
}

pub async fn delete_image_file(
    Admin(token): Admin,
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    remove_image(&state, &token, local_url(&file_name)).await
}

async fn remove_image(
    state: &AppState,
    token: &AdminToken,
    url: String,
) -> Result<Json<DeleteResponse>, AppError> {
    state.store.remove_image(token, &url).await?;

    // The record is authoritative; a leftover blob is only logged.
    if let Err(err) = state.media.remove(&url).await {
        warn!("image {url} removed from site but media delete failed: {err}");
    }

    Ok(Json(DeleteResponse {
        success: true,
        removed_url: url,
    }))
}

pub async fn views(
    State(state): State<AppState>,
    Query(query): Query<ViewsQuery>,
) -> Result<Json<ViewsResponse>, AppError> {
    let views = if query.count.as_deref() == Some("true") {
        state.store.increment_views().await?
    } else {
        state.store.view_count().await
    };
    Ok(Json(ViewsResponse { views }))
}

pub async fn login(State(state): State<AppState>, Form(payload): Form<LoginRequest>) -> Response {
    if !state.admin.verify(&payload.username, &payload.password) {
        warn!("failed admin login attempt");
        return (StatusCode::UNAUTHORIZED, Html("Invalid login")).into_response();
    }

    info!("admin {} logged in", state.admin.username());
    let cookie = state.sessions.create().await;
    (
        [(header::SET_COOKIE, state.sessions.set_cookie(&cookie))],
        Redirect::to(ADMIN_PAGE),
    )
        .into_response()
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(cookie) = session_cookie(&headers) {
        state.sessions.destroy(&cookie).await;
    }
    (
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Redirect::to(LOGIN_PAGE),
    )
        .into_response()
}

pub async fn record_click(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    let mut clicks = state.clicks.lock().await;
    let entry = clicks.entry(id.clone()).or_default();
    entry.count = entry.count.saturating_add(1);
    entry.last_clicked = Local::now().to_rfc3339();
    info!(image = %id, count = entry.count, "image clicked");
    StatusCode::NO_CONTENT
}

pub async fn get_clicks(Admin(_): Admin, State(state): State<AppState>) -> Json<ClickTally> {
    Json(state.clicks.lock().await.clone())
}

pub async fn serve_upload(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let path = state
        .media
        .local()
        .and_then(|local| local.path_for(&file_name))
        .ok_or_else(|| AppError::not_found("Image not found"))?;

    match fs::read(&path).await {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, content_type_for(&file_name))],
            bytes,
        )
            .into_response()),
        Err(err) if err.kind() == ErrorKind::NotFound => Err(AppError::not_found("Image not found")),
        Err(err) => Err(err.into()),
    }
}
