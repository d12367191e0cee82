use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

const UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/admin/login.html", get(handlers::login_page))
        .route("/admin/upload.html", get(handlers::admin_page))
        .route("/admin/login", post(handlers::login))
        .route("/admin/logout", get(handlers::logout))
        .route(
            "/admin/upload",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/api/check-auth", get(handlers::check_auth))
        .route("/api/site-data", get(handlers::get_site_data))
        .route("/api/update-site-data", post(handlers::update_site_data))
        .route("/api/images", get(handlers::get_images))
        .route("/api/delete", delete(handlers::delete_image))
        .route("/api/delete/:filename", delete(handlers::delete_image_file))
        .route("/api/views", get(handlers::views))
        .route("/api/click/:id", post(handlers::record_click))
        .route("/api/clicks", get(handlers::get_clicks))
        .route("/uploads/:filename", get(handlers::serve_upload))
        .with_state(state)
}
