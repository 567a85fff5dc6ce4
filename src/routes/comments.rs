use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post},
};

/// Comments Router Module
///
/// Rants and raves nested under their place. Creation needs a logged-in user;
/// deletion needs the comment's author.
pub fn comments_routes() -> Router<AppState> {
    Router::new()
        // POST /places/{id}/comments
        .route("/places/{id}/comments", post(handlers::create_comment))
        // DELETE /places/{id}/comments/{comment_id}
        .route(
            "/places/{id}/comments/{comment_id}",
            delete(handlers::delete_comment),
        )
}
