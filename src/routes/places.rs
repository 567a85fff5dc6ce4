use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Places Router Module
///
/// Reads are open to everyone. Mutations are open at the routing level and gated
/// inside the handlers by the `admin` role, using the identity attached by the
/// identity middleware.
pub fn places_routes() -> Router<AppState> {
    Router::new()
        // GET /places lists every place; POST /places creates one (admin).
        .route("/places", get(handlers::get_places).post(handlers::create_place))
        // GET /places/{id} returns the place with comments and their authors.
        // PUT merges whitelisted fields (admin); DELETE removes it (admin).
        // Non-numeric ids answer 404.
        .route(
            "/places/{id}",
            get(handlers::get_place)
                .put(handlers::update_place)
                .delete(handlers::delete_place),
        )
}
