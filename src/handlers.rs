use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, ErrorResponse, parse_id},
    models::{
        Comment, CommentWithAuthor, CreateCommentRequest, CreatePlaceRequest, Place,
        PlaceDetails, UpdatePlaceRequest,
    },
    permissions::{Action, authorize},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

/// Resolves a place id segment, answering not-found for numbers no place can carry.
fn place_id(raw: &str) -> Result<i32, ApiError> {
    parse_id(raw)?.ok_or_else(|| ApiError::PlaceNotFound(raw.trim().to_string()))
}

/// Resolves a comment route's ids. Numbers no row can carry mean the comment is absent.
fn comment_ids(raw_place_id: &str, raw_comment_id: &str) -> Result<(i32, i32), ApiError> {
    let place_id = parse_id(raw_place_id)?;
    let comment_id = parse_id(raw_comment_id)?;
    place_id.zip(comment_id).ok_or(ApiError::CommentNotFound)
}

// --- Place Handlers ---

/// create_place
///
/// [Admin] Creates a place. `pic`, `city`, and `state` fall back to their defaults
/// when omitted or empty.
#[utoipa::path(
    post,
    path = "/places",
    request_body = CreatePlaceRequest,
    responses(
        (status = 200, description = "Created", body = Place),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 422, description = "Malformed body", body = ErrorResponse)
    )
)]
pub async fn create_place(
    current: CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<CreatePlaceRequest>, JsonRejection>,
) -> Result<Json<Place>, ApiError> {
    authorize(current.user(), Action::AddPlace)?;
    let Json(payload) = payload?;

    let place = state.repo.create_place(payload.with_defaults()).await?;
    tracing::info!(place_id = place.place_id, "place created");
    Ok(Json(place))
}

/// get_places
///
/// [Public] Lists every place.
#[utoipa::path(
    get,
    path = "/places",
    responses((status = 200, description = "All places", body = [Place]))
)]
pub async fn get_places(State(state): State<AppState>) -> Result<Json<Vec<Place>>, ApiError> {
    Ok(Json(state.repo.list_places().await?))
}

/// get_place
///
/// [Public] A single place with its comments, each comment carrying its author.
#[utoipa::path(
    get,
    path = "/places/{id}",
    params(("id" = String, Path, description = "Place ID")),
    responses(
        (status = 200, description = "Found", body = PlaceDetails),
        (status = 404, description = "Invalid id or not found", body = ErrorResponse)
    )
)]
pub async fn get_place(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<PlaceDetails>, ApiError> {
    let id = place_id(&raw_id)?;
    state
        .repo
        .get_place_details(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::PlaceNotFound(id.to_string()))
}

/// update_place
///
/// [Admin] Merges the fields present in the body onto the stored place. Fields outside
/// `UpdatePlaceRequest` are ignored.
#[utoipa::path(
    put,
    path = "/places/{id}",
    params(("id" = String, Path, description = "Place ID")),
    request_body = UpdatePlaceRequest,
    responses(
        (status = 200, description = "Updated", body = Place),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Invalid id or not found", body = ErrorResponse),
        (status = 422, description = "Malformed body", body = ErrorResponse)
    )
)]
pub async fn update_place(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdatePlaceRequest>, JsonRejection>,
) -> Result<Json<Place>, ApiError> {
    authorize(current.user(), Action::EditPlace)?;
    let Json(payload) = payload?;

    let id = place_id(&raw_id)?;
    let place = state
        .repo
        .update_place(id, payload)
        .await?
        .ok_or_else(|| ApiError::PlaceNotFound(id.to_string()))?;
    tracing::info!(place_id = id, "place updated");
    Ok(Json(place))
}

/// delete_place
///
/// [Admin] Removes a place (and, through the schema, its comments). Responds with the
/// removed record.
#[utoipa::path(
    delete,
    path = "/places/{id}",
    params(("id" = String, Path, description = "Place ID")),
    responses(
        (status = 200, description = "Deleted", body = Place),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Invalid id or not found", body = ErrorResponse)
    )
)]
pub async fn delete_place(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Place>, ApiError> {
    authorize(current.user(), Action::DeletePlace)?;

    let id = place_id(&raw_id)?;
    let place = state
        .repo
        .delete_place(id)
        .await?
        .ok_or_else(|| ApiError::PlaceNotFound(id.to_string()))?;
    tracing::info!(place_id = id, "place deleted");
    Ok(Json(place))
}

// --- Comment Handlers ---

/// create_comment
///
/// [Logged-in user] Leaves a rant or rave on a place. The place must exist, then a
/// current user must be present; the comment is attributed to that user.
#[utoipa::path(
    post,
    path = "/places/{id}/comments",
    params(("id" = String, Path, description = "Place ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment added", body = CommentWithAuthor),
        (status = 404, description = "Invalid id, place not found, or not logged in", body = ErrorResponse),
        (status = 422, description = "Malformed body", body = ErrorResponse)
    )
)]
pub async fn create_comment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<Json<CommentWithAuthor>, ApiError> {
    let id = place_id(&raw_id)?;

    let place = state
        .repo
        .get_place(id)
        .await?
        .ok_or_else(|| ApiError::PlaceNotFound(id.to_string()))?;

    let CurrentUser(Some(author)) = current else {
        return Err(ApiError::LoginRequired);
    };
    let Json(payload) = payload?;

    let comment = state
        .repo
        .create_comment(place.place_id, author.user_id, payload)
        .await?;
    tracing::info!(
        comment_id = comment.comment_id,
        place_id = place.place_id,
        author_id = author.user_id,
        rant = comment.rant,
        "comment created"
    );

    Ok(Json(CommentWithAuthor { comment, author }))
}

/// delete_comment
///
/// [Comment author] Deletes a comment. Only its author may do so; the admin role
/// grants nothing here.
#[utoipa::path(
    delete,
    path = "/places/{id}/comments/{comment_id}",
    params(
        ("id" = String, Path, description = "Place ID"),
        ("comment_id" = String, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Deleted", body = Comment),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Invalid ids or not found", body = ErrorResponse)
    )
)]
pub async fn delete_comment(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((raw_place_id, raw_comment_id)): Path<(String, String)>,
) -> Result<Json<Comment>, ApiError> {
    let (place_id, comment_id) = comment_ids(&raw_place_id, &raw_comment_id)?;

    let comment = state
        .repo
        .get_comment(place_id, comment_id)
        .await?
        .ok_or(ApiError::CommentNotFound)?;

    authorize(
        current.user(),
        Action::DeleteComment {
            comment_id: comment.comment_id,
            author_id: comment.author_id,
        },
    )?;

    // A concurrent delete may have won; the last-known row is still what we report.
    let deleted = state.repo.delete_comment(comment_id).await?.unwrap_or(comment);
    tracing::info!(comment_id, place_id, "comment deleted");
    Ok(Json(deleted))
}
