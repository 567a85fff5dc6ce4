use crate::models::{
    Comment, CommentWithAuthor, CreateCommentRequest, NewPlace, Place, PlaceDetails,
    UpdatePlaceRequest, User,
};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;

/// Every store call either yields its value or the underlying `sqlx` failure,
/// which the handler layer turns into a 500.
pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations on users, places, and
/// comments. Handlers only ever see `Arc<dyn Repository>`, so the Postgres store can be
/// swapped for [`InMemoryRepository`] in tests.
///
/// **Send + Sync + async_trait** are required to make the trait object safely shareable
/// across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Places ---
    async fn list_places(&self) -> RepoResult<Vec<Place>>;
    async fn get_place(&self, id: i32) -> RepoResult<Option<Place>>;
    // Eager-loads comments and each comment's author.
    async fn get_place_details(&self, id: i32) -> RepoResult<Option<PlaceDetails>>;
    async fn create_place(&self, place: NewPlace) -> RepoResult<Place>;
    // Returns None when no place has this id.
    async fn update_place(&self, id: i32, changes: UpdatePlaceRequest) -> RepoResult<Option<Place>>;
    // Returns the removed row, or None when no place has this id.
    async fn delete_place(&self, id: i32) -> RepoResult<Option<Place>>;

    // --- Users (read-only) ---
    async fn get_user(&self, id: i32) -> RepoResult<Option<User>>;

    // --- Comments ---
    async fn create_comment(
        &self,
        place_id: i32,
        author_id: i32,
        req: CreateCommentRequest,
    ) -> RepoResult<Comment>;
    // Scoped lookup: the comment must belong to `place_id`.
    async fn get_comment(&self, place_id: i32, comment_id: i32) -> RepoResult<Option<Comment>>;
    async fn delete_comment(&self, comment_id: i32) -> RepoResult<Option<Comment>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const PLACE_COLUMNS: &str = "place_id, name, pic, cuisines, city, state, founded";
const COMMENT_COLUMNS: &str = "comment_id, place_id, author_id, content, stars, rant";

/// A comment row joined with its author.
#[derive(FromRow)]
struct CommentAuthorRow {
    #[sqlx(flatten)]
    comment: Comment,
    #[sqlx(flatten)]
    author: User,
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_places(&self) -> RepoResult<Vec<Place>> {
        sqlx::query_as::<_, Place>(&format!(
            "SELECT {PLACE_COLUMNS} FROM places ORDER BY place_id"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn get_place(&self, id: i32) -> RepoResult<Option<Place>> {
        sqlx::query_as::<_, Place>(&format!(
            "SELECT {PLACE_COLUMNS} FROM places WHERE place_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// get_place_details
    ///
    /// Two statements: the place itself, then its comments joined with `users`
    /// so every comment arrives with its author.
    async fn get_place_details(&self, id: i32) -> RepoResult<Option<PlaceDetails>> {
        let Some(place) = self.get_place(id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, CommentAuthorRow>(
            r#"
            SELECT
                c.comment_id, c.place_id, c.author_id, c.content, c.stars, c.rant,
                u.user_id, u.first_name, u.last_name, u.email, u.role, u.password_digest
            FROM comments c
            JOIN users u ON u.user_id = c.author_id
            WHERE c.place_id = $1
            ORDER BY c.comment_id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let comments = rows
            .into_iter()
            .map(|row| CommentWithAuthor {
                comment: row.comment,
                author: row.author,
            })
            .collect();

        Ok(Some(PlaceDetails { place, comments }))
    }

    async fn create_place(&self, place: NewPlace) -> RepoResult<Place> {
        sqlx::query_as::<_, Place>(&format!(
            "INSERT INTO places (name, pic, cuisines, city, state, founded) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PLACE_COLUMNS}"
        ))
        .bind(place.name)
        .bind(place.pic)
        .bind(place.cuisines)
        .bind(place.city)
        .bind(place.state)
        .bind(place.founded)
        .fetch_one(&self.pool)
        .await
    }

    /// update_place
    ///
    /// Uses `COALESCE` so a column only changes when the matching field in `changes` is `Some`.
    async fn update_place(&self, id: i32, changes: UpdatePlaceRequest) -> RepoResult<Option<Place>> {
        sqlx::query_as::<_, Place>(&format!(
            r#"
            UPDATE places
            SET name = COALESCE($2, name),
                pic = COALESCE($3, pic),
                cuisines = COALESCE($4, cuisines),
                city = COALESCE($5, city),
                state = COALESCE($6, state),
                founded = COALESCE($7, founded)
            WHERE place_id = $1
            RETURNING {PLACE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.pic)
        .bind(changes.cuisines)
        .bind(changes.city)
        .bind(changes.state)
        .bind(changes.founded)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_place(&self, id: i32) -> RepoResult<Option<Place>> {
        sqlx::query_as::<_, Place>(&format!(
            "DELETE FROM places WHERE place_id = $1 RETURNING {PLACE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_user(&self, id: i32) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, first_name, last_name, email, role, password_digest \
             FROM users WHERE user_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_comment(
        &self,
        place_id: i32,
        author_id: i32,
        req: CreateCommentRequest,
    ) -> RepoResult<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments (place_id, author_id, content, stars, rant) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(place_id)
        .bind(author_id)
        .bind(req.content)
        .bind(req.stars)
        .bind(req.rant)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_comment(&self, place_id: i32, comment_id: i32) -> RepoResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = $1 AND place_id = $2"
        ))
        .bind(comment_id)
        .bind(place_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_comment(&self, comment_id: i32) -> RepoResult<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            "DELETE FROM comments WHERE comment_id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
    }
}

// --- In-memory store ---

#[derive(Default)]
struct MemoryTables {
    users: BTreeMap<i32, User>,
    places: BTreeMap<i32, Place>,
    comments: BTreeMap<i32, Comment>,
    last_place_id: i32,
    last_comment_id: i32,
}

/// InMemoryRepository
///
/// A process-local stand-in for PostgreSQL with the same observable behavior
/// (serial ids, cascade on place deletion, inner join on comment authors).
/// Used by the test suite.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<MemoryTables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the read-only `users` table.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let tables = MemoryTables {
            users: users.into_iter().map(|u| (u.user_id, u)).collect(),
            ..Default::default()
        };
        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_places(&self) -> RepoResult<Vec<Place>> {
        Ok(self.tables.read().await.places.values().cloned().collect())
    }

    async fn get_place(&self, id: i32) -> RepoResult<Option<Place>> {
        Ok(self.tables.read().await.places.get(&id).cloned())
    }

    async fn get_place_details(&self, id: i32) -> RepoResult<Option<PlaceDetails>> {
        let tables = self.tables.read().await;
        let Some(place) = tables.places.get(&id).cloned() else {
            return Ok(None);
        };

        let comments = tables
            .comments
            .values()
            .filter(|c| c.place_id == id)
            .filter_map(|c| {
                tables.users.get(&c.author_id).map(|author| CommentWithAuthor {
                    comment: c.clone(),
                    author: author.clone(),
                })
            })
            .collect();

        Ok(Some(PlaceDetails { place, comments }))
    }

    async fn create_place(&self, place: NewPlace) -> RepoResult<Place> {
        let mut tables = self.tables.write().await;
        tables.last_place_id += 1;
        let created = Place {
            place_id: tables.last_place_id,
            name: place.name,
            pic: place.pic,
            cuisines: place.cuisines,
            city: place.city,
            state: place.state,
            founded: place.founded,
        };
        tables.places.insert(created.place_id, created.clone());
        Ok(created)
    }

    async fn update_place(&self, id: i32, changes: UpdatePlaceRequest) -> RepoResult<Option<Place>> {
        let mut tables = self.tables.write().await;
        Ok(tables.places.get_mut(&id).map(|place| {
            changes.merge_into(place);
            place.clone()
        }))
    }

    async fn delete_place(&self, id: i32) -> RepoResult<Option<Place>> {
        let mut tables = self.tables.write().await;
        let removed = tables.places.remove(&id);
        if removed.is_some() {
            tables.comments.retain(|_, c| c.place_id != id);
        }
        Ok(removed)
    }

    async fn get_user(&self, id: i32) -> RepoResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_comment(
        &self,
        place_id: i32,
        author_id: i32,
        req: CreateCommentRequest,
    ) -> RepoResult<Comment> {
        let mut tables = self.tables.write().await;
        tables.last_comment_id += 1;
        let created = Comment {
            comment_id: tables.last_comment_id,
            place_id,
            author_id,
            content: req.content,
            stars: req.stars,
            rant: req.rant,
        };
        tables.comments.insert(created.comment_id, created.clone());
        Ok(created)
    }

    async fn get_comment(&self, place_id: i32, comment_id: i32) -> RepoResult<Option<Comment>> {
        Ok(self
            .tables
            .read()
            .await
            .comments
            .get(&comment_id)
            .filter(|c| c.place_id == place_id)
            .cloned())
    }

    async fn delete_comment(&self, comment_id: i32) -> RepoResult<Option<Comment>> {
        Ok(self.tables.write().await.comments.remove(&comment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreatePlaceRequest, Role};

    fn author() -> User {
        User {
            user_id: 1,
            first_name: "Rae".to_string(),
            role: Role::Reviewer,
            ..Default::default()
        }
    }

    fn cave() -> NewPlace {
        CreatePlaceRequest {
            name: "Cave".to_string(),
            ..Default::default()
        }
        .with_defaults()
    }

    #[tokio::test]
    async fn ids_are_assigned_serially() {
        let repo = InMemoryRepository::new();
        let first = repo.create_place(cave()).await.unwrap();
        let second = repo.create_place(cave()).await.unwrap();
        assert_eq!((first.place_id, second.place_id), (1, 2));
    }

    #[tokio::test]
    async fn deleting_a_place_cascades_to_its_comments() {
        let repo = InMemoryRepository::with_users([author()]);
        let place = repo.create_place(cave()).await.unwrap();
        let comment = repo
            .create_comment(place.place_id, 1, CreateCommentRequest::default())
            .await
            .unwrap();

        repo.delete_place(place.place_id).await.unwrap();

        assert!(repo
            .get_comment(place.place_id, comment.comment_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn comment_lookup_is_scoped_to_its_place() {
        let repo = InMemoryRepository::with_users([author()]);
        let place = repo.create_place(cave()).await.unwrap();
        let other = repo.create_place(cave()).await.unwrap();
        let comment = repo
            .create_comment(place.place_id, 1, CreateCommentRequest::default())
            .await
            .unwrap();

        assert!(repo
            .get_comment(other.place_id, comment.comment_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn details_embed_comment_authors() {
        let repo = InMemoryRepository::with_users([author()]);
        let place = repo.create_place(cave()).await.unwrap();
        repo.create_comment(place.place_id, 1, CreateCommentRequest::default())
            .await
            .unwrap();

        let details = repo.get_place_details(place.place_id).await.unwrap().unwrap();
        assert_eq!(details.comments.len(), 1);
        assert_eq!(details.comments[0].author, author());
    }
}
