use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

/// Picture used when a place is created without one.
pub const DEFAULT_PIC: &str = "http://placekitten.com/400/400";
/// City used when a place is created without one.
pub const DEFAULT_CITY: &str = "Anytown";
/// State used when a place is created without one.
pub const DEFAULT_STATE: &str = "USA";

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The RBAC field of a user, stored as the PostgreSQL enum `user_role`.
/// Only `Admin` may add, edit, or delete places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    Reviewer,
    Admin,
}

/// User
///
/// A read-only account record from the `users` table. Users are never created or
/// mutated by this service; they are looked up by the id embedded in a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    /// Opaque, never sent to clients.
    #[serde(skip)]
    pub password_digest: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Place
///
/// A point-of-interest record from the `places` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Place {
    pub place_id: i32,
    pub name: String,
    pub pic: String,
    pub cuisines: Option<String>,
    pub city: String,
    pub state: String,
    pub founded: Option<i32>,
}

/// Comment
///
/// A rant (`rant = true`) or rave (`rant = false`) from the `comments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Comment {
    pub comment_id: i32,
    pub place_id: i32,
    pub author_id: i32,
    pub content: String,
    pub stars: Option<f64>,
    pub rant: bool,
}

// --- Response Schemas ---

/// CommentWithAuthor
///
/// A comment with its author embedded, as returned by comment creation and place details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: User,
}

/// PlaceDetails
///
/// A place with every comment eagerly loaded, each carrying its author (GET /places/{id}).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PlaceDetails {
    #[serde(flatten)]
    pub place: Place,
    pub comments: Vec<CommentWithAuthor>,
}

// --- Request Payloads (Input Schemas) ---

/// CreatePlaceRequest
///
/// Input payload for POST /places. Missing or empty `pic`, `city`, and `state`
/// are filled in by [`CreatePlaceRequest::with_defaults`].
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreatePlaceRequest {
    #[serde(default)]
    pub name: String,
    pub pic: Option<String>,
    pub cuisines: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub founded: Option<i32>,
}

/// NewPlace
///
/// A place ready for insertion: every defaulted column holds a concrete value.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
    pub name: String,
    pub pic: String,
    pub cuisines: Option<String>,
    pub city: String,
    pub state: String,
    pub founded: Option<i32>,
}

impl CreatePlaceRequest {
    pub fn with_defaults(self) -> NewPlace {
        NewPlace {
            name: self.name,
            pic: or_default(self.pic, DEFAULT_PIC),
            cuisines: self.cuisines,
            city: or_default(self.city, DEFAULT_CITY),
            state: or_default(self.state, DEFAULT_STATE),
            founded: self.founded,
        }
    }
}

/// An absent or empty value falls back to `default`.
fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

/// UpdatePlaceRequest
///
/// Partial update payload for PUT /places/{id}. Only these fields can be changed;
/// any other key in the body is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdatePlaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisines: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded: Option<i32>,
}

impl UpdatePlaceRequest {
    /// Applies every provided field onto `place`, leaving the rest untouched.
    pub fn merge_into(self, place: &mut Place) {
        if let Some(name) = self.name {
            place.name = name;
        }
        if let Some(pic) = self.pic {
            place.pic = pic;
        }
        if let Some(cuisines) = self.cuisines {
            place.cuisines = Some(cuisines);
        }
        if let Some(city) = self.city {
            place.city = city;
        }
        if let Some(state) = self.state {
            place.state = state;
        }
        if let Some(founded) = self.founded {
            place.founded = Some(founded);
        }
    }
}

/// CreateCommentRequest
///
/// Input payload for POST /places/{id}/comments. `text` is accepted as an alias of
/// `content`, and `rant` accepts any JSON value, reduced to a boolean by truthiness.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default, alias = "text")]
    pub content: String,
    pub stars: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub rant: bool,
}

fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| is_truthy(&value))
}

/// Loose truthiness: `false`, `0`, `NaN`, `""` and `null` are false, every
/// other value (including `"false"`, `[]` and `{}`) is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_matches_loose_boolean_rules() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!(-2.5), json!("false"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn comment_request_coerces_rant_and_accepts_text_alias() {
        let req: CreateCommentRequest =
            serde_json::from_value(json!({ "text": "neat", "rant": 0 })).unwrap();
        assert_eq!(req.content, "neat");
        assert!(!req.rant);

        let req: CreateCommentRequest =
            serde_json::from_value(json!({ "content": "awful", "rant": "yes" })).unwrap();
        assert!(req.rant);

        let req: CreateCommentRequest = serde_json::from_value(json!({})).unwrap();
        assert!(!req.rant);
    }

    #[test]
    fn defaults_only_fill_missing_or_empty_fields() {
        let place = CreatePlaceRequest {
            name: "Cave".to_string(),
            pic: Some(String::new()),
            city: Some("Seattle".to_string()),
            ..Default::default()
        }
        .with_defaults();

        assert_eq!(place.pic, DEFAULT_PIC);
        assert_eq!(place.city, "Seattle");
        assert_eq!(place.state, DEFAULT_STATE);
    }

    #[test]
    fn user_serialization_hides_password_digest() {
        let user = User {
            user_id: 7,
            first_name: "Ada".to_string(),
            password_digest: "$2b$secret".to_string(),
            role: Role::Admin,
            ..Default::default()
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains(r#""userId":7"#));
        assert!(json.contains(r#""role":"admin""#));
        assert!(!json.contains("secret"));
        assert!(!json.contains("passwordDigest"));
    }

    #[test]
    fn place_details_flatten_the_place() {
        let details = PlaceDetails {
            place: Place {
                place_id: 3,
                name: "Cave".to_string(),
                ..Default::default()
            },
            comments: vec![],
        };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["placeId"], 3);
        assert_eq!(value["comments"], json!([]));
    }
}
