use std::fmt;

use crate::{error::ApiError, models::User};

/// Action
///
/// Every privileged operation the service performs. Place mutations are role-gated;
/// comment deletion is gated on authorship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AddPlace,
    EditPlace,
    DeletePlace,
    DeleteComment { comment_id: i32, author_id: i32 },
}

impl fmt::Display for Action {
    /// The denial message returned with a 403.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AddPlace => f.write_str("You are not allowed to add a place"),
            Action::EditPlace => f.write_str("You are not allowed to edit places"),
            Action::DeletePlace => f.write_str("You are not allowed to delete places"),
            Action::DeleteComment { comment_id, .. } => {
                write!(f, "You do not have permission to delete comment {}", comment_id)
            }
        }
    }
}

/// is_authorized
///
/// Pure predicate over the resolved identity and the requested action.
/// An absent user is denied everything.
pub fn is_authorized(user: Option<&User>, action: &Action) -> bool {
    let Some(user) = user else {
        return false;
    };

    match action {
        Action::AddPlace | Action::EditPlace | Action::DeletePlace => user.is_admin(),
        Action::DeleteComment { author_id, .. } => user.user_id == *author_id,
    }
}

/// authorize
///
/// Handler-facing form of [`is_authorized`]: a denial becomes a 403 `ApiError`.
pub fn authorize(user: Option<&User>, action: Action) -> Result<(), ApiError> {
    if is_authorized(user, &action) {
        return Ok(());
    }
    tracing::warn!(
        user_id = ?user.map(|u| u.user_id),
        action = ?action,
        "permission denied"
    );
    Err(ApiError::Forbidden(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn user(id: i32, role: Role) -> User {
        User {
            user_id: id,
            role,
            ..Default::default()
        }
    }

    #[test]
    fn only_admins_mutate_places() {
        let admin = user(1, Role::Admin);
        let reviewer = user(2, Role::Reviewer);

        for action in [Action::AddPlace, Action::EditPlace, Action::DeletePlace] {
            assert!(is_authorized(Some(&admin), &action));
            assert!(!is_authorized(Some(&reviewer), &action));
            assert!(!is_authorized(None, &action));
        }
    }

    #[test]
    fn comment_deletion_is_ownership_based() {
        let action = Action::DeleteComment {
            comment_id: 9,
            author_id: 2,
        };

        assert!(is_authorized(Some(&user(2, Role::Reviewer)), &action));
        // Admin role grants nothing over other people's comments.
        assert!(!is_authorized(Some(&user(1, Role::Admin)), &action));
        assert!(!is_authorized(None, &action));
    }

    #[test]
    fn denial_messages_name_the_action() {
        assert_eq!(Action::AddPlace.to_string(), "You are not allowed to add a place");
        assert_eq!(
            Action::DeleteComment {
                comment_id: 9,
                author_id: 2
            }
            .to_string(),
            "You do not have permission to delete comment 9"
        );
    }
}
