//! Dashboard account creation.

use crate::error::{AppError, AppResult};
use crate::events::activity::ActivityEvent;
use crate::models::kinds::UserRole;
use crate::models::user::{NewUser, User};
use crate::services::{organization_service, validation};
use crate::storage::Storage;

pub async fn require_user(storage: &dyn Storage, id: i64) -> AppResult<User> {
    storage
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

/// 400 when an optional user reference (`reviewerId`, `invitedBy`, ...)
/// names no account.
pub async fn require_referenced_user(
    storage: &dyn Storage,
    field: &str,
    id: Option<i64>,
) -> AppResult<()> {
    let Some(id) = id else {
        return Ok(());
    };
    match storage.get_user(id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest(format!(
            "{field} {id} does not match any user"
        ))),
    }
}

/// Usernames and emails are stored lowercased so uniqueness is case-insensitive.
pub async fn create_user(storage: &dyn Storage, mut new_user: NewUser) -> AppResult<User> {
    let username = validation::non_empty("username", &new_user.username)?;
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::BadRequest(
            "username cannot contain spaces".to_string(),
        ));
    }
    validation::max_chars("username", &username, validation::MAX_USERNAME_CHARS)?;
    new_user.username = username.to_lowercase();
    new_user.email = validation::email(&new_user.email)?;
    validation::max_chars("email", &new_user.email, validation::MAX_EMAIL_CHARS)?;
    new_user.role = new_user.role.parse::<UserRole>()?.as_str().to_string();
    new_user.full_name = new_user
        .full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    validation::max_chars_opt("fullName", new_user.full_name.as_deref(), validation::MAX_NAME_CHARS)?;
    if let Some(org_id) = new_user.organization_id {
        organization_service::require_organization(storage, org_id).await?;
    }

    let user = storage.create_user(new_user).await?;
    tracing::info!(user_id = user.id, role = %user.role, "User created");

    let event = ActivityEvent::UserCreated {
        username: user.username.clone(),
        role: user.role.clone(),
    };
    storage
        .log_activity(event.into_log(user.organization_id, Some(user.id), Some(user.id)))
        .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;

    fn new_user(username: &str, email: &str, role: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: Some("  ".to_string()),
            role: role.to_string(),
            organization_id: None,
        }
    }

    #[tokio::test]
    async fn creation_normalizes_fields() {
        let store = MemStorage::new();
        let user = create_user(&store, new_user(" Ada ", "Ada@Example.org", "Admin"))
            .await
            .unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.email, "ada@example.org");
        assert_eq!(user.role, "admin");
        assert_eq!(user.full_name, None);
    }

    #[tokio::test]
    async fn duplicates_conflict_regardless_of_case() {
        let store = MemStorage::new();
        create_user(&store, new_user("ada", "ada@example.org", "member"))
            .await
            .unwrap();
        let err = create_user(&store, new_user("ADA", "other@example.org", "member"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let store = MemStorage::new();
        for user in [
            new_user("", "a@b.org", "member"),
            new_user("two words", "a@b.org", "member"),
            new_user("ada", "not-an-email", "member"),
            new_user("ada", "a@b.org", "owner"),
            new_user(&"a".repeat(65), "a@b.org", "member"),
        ] {
            assert!(matches!(
                create_user(&store, user).await,
                Err(AppError::BadRequest(_))
            ));
        }

        let mut orphan = new_user("ada", "a@b.org", "member");
        orphan.organization_id = Some(77);
        assert!(matches!(
            create_user(&store, orphan).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn user_references_must_exist() {
        let store = MemStorage::new();
        let ada = create_user(&store, new_user("ada", "ada@example.org", "admin"))
            .await
            .unwrap();

        assert!(require_referenced_user(&store, "reviewerId", None).await.is_ok());
        assert!(require_referenced_user(&store, "reviewerId", Some(ada.id)).await.is_ok());
        let err = require_referenced_user(&store, "reviewerId", Some(404))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "reviewerId 404 does not match any user");
    }
}
