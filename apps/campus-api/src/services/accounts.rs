//! Account registration, login and preference updates.

use campus_common::id::{prefix, prefixed_ulid};
use chrono::Utc;

use crate::auth::password::{hash_password, verify_password};
use crate::config::AdminSeed;
use crate::db::store::DataStore;
use crate::error::{field_error, ApiError, FieldError};
use crate::models::user::{NotificationPreferences, PlatformRole, User};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 80;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(email: &str, name: &str, password: &str) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    let at = email.find('@');
    if !at.is_some_and(|i| i > 0 && i < email.len() - 1) {
        errors.push(FieldError {
            field: "email".to_string(),
            message: "A valid email address is required".to_string(),
        });
    }
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError {
            field: "name".to_string(),
            message: format!("Name must be 1-{MAX_NAME_LEN} characters"),
        });
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError {
            field: "password".to_string(),
            message: format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        });
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

/// Create a user. Emails are unique, compared case-insensitively; the store
/// enforces this atomically, the early lookup only skips hashing.
pub async fn register(
    store: &dyn DataStore,
    email: &str,
    name: &str,
    password: &str,
    role: PlatformRole,
) -> Result<User, ApiError> {
    let email = normalize_email(email);
    let name = name.trim();
    validate_registration(&email, name, password)?;

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let user = User {
        id: prefixed_ulid(prefix::USER),
        email,
        name: name.to_string(),
        avatar: None,
        role,
        password_hash: hash_password(password)?,
        notification_preferences: NotificationPreferences::default(),
        created_at: Utc::now(),
    };
    store.insert_user(user.clone()).await?;
    tracing::info!(user_id = %user.id, role = ?user.role, "user registered");
    Ok(user)
}

/// Check credentials. Unknown email and wrong password are indistinguishable.
pub async fn authenticate(store: &dyn DataStore, email: &str, password: &str) -> Result<User, ApiError> {
    let user = store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;
    verify_password(password, &user.password_hash)?;
    Ok(user)
}

pub async fn update_preferences(
    store: &dyn DataStore,
    user_id: &str,
    preferences: NotificationPreferences,
) -> Result<User, ApiError> {
    store
        .update_user(
            user_id,
            Box::new(move |user: &mut User| user.notification_preferences = preferences),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn update_profile(
    store: &dyn DataStore,
    user_id: &str,
    name: Option<&str>,
    avatar: Option<&str>,
) -> Result<User, ApiError> {
    let name = match name.map(str::trim) {
        Some(name) if name.is_empty() || name.chars().count() > MAX_NAME_LEN => {
            return Err(field_error("name", format!("Name must be 1-{MAX_NAME_LEN} characters")));
        }
        other => other.map(str::to_string),
    };
    // An empty avatar clears it.
    let avatar = avatar.map(|a| {
        let a = a.trim();
        (!a.is_empty()).then(|| a.to_string())
    });

    store
        .update_user(
            user_id,
            Box::new(move |user: &mut User| {
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(avatar) = avatar {
                    user.avatar = avatar;
                }
            }),
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Create the configured platform admin if no account uses its email yet.
pub async fn seed_admin(store: &dyn DataStore, seed: &AdminSeed) -> Result<(), ApiError> {
    if store.find_user_by_email(&normalize_email(&seed.email)).await?.is_some() {
        return Ok(());
    }
    register(store, &seed.email, &seed.name, &seed.password, PlatformRole::Admin).await?;
    Ok(())
}
