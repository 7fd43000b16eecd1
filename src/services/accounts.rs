//! User signup, login and credential changes.

use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::models::AuthenticatedIdentity;
use crate::utils::auth::{create_jwt, validate_jwt};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::Utc;
use rand::rngs::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct Registration {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct ProfileUpdate {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Display name must be 1-100 characters"))]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct PasswordChange {
    pub old_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

pub struct AccountService {
    db: DatabaseConnection,
    jwt_secret: String,
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Stored hash unreadable: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AccountService {
    pub fn new(db: DatabaseConnection, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    pub async fn register(&self, registration: Registration) -> Result<users::Model, AppError> {
        registration
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        let display_name = registration.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AppError::InvalidInput(
                "Display name cannot be blank".to_string(),
            ));
        }

        let email = normalize_email(&registration.email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = users::ActiveModel {
            id: NotSet,
            email: Set(email),
            display_name: Set(display_name),
            password_hash: Set(hash_password(&registration.password)?),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent signup for the same email.
            if e.to_string().to_lowercase().contains("unique") {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!("👤 User registered: {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Verifies credentials and issues a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let invalid = || AppError::Unauthenticated("Invalid credentials".to_string());

        let user = self
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!("Failed login for {}", user.email);
            return Err(invalid());
        }

        create_jwt(user.id, &user.email, &self.jwt_secret)
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Resolves a bearer token to the identity of a user that still exists.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedIdentity, AppError> {
        let claims = validate_jwt(token, &self.jwt_secret)
            .map_err(|e| AppError::Unauthenticated(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("User no longer exists".to_string()))?;

        Ok(AuthenticatedIdentity::new(user.id, user.email))
    }

    pub async fn profile(&self, identity: &AuthenticatedIdentity) -> Result<users::Model, AppError> {
        Users::find_by_id(identity.user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        identity: &AuthenticatedIdentity,
        update: ProfileUpdate,
    ) -> Result<users::Model, AppError> {
        update
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let user = self.profile(identity).await?;
        let mut active: users::ActiveModel = user.into();

        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if let Some(other) = self.find_by_email(&email).await?
                && other.id != identity.user_id
            {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
            active.email = Set(email);
        }
        if let Some(name) = update.display_name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::InvalidInput(
                    "Display name cannot be blank".to_string(),
                ));
            }
            active.display_name = Set(name);
        }

        Ok(active.update(&self.db).await?)
    }

    pub async fn change_password(
        &self,
        identity: &AuthenticatedIdentity,
        change: PasswordChange,
    ) -> Result<(), AppError> {
        change
            .validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let user = self.profile(identity).await?;
        if !verify_password(&change.old_password, &user.password_hash)? {
            return Err(AppError::Unauthenticated(
                "Current password is incorrect".to_string(),
            ));
        }

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&change.new_password)?);
        active.update(&self.db).await?;

        tracing::info!("🔑 Password changed for user {}", identity.user_id);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, AppError> {
        Ok(Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }
}
