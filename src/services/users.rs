//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        paging::{Page, PageRequest},
        user::{NewUser, UserClaims},
        Caller, Role, User, UserRequest,
    },
    repository::Repository,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

fn not_found(id: i64) -> AppError {
    AppError::UserNotFound(format!("User not found: {}", id))
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Create an account and issue its first token
    pub async fn register(&self, request: &UserRequest, role: Role) -> AppResult<(User, String)> {
        let user = self
            .repository
            .users
            .insert(&NewUser {
                username: request.username.clone(),
                password_hash: self.hash_password(&request.password)?,
                role,
            })
            .await?;

        let token = self.issue_token(&user)?;
        tracing::info!("User registered: {} (id={}, role={})", user.username, user.id, user.role);
        Ok((user, token))
    }

    /// Check credentials and return a fresh token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        let user = self.repository.users.find_by_username(username).await?;

        let verified = self.check_credentials(user.as_ref(), password)?;

        match user {
            Some(user) if verified => self.issue_token(&user),
            _ => {
                tracing::warn!("Failed login for {}", username);
                Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()))
            }
        }
    }

    /// Resolve a bearer token into the caller it identifies
    pub async fn verify_token(&self, token: &str) -> AppResult<Caller> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(format!("Invalid token: {}", e)))?;

        let user = self
            .repository
            .users
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Authentication("Unknown token subject".to_string()))?;

        Ok(Caller::from(&user))
    }

    pub async fn get_by_id(&self, caller: &Caller, id: i64) -> AppResult<User> {
        self.authorize(caller, id)?;
        self.repository
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn change_password(&self, caller: &Caller, id: i64, new_password: &str) -> AppResult<()> {
        self.authorize(caller, id)?;
        let hash = self.hash_password(new_password)?;
        if !self.repository.users.update_password(id, &hash).await? {
            return Err(not_found(id));
        }
        tracing::info!("Password changed for user {} by {}", id, caller.username);
        Ok(())
    }

    pub async fn delete(&self, caller: &Caller, id: i64) -> AppResult<()> {
        self.authorize(caller, id)?;
        if !self.repository.users.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!("User {} deleted by {}", id, caller.username);
        Ok(())
    }

    /// All users, administrators only
    pub async fn list_all(&self, caller: &Caller, page: &PageRequest) -> AppResult<Page<User>> {
        if let Err(e) = caller.require_admin() {
            tracing::warn!("User listing denied for {}", caller.username);
            return Err(e);
        }
        self.repository.users.find_all(page).await
    }

    fn authorize(&self, caller: &Caller, target_id: i64) -> AppResult<()> {
        caller.require_self_or_admin(target_id).map_err(|e| {
            tracing::warn!("User {} denied access to user {}", caller.id, target_id);
            e
        })
    }

    /// Create JWT token for a user
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify user password. Without a user the password is hashed anyway and
    /// the check fails, so both outcomes cost the same argon2 work.
    fn check_credentials(&self, user: Option<&User>, password: &str) -> AppResult<bool> {
        let Some(user) = user else {
            self.hash_password(password)?;
            return Ok(false);
        };
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
