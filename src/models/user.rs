//! User model, tokens and access checks

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::Role;
use crate::error::AppError;

/// Sortable fields for user listings; the first is the default
pub const USER_SORT_FIELDS: &[&str] = &["id", "username"];

/// Map an API sort name to its column
pub fn user_sort_column(field: &str) -> &'static str {
    match field {
        "username" => "username",
        _ => "id",
    }
}

/// Persisted user
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string, never the plain password
    pub password: String,
    pub role: Role,
}

/// User fields before the store assigns an id
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Credentials used for registration and login
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserRequest {
    #[validate(length(min = 6, max = 14, message = "Username must be 6-14 characters"))]
    pub username: String,
    #[validate(length(min = 6, max = 14, message = "Password must be 6-14 characters"))]
    pub password: String,
}

/// Change password request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 6, max = 14, message = "Password must be 6-14 characters"))]
    pub password: String,
}

/// Registration query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegisterParams {
    /// Role of the new account (default: USER)
    pub role: Option<Role>,
}

/// Public user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Registration response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub id: i64,
    pub username: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Username
    pub sub: String,
    pub user_id: i64,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token, checking signature and expiry
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// Identity of the authenticated caller, passed explicitly into every
/// access-checked operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Self-or-admin rule
    pub fn can_act_on(&self, target_id: i64) -> bool {
        self.is_admin() || self.id == target_id
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    pub fn require_self_or_admin(&self, target_id: i64) -> Result<(), AppError> {
        if self.can_act_on(target_id) {
            Ok(())
        } else {
            Err(AppError::Authorization("You don't have permission to do this".to_string()))
        }
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn caller(id: i64, role: Role) -> Caller {
        Caller {
            id,
            username: format!("user{:04}", id),
            role,
        }
    }

    #[test]
    fn self_or_admin_is_a_function_of_role_and_ids() {
        assert!(caller(1, Role::User).can_act_on(1));
        assert!(!caller(1, Role::User).can_act_on(2));
        assert!(caller(1, Role::Admin).can_act_on(2));
        assert!(caller(1, Role::Admin).can_act_on(1));
    }

    #[test]
    fn denial_is_an_authorization_error() {
        assert!(matches!(
            caller(1, Role::User).require_self_or_admin(2),
            Err(AppError::Authorization(_))
        ));
        assert!(matches!(
            caller(1, Role::User).require_admin(),
            Err(AppError::Authorization(_))
        ));
        assert!(caller(7, Role::Admin).require_admin().is_ok());
    }

    #[test]
    fn token_round_trip_and_wrong_secret() {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: "reader01".to_string(),
            user_id: 42,
            role: Role::User,
            exp: now + 3600,
            iat: now,
        };
        let token = claims.create_token("secret-a").unwrap();

        let decoded = UserClaims::from_token(&token, "secret-a").unwrap();
        assert_eq!(decoded.sub, "reader01");
        assert_eq!(decoded.user_id, 42);
        assert_eq!(decoded.role, Role::User);

        assert!(UserClaims::from_token(&token, "secret-b").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: "reader01".to_string(),
            user_id: 42,
            role: Role::Admin,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = claims.create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn username_length_is_validated() {
        let short = UserRequest {
            username: "ab".to_string(),
            password: "longenough".to_string(),
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(!errors.field_errors().contains_key("password"));

        let both = UserRequest {
            username: "a-very-long-username".to_string(),
            password: "123".to_string(),
        };
        assert_eq!(both.validate().unwrap_err().field_errors().len(), 2);
    }
}
