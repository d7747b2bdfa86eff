use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::permissions::PermissionSet;

/// JWT body. `permissions` is copied from the user at issuance and is not
/// refreshed afterwards: a permission change takes effect on next login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub permissions: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, issued_at: DateTime<Utc>, ttl: Duration) -> Result<Self, SessionError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or(SessionError::InvalidExpiry)?;
        Ok(Self {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            permissions: user.permission_set().to_vec(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Session expiry is out of range")]
    InvalidExpiry,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Session expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

/// Authenticated caller, rebuilt from the token on every request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub permissions: PermissionSet,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            permissions: claims.permissions.into_iter().collect(),
            issued_at: Utc.timestamp_opt(claims.iat, 0).single().unwrap_or_default(),
            expires_at: Utc.timestamp_opt(claims.exp, 0).single().unwrap_or_default(),
        }
    }
}

#[derive(Debug)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

/// HS256 signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, SessionError> {
        let ttl = i64::try_from(security.session_expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or(SessionError::InvalidExpiry)?;
        Self::new(&security.jwt_secret, ttl)
    }

    pub fn new(secret: &str, ttl: Duration) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<IssuedSession, SessionError> {
        let claims = Claims::new(user, Utc::now(), self.ttl)?;
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| SessionError::TokenGeneration(e.to_string()))?;
        Ok(IssuedSession {
            token,
            session: Session::from(claims),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Session, SessionError> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            }
        })?;
        Ok(Session::from(data.claims))
    }
}
