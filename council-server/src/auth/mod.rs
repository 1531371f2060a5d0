// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Bearer-token authentication for the Council API

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use council_core::{RecordId, User};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod password;
pub use password::{hash_password, is_plausible_email, verify_password, DEFAULT_BCRYPT_COST};

/// Identity attached to each authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: RecordId,
    pub email: String,
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingCredentials,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    JwtValidation(String),

    #[error("Failed to issue token: {0}")]
    TokenCreation(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials
            | AuthError::InvalidCredentials
            | AuthError::JwtValidation(_) => StatusCode::UNAUTHORIZED,
            AuthError::TokenCreation(_) | AuthError::Hashing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AuthError::JwtValidation(reason) = &self {
            tracing::debug!("Rejected bearer token: {}", reason);
        }

        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        if status == StatusCode::UNAUTHORIZED {
            let challenge = [(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))];
            (status, challenge, body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub exp: usize, // Expiration time
}

/// Authenticator trait for pluggable auth strategies
pub trait Authenticator: Send + Sync {
    /// Authenticate request by examining headers (synchronous)
    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError>;
}

/// HS256 bearer tokens, both issued and verified here
pub struct BearerTokenAuth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl BearerTokenAuth {
    pub fn new(jwt_secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Sign an access token for `user`
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let exp = (Utc::now() + self.ttl).timestamp().max(0) as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            exp,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<AuthContext, AuthError> {
        let token_data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())
                .map_err(|e| AuthError::JwtValidation(e.to_string()))?;

        let user_id = token_data
            .claims
            .sub
            .parse()
            .map_err(|e: council_core::InvalidRecordId| AuthError::JwtValidation(e.to_string()))?;

        Ok(AuthContext {
            user_id,
            email: token_data.claims.email,
        })
    }
}

impl Authenticator for BearerTokenAuth {
    fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        // Extract Bearer token from Authorization header
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingCredentials)?;

        self.verify(token.trim())
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    auth: axum::Extension<Arc<dyn Authenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ctx = auth.authenticate(req.headers())?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: RecordId::from_parts(1_700_000_000, 7),
            email: "ada@example.com".to_string(),
            password_hash: String::new(),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_issue_then_authenticate() {
        let auth = BearerTokenAuth::new("secret", 30);
        let token = auth.issue(&user()).unwrap();

        let ctx = auth.authenticate(&bearer(&token)).unwrap();
        assert_eq!(ctx.user_id, user().id);
        assert_eq!(ctx.email, "ada@example.com");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        let auth = BearerTokenAuth::new("secret", 30);
        assert!(matches!(
            auth.authenticate(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            auth.authenticate(&headers),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let issuer = BearerTokenAuth::new("other-secret", 30);
        let verifier = BearerTokenAuth::new("secret", 30);
        let token = issuer.issue(&user()).unwrap();
        assert!(matches!(
            verifier.authenticate(&bearer(&token)),
            Err(AuthError::JwtValidation(_))
        ));

        // Past the default 60s leeway
        let expired = BearerTokenAuth::new("secret", -5);
        let token = expired.issue(&user()).unwrap();
        assert!(matches!(
            verifier.authenticate(&bearer(&token)),
            Err(AuthError::JwtValidation(_))
        ));
    }

    #[test]
    fn test_unauthorized_response_carries_challenge() {
        let response = AuthError::MissingCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
