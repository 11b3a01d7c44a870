use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

pub mod password;

/// Token kind carried in the `token_type` claim. Access tokens authorize API
/// calls; refresh tokens are only accepted by the refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: Uuid, email: String, token_type: TokenType) -> Self {
        let now = Utc::now();
        let security = &config::config().security;
        let lifetime = match token_type {
            TokenType::Access => Duration::minutes(security.access_token_minutes as i64),
            TokenType::Refresh => Duration::days(security.refresh_token_days as i64),
        };

        Self {
            sub,
            email,
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Access + refresh token pair returned by the login endpoint.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_token(claims: &Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Issue the access + refresh pair for a freshly authenticated user.
pub fn issue_pair(user_id: Uuid, email: &str) -> Result<TokenPair, JwtError> {
    let access = generate_token(&Claims::new(user_id, email.to_string(), TokenType::Access))?;
    let refresh = generate_token(&Claims::new(user_id, email.to_string(), TokenType::Refresh))?;
    Ok(TokenPair { access, refresh })
}

/// Validate a token's signature and expiry, then check it is of the expected kind.
pub fn decode_token(token: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    if token_data.claims.token_type != expected {
        return Err(JwtError::InvalidToken("wrong token type".to_string()));
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_round_trips_with_correct_types() {
        let user_id = Uuid::new_v4();
        let pair = issue_pair(user_id, "alice@example.com").unwrap();

        let access = decode_token(&pair.access, TokenType::Access).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.email, "alice@example.com");

        let refresh = decode_token(&pair.refresh, TokenType::Refresh).unwrap();
        assert_eq!(refresh.sub, user_id);
    }

    #[test]
    fn access_token_is_rejected_as_refresh() {
        let pair = issue_pair(Uuid::new_v4(), "bob@example.com").unwrap();
        let err = decode_token(&pair.access, TokenType::Refresh).unwrap_err();
        assert!(matches!(err, JwtError::InvalidToken(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = decode_token("not-a-jwt", TokenType::Access).unwrap_err();
        assert!(matches!(err, JwtError::InvalidToken(_)));
    }
}
