//! Bearer-token authentication.
//!
//! HS256 tokens carry the driver's user id in the `userId` claim (legacy
//! tokens use `user_id`). The extractor turns the header into a typed
//! request context; handlers never touch the raw token.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::Deserialize;

use super::error::ApiError;
use crate::di::AppState;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(rename = "userId", alias = "user_id")]
    user_id: i64,
    #[allow(dead_code)]
    exp: Option<usize>,
}

/// Authenticated driver context extracted from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthedDriver {
    pub user_id: i64,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthedDriver {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("토큰이 없습니다".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("잘못된 토큰 형식입니다".to_string()))?;

        let claims = decode_claims(token, &state.jwt_secret)?;
        Ok(AuthedDriver { user_id: claims.user_id })
    }
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                ApiError::Unauthorized("토큰이 만료되었습니다".to_string())
            }
            ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => {
                ApiError::Unauthorized("토큰에 사용자 ID 정보가 없습니다".to_string())
            }
            _ => ApiError::Unauthorized("유효하지 않은 토큰입니다".to_string()),
        })
}
