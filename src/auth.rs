use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig, error::ApiError, models::PublicUser, repository::RepositoryState,
};

/// Claims
///
/// The payload structure carried inside a session JWT. Claims are signed with
/// the server's secret and validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, used to resolve the account on
    /// each request.
    pub sub: Uuid,
    /// Expiration Time (exp): timestamp after which the JWT must not be
    /// accepted. Tokens cannot be revoked early, so this bounds the session.
    pub exp: usize,
    /// Issued At (iat): timestamp when the JWT was issued.
    pub iat: usize,
}

/// Mint a signed session token for a user. The subject claim is the user's
/// id; the lifetime comes from the config (hours, one week by default).
pub fn issue_token(user_id: Uuid, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.token_ttl_hours);
    let claims = Claims {
        sub: user_id,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "Token signing failed");
        ApiError::AuthFailure
    })
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request: the account exists and
/// the presented token is valid for it. Handlers take this as an argument to
/// retrieve the caller's id and enforce ownership.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The authenticated user's id, duplicated out of `user` so handlers can
    /// destructure it tersely.
    pub id: Uuid,
    /// The caller's public profile, already shaped for identity responses.
    pub user: PublicUser,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. This cleanly separates
/// authentication (extractor) from business logic (the handler).
///
/// The process:
/// 1. Dependency Resolution: Repository and AppConfig pulled from app state.
/// 2. Token Extraction: the `Authorization: Bearer` header, or MISSING_TOKEN.
/// 3. Token Validation: JWT decoding with expiry checking. TOKEN_EXPIRED for
///    stale tokens, INVALID_TOKEN for everything else.
/// 4. Subject Lookup: the account must still exist (USER_NOT_FOUND otherwise);
///    a store failure here fails closed with AUTH_ERROR rather than letting
///    the request through.
///
/// Rejection: an `ApiError` carrying the machine code for the exact failure.
impl<S> FromRequestParts<S> for AuthUser
where
    // S must allow sending across threads and sharing.
    S: Send + Sync,
    // Allows the extractor to pull the Repository State from the app state.
    RepositoryState: FromRef<S>,
    // Allows the extractor to pull the AppConfig (for the JWT secret).
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Dependency Resolution
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // 2. Token Extraction
        // Retrieve the Authorization header and require the "Bearer " scheme.
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::MissingToken)?;

        // 3. JWT Decoding
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        // Ensure expiration time validation is always active.
        validation.validate_exp = true;

        let token_data = match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                return Err(match e.kind() {
                    // Expired: the most common failure for a valid-but-old token.
                    ErrorKind::ExpiredSignature => ApiError::TokenExpired,
                    // Bad signature, malformed token, wrong algorithm, etc.
                    _ => ApiError::InvalidToken,
                });
            }
        };

        // 4. Subject Lookup (Final Verification)
        // A decoded token is not enough: the account may have been deleted
        // after issuance. A repository failure here must NOT admit the
        // request; fail closed.
        let user = match repo.find_user_by_id(token_data.claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(ApiError::SubjectNotFound),
            Err(e) => {
                tracing::error!(error = %e, "User lookup failed during authentication");
                return Err(ApiError::AuthFailure);
            }
        };

        // Success: return the resolved identity.
        Ok(AuthUser {
            id: user.id,
            user: user.into(),
        })
    }
}
