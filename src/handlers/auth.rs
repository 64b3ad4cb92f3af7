use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{AuthUser, issue_token},
    error::ApiError,
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, UserResponse},
    password::{hash_password, verify_password},
    validation,
};

/// register
///
/// [Public Route] Creates a new account and signs the caller in, in one step.
/// The password is hashed before anything touches the store, and the
/// duplicate-email pre-check is backstopped by the unique constraint, so two
/// simultaneous registrations for the same address cannot both win.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failure or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let name = validation::validate_name(&payload.name)?;
    let email = validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;
    let bio = match payload.bio.as_deref() {
        Some(b) => Some(validation::validate_bio(b)?),
        None => None,
    };

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::EmailExists);
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .repo
        .insert_user(NewUser {
            name,
            email,
            password_hash,
            bio,
        })
        .await?;

    let token = issue_token(user.id, &state.config)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: user.into(),
            token,
        }),
    ))
}

/// login
///
/// [Public Route] Exchanges email + password for a fresh session token.
///
/// *Security*: an unknown email and a wrong password produce byte-identical
/// responses, so the endpoint cannot be used to enumerate accounts.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Unknown email or wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = validation::normalize_email(&payload.email);

    let user = state
        .repo
        .find_user_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(user.id, &state.config)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: user.into(),
        token,
    }))
}

/// verify
///
/// [Authenticated Route] Confirms the presented token still maps to a live
/// account and returns that account's public profile. The heavy lifting
/// (decoding, expiry, subject resolution) already happened in the `AuthUser`
/// extractor; reaching this body *is* the success case.
#[utoipa::path(
    post,
    path = "/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = UserResponse),
        (status = 401, description = "Missing, invalid or expired token")
    )
)]
pub async fn verify(AuthUser { user, .. }: AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        message: "Token is valid".to_string(),
        user,
    })
}
