use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{
    ApiError, ApiResponse, AppState, AuthPayload, MessageResponse, TwoFactorChallengeResponse,
    validation,
};
use crate::services::SigninOutcome;

/// Session key holding the authenticated user's id.
const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub code: Option<String>,
}

#[derive(Deserialize)]
pub struct CodeRequest {
    pub code: Option<String>,
}

#[derive(Deserialize)]
pub struct SendCodeRequest {
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailChangeRequest {
    pub new_email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailChangeVerifyRequest {
    pub code: Option<String>,
    pub new_email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub code: Option<String>,
    pub new_password: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Gate for the protected router: the request proceeds only with a valid
/// session cookie.
pub async fn require_session(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    if let Some(user_id) = user_id {
        tracing::Span::current().record("user_id", user_id);
        return Ok(next.run(request).await);
    }

    Err(ApiError::Unauthorized("Not authenticated".to_string()))
}

/// Get the user id from the session, returns error if not authenticated.
pub async fn session_user_id(session: &Session) -> Result<i32, ApiError> {
    session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signup
/// Create an account and sign it in immediately.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;
    let name = validation::validate_name(&payload.name)?.to_string();

    let user = state
        .auth()
        .signup(&email, &payload.password, &name, payload.role.as_deref())
        .await?;

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthPayload { user: user.into() })),
    ))
}

/// POST /api/auth/signin
/// Verify credentials; either issues a session or answers with the 2FA
/// challenge marker (`requires2FA`) after emailing a fresh code.
pub async fn signin(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SigninRequest>,
) -> Result<Response, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let outcome = state
        .auth()
        .signin(&payload.email, &payload.password, payload.code.as_deref())
        .await?;

    match outcome {
        SigninOutcome::SignedIn(user) => {
            session
                .insert(SESSION_USER_KEY, user.id)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

            Ok(Json(ApiResponse::success(AuthPayload { user: user.into() })).into_response())
        }
        SigninOutcome::ChallengeSent => {
            Ok(Json(TwoFactorChallengeResponse::new()).into_response())
        }
    }
}

/// POST /api/auth/signout
pub async fn signout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to clear session: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Signed out successfully".to_string(),
    })))
}

/// GET /api/auth/me
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    let user_id = session_user_id(&session).await?;
    let user = state.auth().current_user(user_id).await?;

    Ok(Json(ApiResponse::success(AuthPayload { user: user.into() })))
}

/// POST /api/auth/2fa/enable
/// Send an enrollment code; the flag flips only after verification.
pub async fn enable_two_factor(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user_id = session_user_id(&session).await?;
    state.auth().begin_two_factor_enrollment(user_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Verification code sent to your email".to_string(),
    })))
}

/// POST /api/auth/2fa/verify
pub async fn verify_two_factor(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CodeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user_id = session_user_id(&session).await?;
    let code = payload
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("Verification code is required"))?;

    state
        .auth()
        .confirm_two_factor_enrollment(user_id, &code)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Two-factor authentication enabled successfully".to_string(),
    })))
}

/// POST /api/auth/2fa/disable
pub async fn disable_two_factor(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user_id = session_user_id(&session).await?;
    state.auth().disable_two_factor(user_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Two-factor authentication disabled successfully".to_string(),
    })))
}

/// POST /api/auth/2fa/send-code
/// Pre-session code delivery for users whose browser lost the session
/// mid-login. Always reports success for unknown addresses.
pub async fn send_two_factor_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendCodeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = payload
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::validation("Email is required"))?;

    state.auth().send_two_factor_code(&email).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "If an account exists with this email, a verification code has been sent."
            .to_string(),
    })))
}

/// POST /api/auth/change-email
/// Start an email change; the code goes to the new address.
pub async fn request_email_change(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<EmailChangeRequest>,
) -> Result<Json<ApiResponse<PendingEmailResponse>>, ApiError> {
    let user_id = session_user_id(&session).await?;
    let new_email = payload
        .new_email
        .ok_or_else(|| ApiError::validation("New email is required"))?;
    let new_email = validation::validate_email(&new_email)?;

    let pending_email = state.auth().request_email_change(user_id, &new_email).await?;

    Ok(Json(ApiResponse::success(PendingEmailResponse {
        message: "Verification code sent to your new email address".to_string(),
        pending_email,
    })))
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEmailResponse {
    pub message: String,
    pub pending_email: String,
}

/// PUT /api/auth/change-email
pub async fn verify_email_change(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<EmailChangeVerifyRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let (Some(code), Some(new_email)) = (payload.code, payload.new_email) else {
        return Err(ApiError::validation(
            "Verification code and new email are required",
        ));
    };

    let user = state
        .auth()
        .confirm_email_change(user_id, &code, &new_email)
        .await?;

    Ok(Json(ApiResponse::success(AuthPayload { user: user.into() })))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let (Some(current), Some(new)) = (payload.current_password, payload.new_password) else {
        return Err(ApiError::validation(
            "Current password and new password are required",
        ));
    };

    state.auth().change_password(user_id, &current, &new).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password changed successfully".to_string(),
    })))
}

/// POST /api/auth/forgot-password
/// Always reports success for unknown addresses.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let email = payload
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::validation("Email is required"))?;

    state.auth().forgot_password(&email).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "If an account exists with this email, a password reset code has been sent."
            .to_string(),
    })))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let (Some(email), Some(code), Some(new_password)) =
        (payload.email, payload.code, payload.new_password)
    else {
        return Err(ApiError::validation(
            "Email, verification code, and new password are required",
        ));
    };

    state.auth().reset_password(&email, &code, &new_password).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password reset successfully. You can now sign in with your new password."
            .to_string(),
    })))
}
