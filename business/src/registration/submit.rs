//! Submission of a validated form and interpretation of the server's answer.

use std::fmt;

use log::{error, info, warn};

use crate::api::{ApiClient, ApiMessage, CreatedUser};
use crate::http::Response;
use crate::registration::multipart::MultipartBody;
use crate::registration::validate::RegistrationForm;
use crate::token::TokenManager;

/// Result of one submission. Exactly one per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Success { user_id: i64 },
    /// 409: a user with this email or phone already exists.
    EmailExists,
    /// 401: the token was rejected and has been discarded.
    TokenExpired,
    /// 422: the server rejected the payload.
    Validation(String),
    Other(String),
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Success { user_id } => Some(*user_id),
            _ => None,
        }
    }
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { user_id } => write!(f, "Registered user #{user_id}"),
            Self::EmailExists => f.write_str("User with this phone or email already exists"),
            Self::TokenExpired => f.write_str("Session expired, please try again"),
            Self::Validation(message) | Self::Other(message) => f.write_str(message),
        }
    }
}

/// Submission progress as seen by the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmitStatus {
    #[default]
    Idle,
    /// A submit started and has not finished.
    ///
    /// The session is borrowed mutably for the whole submit, so nobody can read this while
    /// it is awaited. It stays visible only when the submit future was dropped before
    /// completing (a timeout or a cancelled UI action), until the next submit.
    Submitting,
    Done(SubmitOutcome),
}

impl SubmitStatus {
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// The outcome of the last finished submit.
    pub fn outcome(&self) -> Option<&SubmitOutcome> {
        match self {
            Self::Done(outcome) => Some(outcome),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationSubmitter {
    api: ApiClient,
}

impl RegistrationSubmitter {
    /// Submitter posting through `api`.
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Obtain a token, POST the form, and map the response.
    ///
    /// Never fails: transport and decode problems become [`SubmitOutcome::Other`].
    pub async fn submit(
        &self,
        tokens: &mut TokenManager,
        form: &RegistrationForm,
    ) -> SubmitOutcome {
        let token = match tokens.ensure_token().await {
            Ok(token) => token,
            Err(err) => {
                error!("RegistrationSubmitter: no token: {err}");
                return SubmitOutcome::Other(err.to_string());
            }
        };

        let body = build_body(form);
        let content_type = body.content_type();
        let response = match self
            .api
            .post_user(&token.value, &content_type, body.finish())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("RegistrationSubmitter: request failed: {err}");
                return SubmitOutcome::Other(err.to_string());
            }
        };

        let outcome = interpret(&response);
        if outcome == SubmitOutcome::TokenExpired {
            tokens.invalidate();
        }
        match &outcome {
            SubmitOutcome::Success { user_id } => {
                info!("RegistrationSubmitter: created user {user_id}");
            }
            other => warn!(
                "RegistrationSubmitter: status {} -> {other:?}",
                response.status
            ),
        }
        outcome
    }
}

/// The multipart payload for `form`.
pub fn build_body(form: &RegistrationForm) -> MultipartBody {
    let mut body = MultipartBody::new();
    body.field("name", form.name())
        .field("email", form.email())
        .field("phone", form.phone())
        .field("position_id", &form.position_id().to_string())
        .file("photo", "photo.jpg", "image/jpeg", form.photo_jpeg());
    body
}

/// Map a `POST /users` response to an outcome. Does not touch the token.
pub fn interpret(response: &Response) -> SubmitOutcome {
    match response.status {
        200..=299 => match response.json::<CreatedUser>() {
            Ok(created) => SubmitOutcome::Success {
                user_id: created.user_id,
            },
            Err(err) => SubmitOutcome::Other(format!("Failed to decode response: {err}")),
        },
        401 => SubmitOutcome::TokenExpired,
        409 => SubmitOutcome::EmailExists,
        422 => SubmitOutcome::Validation(
            ApiMessage::from_response(response)
                .describe()
                .unwrap_or_else(|| "Validation failed".to_owned()),
        ),
        status => SubmitOutcome::Other(
            ApiMessage::from_response(response)
                .describe()
                .unwrap_or_else(|| format!("Server error {status}")),
        ),
    }
}
