//! Authentication routes for the provider callback and logout.

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use super::OAuthSession;

/// Query parameters for the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Creates the callback and logout routes at their configured paths.
pub fn auth_routes<S>(session: OAuthSession) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(session.callback_path(), get(callback))
        .route(session.logout_path(), get(logout).post(logout))
        .with_state(session)
}

/// Handles the provider callback after the user authorizes.
///
/// On success a new session record replaces any previous one and the user
/// is sent to the location carried in `state`. On failure nothing is
/// written, so an existing session cookie is left as it was.
pub async fn callback(
    State(session): State<OAuthSession>,
    Query(query): Query<CallbackQuery>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), AuthError> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        warn!(error = %error, description = %description, "provider returned an error");
        return Err(AuthError::Provider { error, description });
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or(AuthError::MissingCode)?;

    let return_to = query
        .state
        .filter(|state| !state.is_empty())
        .unwrap_or_else(|| "/".to_string());
    if HeaderValue::try_from(return_to.as_str()).is_err() {
        warn!("callback state is not a valid redirect location");
        return Err(AuthError::InvalidState);
    }

    let token = session
        .oauth_client()
        .exchange_code(&code)
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let record = session
        .new_record(token)
        .map_err(|e| AuthError::Session(e.to_string()))?;
    let jar = session
        .store()
        .put(jar, &record)
        .map_err(|e| AuthError::Session(e.to_string()))?;

    info!(expire_at = %record.expire_at(), "OAuth login successful");
    Ok((jar, Redirect::to(&return_to)))
}

/// Clears the session cookie.
pub async fn logout(
    State(session): State<OAuthSession>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    (session.store().clear(jar), Redirect::to("/"))
}

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    /// The provider redirected back with an error instead of a code.
    Provider { error: String, description: String },
    /// The callback carried no authorization code.
    MissingCode,
    /// The return location in `state` cannot be sent as a redirect.
    InvalidState,
    /// The code could not be exchanged for a token.
    TokenExchange(String),
    /// The new session could not be stored.
    Session(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Provider { error, description } => {
                let message = if description.is_empty() {
                    error
                } else {
                    format!("{}: {}", error, description)
                };
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            Self::MissingCode => {
                (StatusCode::BAD_REQUEST, "Missing authorization code").into_response()
            }
            Self::InvalidState => {
                (StatusCode::BAD_REQUEST, "Invalid return location").into_response()
            }
            Self::TokenExchange(msg) => {
                warn!("Token exchange failed: {}", msg);
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
            Self::Session(msg) => {
                tracing::error!("Failed to store session: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
