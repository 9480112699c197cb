//! OAuth2 authorization-code client.
//!
//! The `state` parameter carries the location to return to after login. It
//! is not a CSRF nonce and is not checked on callback.

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EmptyExtraTokenFields,
    RedirectUrl, Scope, StandardTokenResponse, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenType},
};
use osecure_session::SessionToken;
use std::time::Duration;
use tracing::instrument;

use crate::config::OAuthConfig;

/// Type alias for the token response type.
type OAuthTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

/// OAuth2 client for the configured provider.
#[derive(Clone)]
pub struct OAuthClient {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    scopes: Vec<Scope>,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL is invalid.
    pub fn new(config: &OAuthConfig) -> Result<Self, OAuthError> {
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| OAuthError::Configuration(format!("invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| OAuthError::Configuration(format!("invalid token URL: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|e| OAuthError::Configuration(format!("invalid redirect URL: {}", e)))?;

        // The token endpoint must not be allowed to redirect the exchange.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                OAuthError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client_id: ClientId::new(config.client_id.clone()),
            client_secret: ClientSecret::new(config.client_secret.clone()),
            auth_url,
            token_url,
            redirect_url,
            scopes: config
                .scopes()
                .into_iter()
                .map(|scope| Scope::new(scope.to_string()))
                .collect(),
            http_client,
        })
    }

    /// Generates the provider URL to send the user to.
    ///
    /// `return_to` is passed through the provider verbatim as `state`.
    pub fn authorization_url(&self, return_to: &str) -> String {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (auth_url, _state) = client
            .authorize_url(|| CsrfToken::new(return_to.to_string()))
            .add_scopes(self.scopes.iter().cloned())
            .url();

        auth_url.to_string()
    }

    /// Exchanges the authorization code for an access token.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<SessionToken, OAuthError> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token_result: OAuthTokenResponse = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| OAuthError::TokenExchange(describe_token_error(&e)))?;

        let scopes = token_result
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect());

        Ok(SessionToken::new(
            token_result.access_token().secret().clone(),
            token_result.token_type().as_ref().to_string(),
            scopes,
        ))
    }
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// Renders a token exchange failure, preferring the provider's own error text.
fn describe_token_error<RE, T>(error: &oauth2::RequestTokenError<RE, T>) -> String
where
    RE: std::error::Error + 'static,
    T: oauth2::ErrorResponse + 'static,
{
    match error {
        oauth2::RequestTokenError::ServerResponse(response) => response.to_string(),
        other => other.to_string(),
    }
}

/// OAuth-related errors.
#[derive(Debug)]
pub enum OAuthError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// The provider rejected the code, or could not be reached.
    TokenExchange(String),
}

impl std::fmt::Display for OAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OAuth configuration error: {}", msg),
            Self::TokenExchange(msg) => write!(f, "OAuth token exchange error: {}", msg),
        }
    }
}

impl std::error::Error for OAuthError {}
