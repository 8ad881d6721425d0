//! The third-party identity provider seam.
//!
//! [`IdentityToolkit`] talks to the Firebase Identity Toolkit and Secure Token REST
//! APIs: a custom token minted by the login endpoint is exchanged for an ID token and
//! a refresh token, and the refresh token is later traded for fresh ID tokens.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::User;
use crate::error::AuthError;

const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Tokens are refreshed when they are this close to expiring.
const EXPIRY_SKEW_SECONDS: i64 = 60;

/// A signed-in user together with the tokens that prove it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub user: User,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= Duration::seconds(EXPIRY_SKEW_SECONDS)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges a custom token issued by the login endpoint for a credential.
    async fn sign_in_with_custom_token(&self, token: &str) -> Result<Credential, AuthError>;

    /// Trades the credential's refresh token for a new ID token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;
}

#[derive(Clone)]
pub struct IdentityToolkit {
    http: reqwest::Client,
    api_key: Option<String>,
    identity_url: String,
    token_url: String,
}

impl IdentityToolkit {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key,
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }

    pub fn with_endpoints(
        mut self,
        identity_url: Option<String>,
        token_url: Option<String>,
    ) -> Self {
        if let Some(url) = identity_url {
            self.identity_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = token_url {
            self.token_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    fn api_key(&self) -> Result<&str, AuthError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AuthError::Provider("identity API key is not configured".into()))
    }

    #[instrument(skip(self, id_token))]
    async fn lookup(&self, id_token: &str) -> Result<User, AuthError> {
        debug!("Sending request");
        let response = self
            .http
            .post(format!("{}/accounts:lookup", self.identity_url))
            .query(&[("key", self.api_key()?)])
            .json(&LookupRequest { id_token })
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "account lookup failed with status {}",
                response.status()
            )));
        }
        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        body.users
            .into_iter()
            .next()
            .map(|account| User::new(account.local_id, account.email))
            .ok_or_else(|| AuthError::Provider("account lookup returned no user".into()))
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkit {
    #[instrument(skip(self, token))]
    async fn sign_in_with_custom_token(&self, token: &str) -> Result<Credential, AuthError> {
        debug!("Sending request");
        let response = self
            .http
            .post(format!("{}/accounts:signInWithCustomToken", self.identity_url))
            .query(&[("key", self.api_key()?)])
            .json(&CustomTokenRequest {
                token,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Custom token rejected");
            return Err(AuthError::InvalidCredentials);
        }
        let body: CustomTokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let user = self.lookup(&body.id_token).await?;
        Ok(Credential {
            user,
            expires_at: expiry_from_now(&body.expires_in),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
        })
    }

    #[instrument(skip(self, credential), fields(uid = %credential.user.uid))]
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        debug!("Sending request");
        let response = self
            .http
            .post(format!("{}/token", self.token_url))
            .query(&[("key", self.api_key()?)])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", credential.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::TokenRefresh(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::TokenRefresh(format!(
                "refresh failed with status {}",
                response.status()
            )));
        }
        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenRefresh(e.to_string()))?;

        Ok(Credential {
            user: User::new(body.user_id, credential.user.email.clone()),
            expires_at: expiry_from_now(&body.expires_in),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
        })
    }
}

/// `expiresIn` comes back as a string of seconds; fall back to one hour.
fn expiry_from_now(expires_in: &str) -> DateTime<Utc> {
    let seconds = expires_in.trim().parse::<i64>().unwrap_or(3600);
    Utc::now() + Duration::seconds(seconds)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustomTokenRequest<'a> {
    token: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomTokenResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: String,
    user_id: String,
}
