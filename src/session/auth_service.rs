use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::provider::SessionProvider;
use crate::domain::User;
use crate::error::{AuthError, ClientError, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Login and registration against the deployment's auth endpoints.
///
/// Login posts the email and password, receives a custom token and hands it to the
/// session provider, which exchanges it with the identity provider.
#[derive(Clone)]
pub struct AuthService {
    http: reqwest::Client,
    login_url: Option<String>,
    register_url: Option<String>,
    session: SessionProvider,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

impl AuthService {
    pub fn new(
        http: reqwest::Client,
        login_url: Option<String>,
        register_url: Option<String>,
        session: SessionProvider,
    ) -> Self {
        Self {
            http,
            login_url,
            register_url,
            session,
        }
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let url = self
            .login_url
            .as_deref()
            .ok_or_else(|| AuthError::Provider("login URL is not configured".into()))?;

        debug!("Sending request");
        let response = self
            .http
            .post(url)
            .json(&CredentialsBody { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        let body: LoginResponse = response.json().await?;
        let user = self.session.sign_in_with_custom_token(&body.token).await?;
        info!(uid = %user.uid, "Login successful");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<(), ClientError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            }
            .into());
        }
        let url = self
            .register_url
            .as_deref()
            .ok_or_else(|| AuthError::Provider("register URL is not configured".into()))?;

        debug!("Sending request");
        let response = self
            .http
            .post(url)
            .json(&CredentialsBody { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Network(format!(
                "registration failed with status {}",
                response.status()
            )));
        }
        info!("User registered");
        Ok(())
    }

    pub async fn logout(&self) {
        self.session.sign_out().await;
    }
}
