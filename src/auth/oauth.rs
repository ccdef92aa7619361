use std::time::Duration;

use serde::Deserialize;

use super::AuthError;
use crate::config::GoogleSettings;
use crate::models::enums::OAuthProviderKind;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Identity returned by a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthIdentity {
    pub provider: OAuthProviderKind,
    pub provider_user_id: String,
    pub email: String,
    /// The provider asserts the user owns `email`.
    pub email_verified: bool,
}

/// Authorization-code flow against an external identity provider.
///
/// `exchange_code` blocks; call it from `spawn_blocking`.
pub trait OAuthProvider: Send + Sync {
    fn kind(&self) -> OAuthProviderKind;

    /// Consent page the user is redirected to.
    fn authorize_url(&self) -> Result<String, AuthError>;

    fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, AuthError>;
}

pub struct GoogleOAuthClient {
    settings: GoogleSettings,
    timeout_secs: u64,
}

impl GoogleOAuthClient {
    pub fn new(settings: GoogleSettings) -> Self {
        Self {
            settings,
            timeout_secs: 30,
        }
    }

    fn http_client(&self) -> Result<reqwest::blocking::Client, AuthError> {
        reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| AuthError::OAuth(e.to_string()))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: Option<String>,
    #[serde(default)]
    verified_email: bool,
}

impl OAuthProvider for GoogleOAuthClient {
    fn kind(&self) -> OAuthProviderKind {
        OAuthProviderKind::Google
    }

    fn authorize_url(&self) -> Result<String, AuthError> {
        let url = reqwest::Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("scope", "openid email profile"),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AuthError::OAuth(e.to_string()))?;
        Ok(url.into())
    }

    fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, AuthError> {
        let client = self.http_client()?;

        let response = client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
            ])
            .send()
            .map_err(|e| AuthError::OAuth(format!("token request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(AuthError::OAuth(format!("token endpoint returned {status}: {body}")));
        }
        let token: TokenResponse = response
            .json()
            .map_err(|e| AuthError::OAuth(format!("token response: {e}")))?;

        let response = client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .map_err(|e| AuthError::OAuth(format!("userinfo request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(AuthError::OAuth(format!("userinfo endpoint returned {status}")));
        }
        let info: GoogleUserInfo = response
            .json()
            .map_err(|e| AuthError::OAuth(format!("userinfo response: {e}")))?;

        let email = info
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AuthError::OAuth("provider returned no email".into()))?;

        Ok(OAuthIdentity {
            provider: OAuthProviderKind::Google,
            provider_user_id: info.id,
            email,
            email_verified: info.verified_email,
        })
    }
}

/// Mock provider for testing. Accepts exactly one code.
pub struct MockOAuthProvider {
    accepted_code: String,
    identity: OAuthIdentity,
}

impl MockOAuthProvider {
    pub fn new(accepted_code: &str, provider_user_id: &str, email: &str) -> Self {
        Self {
            accepted_code: accepted_code.to_string(),
            identity: OAuthIdentity {
                provider: OAuthProviderKind::Google,
                provider_user_id: provider_user_id.to_string(),
                email: email.to_string(),
                email_verified: true,
            },
        }
    }

    pub fn with_unverified_email(mut self) -> Self {
        self.identity.email_verified = false;
        self
    }
}

impl OAuthProvider for MockOAuthProvider {
    fn kind(&self) -> OAuthProviderKind {
        self.identity.provider
    }

    fn authorize_url(&self) -> Result<String, AuthError> {
        Ok("https://accounts.example.test/consent?client_id=mock".into())
    }

    fn exchange_code(&self, code: &str) -> Result<OAuthIdentity, AuthError> {
        if code == self.accepted_code {
            Ok(self.identity.clone())
        } else {
            Err(AuthError::OAuth("invalid authorization code".into()))
        }
    }
}
