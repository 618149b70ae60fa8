//! Identity provider boundary
//!
//! Verifies opaque bearer credentials against an external identity
//! provider. The production implementation checks Google ID tokens via
//! the tokeninfo endpoint; tests inject deterministic fakes.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::metrics::IDENTITY_VERIFICATIONS_TOTAL;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// The verified identity behind a bearer credential
///
/// The core trusts this tuple as the authenticated user's identity
/// without further verification.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Stable subject id (opaque, provider-scoped)
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl VerifiedIdentity {
    /// Display name, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Boundary to the external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an opaque bearer credential.
    ///
    /// Returns the verified identity, or `Unauthorized` when the
    /// credential is missing, expired, or not issued for this app.
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, AppError>;
}

/// Google ID token verifier using the tokeninfo endpoint
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    client_id: String,
    endpoint: String,
}

/// Relevant subset of the tokeninfo response
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleIdentityProvider {
    pub fn new(client: reqwest::Client, client_id: String) -> Self {
        Self {
            client,
            client_id,
            endpoint: GOOGLE_TOKENINFO_URL.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, AppError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("identity provider unreachable: {e}")))?;

        // tokeninfo answers 4xx for invalid or expired tokens
        if response.status().is_client_error() {
            IDENTITY_VERIFICATIONS_TOTAL
                .with_label_values(&["rejected"])
                .inc();
            return Err(AppError::Unauthorized);
        }

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "identity provider returned status {}",
                response.status()
            )));
        }

        let info = response.json::<TokenInfo>().await.map_err(|e| {
            AppError::Upstream(format!("identity provider returned malformed data: {e}"))
        })?;

        // The token must have been issued for this application
        if info.aud != self.client_id {
            IDENTITY_VERIFICATIONS_TOTAL
                .with_label_values(&["rejected"])
                .inc();
            return Err(AppError::Unauthorized);
        }

        let email = info.email.ok_or(AppError::Unauthorized)?;

        IDENTITY_VERIFICATIONS_TOTAL
            .with_label_values(&["verified"])
            .inc();

        Ok(VerifiedIdentity {
            subject: info.sub,
            email,
            name: info.name,
            picture: info.picture,
        })
    }
}
