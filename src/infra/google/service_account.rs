// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// Signs an RS256 JWT with the service account's private key and trades it at
// the token endpoint for a short-lived bearer token. Tokens are cached until
// a minute before they expire.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::core::workspace::WorkspaceError;

/// Scopes needed to search and copy Drive files, edit Docs and read Sheets.
pub const WORKSPACE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before Google says the token expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// Where to exchange the JWT for an access token.
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    scopes: String,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceAccountAuth {
    /// Creates a new authenticator from a JSON key file path.
    pub async fn from_file(path: &str) -> Result<Self, WorkspaceError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| WorkspaceError::Auth(format!("Cannot read key file {}: {}", path, e)))?;
        Self::from_json(&content)
    }

    /// Creates a new authenticator from JSON key content.
    pub fn from_json(json: &str) -> Result<Self, WorkspaceError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)
            .map_err(|e| WorkspaceError::Auth(format!("Invalid service account key: {}", e)))?;
        Ok(Self {
            credentials,
            scopes: WORKSPACE_SCOPES.join(" "),
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Uses `GOOGLE_SERVICE_ACCOUNT_KEY` (a path) or `GOOGLE_SERVICE_ACCOUNT_JSON`.
    pub async fn from_env() -> Result<Self, WorkspaceError> {
        if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            return Self::from_file(&path).await;
        }

        if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            return Self::from_json(&json);
        }

        Err(WorkspaceError::Auth(
            "Neither GOOGLE_SERVICE_ACCOUNT_KEY nor GOOGLE_SERVICE_ACCOUNT_JSON is set.".to_string(),
        ))
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    /// Gets a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String, WorkspaceError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + EXPIRY_MARGIN {
                    return Ok(token.token.clone());
                }
            }
        }

        let response = self.fetch_new_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(CachedToken {
                token: response.access_token.clone(),
                expires_at: SystemTime::now() + Duration::from_secs(response.expires_in),
            });
        }

        tracing::debug!(
            client_email = %self.credentials.client_email,
            expires_in = response.expires_in,
            "Refreshed Google access token"
        );
        Ok(response.access_token)
    }

    fn signed_assertion(&self, now: u64) -> Result<String, WorkspaceError> {
        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: self.scopes.clone(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| WorkspaceError::Auth(format!("Invalid private key: {}", e)))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| WorkspaceError::Auth(format!("Failed to sign JWT: {}", e)))
    }

    async fn fetch_new_token(&self) -> Result<TokenResponse, WorkspaceError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| WorkspaceError::Auth(e.to_string()))?
            .as_secs();
        let jwt = self.signed_assertion(now)?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| WorkspaceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WorkspaceError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WorkspaceError::Decode(e.to_string()))
    }
}
