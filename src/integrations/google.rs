//! Google service-account authentication (OAuth 2.0 JWT bearer grant).

use crate::error::{PilotError, Result, TransportError};
use anyhow::Context;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The fields of a downloaded service-account key file this crate needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read service account file {}", path.display()))?;
        let key: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid service account file {}", path.display()))?;
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange a signed assertion for a short-lived access token.
pub async fn fetch_access_token(
    client: &reqwest::Client,
    key: &ServiceAccountKey,
    scope: &str,
    timeout: Duration,
) -> Result<String> {
    let assertion = sign_assertion(key, scope, chrono::Utc::now().timestamp())?;

    let response = client
        .post(&key.token_uri)
        .timeout(timeout)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await
        .map_err(|e| TransportError::from_reqwest("google token", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            target: "google token".into(),
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| TransportError::from_reqwest("google token", e))?;
    Ok(token.access_token)
}

fn sign_assertion(key: &ServiceAccountKey, scope: &str, now: i64) -> Result<String> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| PilotError::Other(anyhow::anyhow!("invalid service account private key: {e}")))?;
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| PilotError::Other(anyhow::anyhow!("failed to sign assertion: {e}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    pub(crate) const TEST_PRIVATE_KEY: &str =
        include_str!("../../tests/fixtures/test_service_account_key.pem");

    pub(crate) fn write_key_file(dir: &Path, token_uri: &str) -> std::path::PathBuf {
        let path = dir.join("service_account.json");
        let body = json!({
            "type": "service_account",
            "client_email": "pilot@project.iam.gserviceaccount.com",
            "private_key": TEST_PRIVATE_KEY,
            "token_uri": token_uri,
        });
        std::fs::write(&path, body.to_string()).unwrap();
        path
    }

    #[test]
    fn key_file_defaults_token_uri() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sa.json");
        std::fs::write(
            &path,
            json!({"client_email": "a@b", "private_key": TEST_PRIVATE_KEY}).to_string(),
        )
        .unwrap();

        let key = ServiceAccountKey::from_file(&path).unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn missing_key_file_is_reported() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/sa.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.to_string().contains("service account file"));
    }

    #[test]
    fn assertion_carries_issuer_scope_and_audience() {
        let key = ServiceAccountKey {
            client_email: "pilot@example".into(),
            private_key: TEST_PRIVATE_KEY.into(),
            token_uri: "https://token.example/token".into(),
        };

        let jwt = sign_assertion(&key, SHEETS_SCOPE, 1_700_000_000).unwrap();

        // Claims are readable without verifying the signature.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_audience(&["https://token.example/token"]);
        let data = jsonwebtoken::decode::<serde_json::Value>(
            &jwt,
            &DecodingKey::from_secret(b"unused"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims["iss"], "pilot@example");
        assert_eq!(data.claims["scope"], SHEETS_SCOPE);
        assert_eq!(data.claims["exp"], 1_700_003_600);
    }

    #[tokio::test]
    async fn token_exchange_posts_jwt_bearer_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.token",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let key_path = write_key_file(tmp.path(), &format!("{}/token", server.uri()));
        let key = ServiceAccountKey::from_file(&key_path).unwrap();

        let token = fetch_access_token(&reqwest::Client::new(), &key, SHEETS_SCOPE, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(token, "ya29.token");
    }

    #[tokio::test]
    async fn token_rejection_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let key_path = write_key_file(tmp.path(), &format!("{}/token", server.uri()));
        let key = ServiceAccountKey::from_file(&key_path).unwrap();

        let err = fetch_access_token(&reqwest::Client::new(), &key, SHEETS_SCOPE, TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn stalled_token_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "late"}))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let key_path = write_key_file(tmp.path(), &format!("{}/token", server.uri()));
        let key = ServiceAccountKey::from_file(&key_path).unwrap();

        let started = std::time::Instant::now();
        let err = fetch_access_token(
            &reqwest::Client::new(),
            &key,
            SHEETS_SCOPE,
            Duration::from_millis(300),
        )
        .await
        .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(
            err,
            PilotError::Transport(TransportError::Timeout { .. })
        ));
    }
}
