use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::GoogleConfig;
use crate::error::AppError;

const OAUTH_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes requested at consent: identity plus full calendar access.
const SCOPES: &str = "openid email profile https://www.googleapis.com/auth/calendar";

/// Token material returned by Google's token endpoint.
///
/// `refresh_token` is only present on the first consent (or when consent is
/// forced); refresh responses and repeat exchanges may omit it.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
}

/// Profile fields from the userinfo endpoint.
#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    /// Google's stable account identifier.
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Builds the consent-screen URL the client is redirected to.
///
/// `access_type=offline` requests a refresh token; `prompt=consent` forces
/// the consent screen so a refresh token is issued even on repeat logins.
pub fn consent_url(google: &GoogleConfig) -> String {
    let url = Url::parse_with_params(
        OAUTH_AUTH_URL,
        &[
            ("client_id", google.client_id.as_str()),
            ("redirect_uri", google.callback_url.as_str()),
            ("response_type", "code"),
            ("scope", SCOPES),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .expect("consent URL is well-formed");
    url.to_string()
}

/// Exchanges an authorization code for access and refresh tokens.
pub async fn exchange_code(
    http: &Client,
    google: &GoogleConfig,
    code: &str,
) -> Result<TokenResponse, AppError> {
    let params = [
        ("code", code),
        ("client_id", google.client_id.as_str()),
        ("client_secret", google.client_secret.as_str()),
        ("redirect_uri", google.callback_url.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let response = http.post(OAUTH_TOKEN_URL).form(&params).send().await?;
    if !response.status().is_success() {
        return Err(AppError::CalendarProvider(format!(
            "code exchange failed with status {}",
            response.status()
        )));
    }

    Ok(response.json::<TokenResponse>().await?)
}

/// Redeems a refresh token for a fresh access token.
pub async fn refresh_access_token(
    http: &Client,
    google: &GoogleConfig,
    refresh_token: &str,
) -> Result<TokenResponse, AppError> {
    let params = [
        ("refresh_token", refresh_token),
        ("client_id", google.client_id.as_str()),
        ("client_secret", google.client_secret.as_str()),
        ("grant_type", "refresh_token"),
    ];

    let response = http.post(OAUTH_TOKEN_URL).form(&params).send().await?;
    if !response.status().is_success() {
        return Err(AppError::CalendarProvider(format!(
            "token refresh failed with status {}",
            response.status()
        )));
    }

    Ok(response.json::<TokenResponse>().await?)
}

/// Fetches the authenticated account's profile (id, email, display name).
pub async fn fetch_profile(http: &Client, access_token: &str) -> Result<GoogleProfile, AppError> {
    let response = http
        .get(USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(AppError::CalendarProvider(format!(
            "userinfo request failed with status {}",
            response.status()
        )));
    }

    Ok(response.json::<GoogleProfile>().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> GoogleConfig {
        GoogleConfig {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
            client_secret: "shhh".to_string(),
            callback_url: "http://localhost:8080/api/auth/google/callback".to_string(),
        }
    }

    #[test]
    fn test_consent_url_carries_offline_forced_consent() {
        let url = consent_url(&sample_config());

        assert!(url.starts_with(OAUTH_AUTH_URL));
        assert!(url.contains("client_id=client-123.apps.googleusercontent.com"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("response_type=code"));
        // Calendar scope rides along with the identity scopes.
        assert!(url.contains("calendar"));
    }

    #[test]
    fn test_token_response_tolerates_missing_refresh_token() {
        let parsed: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        }))
        .unwrap();

        assert_eq!(parsed.access_token, "ya29.fresh");
        assert!(parsed.refresh_token.is_none());
        assert_eq!(parsed.expires_in, 3599);
    }

    #[test]
    fn test_profile_tolerates_missing_name() {
        let parsed: GoogleProfile = serde_json::from_value(serde_json::json!({
            "id": "1045",
            "email": "ada@example.com",
            "verified_email": true
        }))
        .unwrap();

        assert_eq!(parsed.id, "1045");
        assert!(parsed.name.is_none());
    }
}
