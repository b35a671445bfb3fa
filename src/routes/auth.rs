use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, CurrentUser, LoginRequest,
        RegisterRequest,
    },
    config::Config,
    error::AppError,
    google::oauth,
    models::{PublicUser, User},
};
use actix_web::{get, http::header, post, web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a local email/password account and returns a session token with
/// the public user projection.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    // Check if email already exists
    let existing_user = sqlx::query("SELECT id FROM users WHERE email = $1")
        .bind(&register_data.email)
        .fetch_optional(&**pool)
        .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password(&register_data.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash, auth_provider) \
         VALUES ($1, $2, $3, 'local') RETURNING {}",
        User::COLUMNS
    ))
    .bind(&register_data.name)
    .bind(&register_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await?;

    let token = generate_token(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Login user
///
/// Authenticates an email/password account. Unknown email and wrong password
/// produce the same generic message so accounts cannot be enumerated by
/// probing. An account that only has Google credentials gets pointed at the
/// Google sign-in instead.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        User::COLUMNS
    ))
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    let user = match user {
        Some(user) => user,
        None => return Err(AppError::BadRequest("Invalid credentials".into())),
    };

    let password_hash = match &user.password_hash {
        Some(hash) => hash,
        None => return Err(AppError::BadRequest("Please sign in with Google".into())),
    };

    if !verify_password(&login_data.password, password_hash)? {
        return Err(AppError::BadRequest("Invalid credentials".into()));
    }

    let token = generate_token(user.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Begin Google sign-in
///
/// Redirects the client to Google's consent screen, requesting identity and
/// calendar scopes with offline access.
#[get("/google")]
pub async fn google_consent(config: web::Data<Config>) -> Result<impl Responder, AppError> {
    if config.google.client_id.is_empty() {
        return Err(AppError::InternalServerError(
            "Google OAuth is not configured".into(),
        ));
    }

    let url = oauth::consent_url(&config.google);
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, url))
        .finish())
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// Google OAuth callback
///
/// Exchanges the authorization code for tokens, creates or updates the
/// matching user, and redirects back to the frontend with a session token in
/// the query string. Any failure redirects to the frontend login page with an
/// error marker instead of surfacing a JSON error.
#[get("/google/callback")]
pub async fn google_callback(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    query: web::Query<GoogleCallbackQuery>,
) -> impl Responder {
    match link_google_account(&pool, &config, query.into_inner()).await {
        Ok(token) => {
            let location = format!("{}?token={}", config.frontend_url, token);
            HttpResponse::Found()
                .insert_header((header::LOCATION, location))
                .finish()
        }
        Err(err) => {
            log::error!("Google callback failed: {}", err);
            let location = format!("{}/login?error=oauth_failed", config.frontend_url);
            HttpResponse::Found()
                .insert_header((header::LOCATION, location))
                .finish()
        }
    }
}

async fn link_google_account(
    pool: &PgPool,
    config: &Config,
    query: GoogleCallbackQuery,
) -> Result<String, AppError> {
    if let Some(error) = query.error {
        return Err(AppError::CalendarProvider(format!(
            "consent was denied: {}",
            error
        )));
    }
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let http = reqwest::Client::new();
    let tokens = oauth::exchange_code(&http, &config.google, &code).await?;
    let profile = oauth::fetch_profile(&http, &tokens.access_token).await?;

    let existing = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE google_id = $1",
        User::COLUMNS
    ))
    .bind(&profile.id)
    .fetch_optional(pool)
    .await?;

    let user = match existing {
        // Known account: replace the access token. Repeat consent may omit
        // the refresh token, so an absent one never clears the stored value.
        Some(user) => {
            sqlx::query_as::<_, User>(&format!(
                "UPDATE users SET google_access_token = $1, \
                 google_refresh_token = COALESCE($2, google_refresh_token) \
                 WHERE id = $3 RETURNING {}",
                User::COLUMNS
            ))
            .bind(&tokens.access_token)
            .bind(&tokens.refresh_token)
            .bind(user.id)
            .fetch_one(pool)
            .await?
        }
        None => {
            let name = profile.name.as_deref().unwrap_or(&profile.email);
            sqlx::query_as::<_, User>(&format!(
                "INSERT INTO users (name, email, google_id, google_access_token, \
                 google_refresh_token, auth_provider) \
                 VALUES ($1, $2, $3, $4, $5, 'google') RETURNING {}",
                User::COLUMNS
            ))
            .bind(name)
            .bind(&profile.email)
            .bind(&profile.id)
            .bind(&tokens.access_token)
            .bind(&tokens.refresh_token)
            .fetch_one(pool)
            .await?
        }
    };

    generate_token(user.id)
}

/// Get current user
///
/// Returns the public projection of the authenticated user.
#[get("/current_user")]
pub async fn current_user(user: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(PublicUser::from(&user.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_query_shapes() {
        let success: GoogleCallbackQuery =
            serde_json::from_value(serde_json::json!({ "code": "4/abc" })).unwrap();
        assert_eq!(success.code.as_deref(), Some("4/abc"));
        assert!(success.error.is_none());

        let denied: GoogleCallbackQuery =
            serde_json::from_value(serde_json::json!({ "error": "access_denied" })).unwrap();
        assert!(denied.code.is_none());
        assert_eq!(denied.error.as_deref(), Some("access_denied"));
    }
}
