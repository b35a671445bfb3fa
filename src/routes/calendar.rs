use crate::{
    auth::CurrentUser,
    config::Config,
    error::AppError,
    google::{CalendarClient, EventInput},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

/// Query parameters for listing calendar events.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_results: Option<u32>,
}

/// Lists events from the user's primary calendar.
///
/// Defaults to the next 30 days and at most 10 events; recurring events come
/// back expanded and ordered by start time.
#[get("/events")]
pub async fn get_events(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user: CurrentUser,
    query: web::Query<EventListQuery>,
) -> Result<impl Responder, AppError> {
    let mut client = CalendarClient::for_user(config.google.clone(), &user.0)?;
    let events = client
        .list_events(query.start_date, query.end_date, query.max_results)
        .await?;

    persist_refreshed_token(&pool, user.0.id, &client).await?;
    Ok(HttpResponse::Ok().json(events))
}

/// Creates an event on the user's primary calendar.
#[post("/events")]
pub async fn create_event(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user: CurrentUser,
    event_data: web::Json<EventInput>,
) -> Result<impl Responder, AppError> {
    let mut client = CalendarClient::for_user(config.google.clone(), &user.0)?;
    let event = client.create_event(&event_data).await?;

    persist_refreshed_token(&pool, user.0.id, &client).await?;
    Ok(HttpResponse::Ok().json(event))
}

/// Overwrites an event's summary, description, start, and end.
#[put("/events/{event_id}")]
pub async fn update_event(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user: CurrentUser,
    event_id: web::Path<String>,
    event_data: web::Json<EventInput>,
) -> Result<impl Responder, AppError> {
    let mut client = CalendarClient::for_user(config.google.clone(), &user.0)?;
    let event = client.update_event(&event_id, &event_data).await?;

    persist_refreshed_token(&pool, user.0.id, &client).await?;
    Ok(HttpResponse::Ok().json(event))
}

/// Deletes an event from the user's primary calendar.
#[delete("/events/{event_id}")]
pub async fn delete_event(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user: CurrentUser,
    event_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let mut client = CalendarClient::for_user(config.google.clone(), &user.0)?;
    client.delete_event(&event_id).await?;

    persist_refreshed_token(&pool, user.0.id, &client).await?;
    Ok(HttpResponse::Ok().json(json!({ "msg": "Event deleted" })))
}

/// Reports the user's calendar connection and sync preference.
///
/// Answered from stored state alone; no round-trip to the provider.
#[get("/sync-status")]
pub async fn sync_status(user: CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(json!({
        "isConnected": user.0.has_google_credentials(),
        "calendarSyncEnabled": user.0.calendar_sync_enabled,
        "lastSynced": user.0.last_synced,
    })))
}

/// Toggles the calendar-sync preference.
///
/// Enabling stamps `last_synced` with the current time. The flag is a stored
/// preference only; no background process acts on it.
#[post("/toggle-sync")]
pub async fn toggle_sync(
    pool: web::Data<PgPool>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    if !user.0.has_google_credentials() {
        return Err(AppError::BadRequest(
            "User not authenticated with Google".into(),
        ));
    }

    // References to calendar_sync_enabled on the right-hand side read the
    // pre-update value, so the CASE stamps last_synced exactly when enabling.
    let (enabled, last_synced) = sqlx::query_as::<_, (bool, Option<DateTime<Utc>>)>(
        "UPDATE users SET \
           calendar_sync_enabled = NOT calendar_sync_enabled, \
           last_synced = CASE WHEN NOT calendar_sync_enabled THEN now() ELSE last_synced END \
         WHERE id = $1 \
         RETURNING calendar_sync_enabled, last_synced",
    )
    .bind(user.0.id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "calendarSyncEnabled": enabled,
        "lastSynced": last_synced,
    })))
}

/// Writes back an access token the client obtained by silent refresh, so the
/// next request starts with a valid token instead of refreshing again.
async fn persist_refreshed_token(
    pool: &PgPool,
    user_id: i32,
    client: &CalendarClient,
) -> Result<(), AppError> {
    if let Some(token) = client.refreshed_access_token() {
        sqlx::query("UPDATE users SET google_access_token = $1 WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}
