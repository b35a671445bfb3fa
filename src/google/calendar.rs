use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::GoogleConfig;
use crate::error::AppError;
use crate::google::oauth;
use crate::models::User;

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_MAX_RESULTS: u32 = 10;
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Start or end of a calendar event: a timed instant or an all-day date.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// The subset of the provider's event resource this application reads and
/// returns to its own clients.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

/// Input for creating or fully overwriting a calendar event.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub title: String,
    pub description: Option<String>,
    pub start_date_time: Option<DateTime<Utc>>,
    pub end_date_time: Option<DateTime<Utc>>,
}

/// Client for the authenticated user's primary calendar.
///
/// Holds the stored access/refresh token pair. When the provider answers 401
/// the client redeems the refresh token once and retries; the fresh access
/// token is exposed through `refreshed_access_token` so callers can persist
/// it. Operations do not retry beyond that single redemption.
pub struct CalendarClient {
    http: Client,
    google: GoogleConfig,
    access_token: String,
    refresh_token: Option<String>,
    refreshed: bool,
}

impl CalendarClient {
    pub fn new(google: GoogleConfig, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            google,
            access_token,
            refresh_token,
            refreshed: false,
        }
    }

    /// Builds a client from a user's stored Google credentials.
    pub fn for_user(google: GoogleConfig, user: &User) -> Result<Self, AppError> {
        let access_token = user.google_access_token.clone().ok_or_else(|| {
            AppError::BadRequest("User not authenticated with Google".to_string())
        })?;
        Ok(Self::new(
            google,
            access_token,
            user.google_refresh_token.clone(),
        ))
    }

    /// The access token obtained by refresh during this client's lifetime,
    /// if any. Callers persist it so the next request starts out valid.
    pub fn refreshed_access_token(&self) -> Option<&str> {
        self.refreshed.then(|| self.access_token.as_str())
    }

    /// Lists events from the primary calendar, ordered by start time, with
    /// recurring events expanded into individual instances.
    pub async fn list_events(
        &mut self,
        time_min: Option<DateTime<Utc>>,
        time_max: Option<DateTime<Utc>>,
        max_results: Option<u32>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let (time_min, time_max) = list_window(time_min, time_max, Utc::now());
        let query = [
            ("timeMin", time_min.to_rfc3339()),
            ("timeMax", time_max.to_rfc3339()),
            (
                "maxResults",
                max_results.unwrap_or(DEFAULT_MAX_RESULTS).to_string(),
            ),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];

        let url = format!("{}/calendars/primary/events", CALENDAR_API);
        let response = self.send(Method::GET, &url, &query, None).await?;
        let list = response.json::<EventList>().await?;
        Ok(list.items)
    }

    /// Creates an event on the primary calendar.
    pub async fn create_event(&mut self, input: &EventInput) -> Result<CalendarEvent, AppError> {
        let url = format!("{}/calendars/primary/events", CALENDAR_API);
        let body = event_payload(input, Utc::now());
        let response = self.send(Method::POST, &url, &[], Some(body)).await?;
        Ok(response.json::<CalendarEvent>().await?)
    }

    /// Fully overwrites an event's summary, description, start, and end.
    pub async fn update_event(
        &mut self,
        event_id: &str,
        input: &EventInput,
    ) -> Result<CalendarEvent, AppError> {
        let url = format!("{}/calendars/primary/events/{}", CALENDAR_API, event_id);
        let body = event_payload(input, Utc::now());
        let response = self.send(Method::PUT, &url, &[], Some(body)).await?;
        Ok(response.json::<CalendarEvent>().await?)
    }

    /// Deletes an event. A provider-side "already gone" surfaces as a
    /// provider error like any other non-success status.
    pub async fn delete_event(&mut self, event_id: &str) -> Result<(), AppError> {
        let url = format!("{}/calendars/primary/events/{}", CALENDAR_API, event_id);
        self.send(Method::DELETE, &url, &[], None).await?;
        Ok(())
    }

    async fn send(
        &mut self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, AppError> {
        let response = self
            .request(method.clone(), url, query, body.as_ref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.refresh().await?;
            let response = self.request(method, url, query, body.as_ref()).await?;
            return check_status(response);
        }

        check_status(response)
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, AppError> {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.access_token)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    async fn refresh(&mut self) -> Result<(), AppError> {
        let refresh_token = self.refresh_token.as_deref().ok_or_else(|| {
            AppError::CalendarProvider(
                "access token expired and no refresh token is stored".to_string(),
            )
        })?;

        let tokens = oauth::refresh_access_token(&self.http, &self.google, refresh_token).await?;
        self.access_token = tokens.access_token;
        self.refreshed = true;
        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(AppError::CalendarProvider(format!(
            "calendar API returned status {}",
            response.status()
        )))
    }
}

/// Resolves the listing window: defaults to now through now + 30 days.
fn list_window(
    time_min: Option<DateTime<Utc>>,
    time_max: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        time_min.unwrap_or(now),
        time_max.unwrap_or(now + Duration::days(DEFAULT_WINDOW_DAYS)),
    )
}

/// Builds the provider event resource: start defaults to `now`, end defaults
/// to start + 1 hour, both pinned to UTC.
fn event_payload(input: &EventInput, now: DateTime<Utc>) -> serde_json::Value {
    let start = input.start_date_time.unwrap_or(now);
    let end = input.end_date_time.unwrap_or(start + Duration::hours(1));

    json!({
        "summary": input.title,
        "description": input.description.clone().unwrap_or_default(),
        "start": { "dateTime": start.to_rfc3339(), "timeZone": "UTC" },
        "end": { "dateTime": end.to_rfc3339(), "timeZone": "UTC" },
    })
}
