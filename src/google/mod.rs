//! Google integration: the OAuth consent/token flow and a thin client for
//! the Calendar v3 API, both speaking plain HTTPS via `reqwest`.

pub mod calendar;
pub mod oauth;

pub use calendar::{CalendarClient, CalendarEvent, EventInput};
pub use oauth::{consent_url, exchange_code, fetch_profile, refresh_access_token, GoogleProfile};
