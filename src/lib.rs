#![doc = "The `taskpilot` library crate."]
#![doc = ""]
#![doc = "This crate contains the domain models, authentication mechanisms, Google"]
#![doc = "OAuth/Calendar client, routing configuration, and error handling for the"]
#![doc = "TaskPilot application. It is used by the main binary (`main.rs`) to"]
#![doc = "construct and run the HTTP server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod google;
pub mod models;
pub mod routes;
