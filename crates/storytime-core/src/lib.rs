//! Core library for StoryTime: the story API client, data models and the
//! cookie-persisted user session.
//!
//! A front end restores a [`Session`] from a [`CookieJar`], derives an
//! authorized [`StoryClient`] from it and calls the data-access methods.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiError, ApiResult, StoryClient, StoryQuery};
pub use auth::{CookieJar, FileCookieJar, KeyringCookieJar, MemoryCookieJar, Session};
pub use config::{Config, CookieStore};
