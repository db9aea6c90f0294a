//! REST API client module for the StoryTime story service.
//!
//! This module provides the `StoryClient` for listing, creating, editing,
//! deleting and bookmarking stories, plus the signed-in user's profile.
//!
//! Authenticated endpoints take a bearer token carried by the client; see
//! `Session::authorize` for building one from a session.

pub mod client;
pub mod error;
pub mod query;

pub use client::StoryClient;
pub use error::{ApiError, ApiResult};
pub use query::StoryQuery;
