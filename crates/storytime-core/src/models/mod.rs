//! Data models for StoryTime entities.
//!
//! - `Story`, `Category`, `Bookmark`: records returned by the story API
//! - `UserProfile`: the signed-in user's opaque profile object
//! - `Envelope`: the `{ status, message, data }` body wrapper
//! - `NewStory`, `StoryUpdate`, `Upload`: request-side types

pub mod de;
pub mod draft;
pub mod envelope;
pub mod story;
pub mod user;

pub use draft::{NewStory, StoryPayload, StoryUpdate, Upload};
pub use envelope::{extract_list, Envelope};
pub use story::{Bookmark, Category, Story};
pub use user::UserProfile;
