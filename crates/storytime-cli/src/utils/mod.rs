//! Utility functions for terminal formatting.

pub mod format;

pub use format::{bookmark_line, category_line, story_detail, story_line};
