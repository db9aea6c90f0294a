//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session`: bearer token and cached user profile
//! - `CookieJar`: persistent storage for session cookies, with file,
//!   in-memory and OS keychain backends
//!
//! Session cookies expire one day after they are written.

pub mod credentials;
pub mod jar;
pub mod session;

pub use credentials::KeyringCookieJar;
pub use jar::{CookieJar, FileCookieJar, MemoryCookieJar, StoredCookie};
pub use session::{Session, TOKEN_COOKIE, USER_COOKIE};
