//! VidTube - video sharing backend
//!
//! Accounts with rotating session tokens, videos, comments, playlists, likes
//! and channel subscriptions over SQLite, served through axum.

pub mod account;
pub mod aggregate;
pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod context;
pub mod db;
pub mod error;
pub mod ids;
pub mod media;
pub mod response;
pub mod server;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;
