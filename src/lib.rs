//! Conduit - blogging platform backend
//!
//! Accounts with token authentication, public profiles with follows,
//! articles with tags and favorites, and comments, served as a JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
