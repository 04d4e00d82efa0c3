pub mod annotator;
pub mod auth;
pub mod config;
pub mod conflict;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod poller;
pub mod profanity;
pub mod routes;
pub mod schema;
pub mod state;
pub mod utils;
pub mod visibility;
