//! TourStack backend: JSON API for authoring guided-tour content, with
//! Google Translate / Text-to-Speech / Vision proxy routes.

pub mod config;
pub mod db;
pub mod errors;
pub mod google;
pub mod handlers;
pub mod models;
pub mod storage;
pub mod validate;
