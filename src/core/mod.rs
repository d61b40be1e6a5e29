//! Signing, transport and polling core

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod multipart;
pub mod poller;
pub mod storage;
