//! # TaskDesk API Server Library
//!
//! This library provides the HTTP surface for TaskDesk: account and task
//! endpoints glued onto the shared domain layer.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Principal extraction from request credentials
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
