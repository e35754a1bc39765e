/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `accounts`: User account endpoints (create, list, retrieve, update, delete)
/// - `tasks`: Task endpoints (create, list, retrieve, update, team membership)

pub mod accounts;
pub mod health;
pub mod tasks;
