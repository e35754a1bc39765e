//! Representation layer
//!
//! Response-shaped views over the domain models. Views replace internal
//! ids with human-readable values (emails for people, names/captions for
//! reference rows), never expose password hashes, and pin timestamp
//! formats so responses don't drift with serializer defaults.
//!
//! Task views additionally carry the visibility decision: a task the
//! caller may not see projects to an empty object instead of being
//! omitted, so list positions stay stable across callers.

pub mod account;
pub mod task;

pub use account::{AccountView, CategoryMode, CategoryRef, CategoryView, PositionView, ProfileView};
pub use task::{project_task, ResourceView, TaskProjection, TaskView};

/// Fixed-format timestamp serialization
pub(crate) mod timestamps {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    /// ISO-8601 with microseconds and a literal Z suffix
    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn serialize_option<S>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }
}
