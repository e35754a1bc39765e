/// Database models for TaskDesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts (login identity, flags)
/// - `profile`: User profiles (names, position), one per account
/// - `position`: Organizational positions, grouped by category
/// - `category`: Categories for positions and tasks
/// - `priority`: Task priority levels
/// - `status`: Task workflow states
/// - `task`: Tasks, their team membership, and loaded detail rows
/// - `resource`: Per-task resource links
///
/// Account and profile rows are only ever created together through
/// [`crate::accounts`]; the model files deliberately carry no independent
/// insert for them.
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskdesk_shared::models::category::{Category, CreateCategory};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let category = Category::create(
///     &pool,
///     CreateCategory {
///         name: "Development".to_string(),
///         description: "Software development department".to_string(),
///     },
/// )
/// .await?;
/// println!("Created category {}", category.id);
/// # Ok(())
/// # }
/// ```

pub mod category;
pub mod position;
pub mod priority;
pub mod profile;
pub mod resource;
pub mod status;
pub mod task;
pub mod user;
