/// Task model and database operations
///
/// Tasks are the unit of work: owned by one profile, worked on by a team of
/// member profiles, categorized and prioritized by reference rows. This
/// module also owns the membership set operations (batch add, single
/// remove, and the transactional full update that can replace the team)
/// and the [`TaskDetail`] aggregate the projection layer feeds on.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     due_date DATE NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     completed_at TIMESTAMPTZ,
///     category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
///     priority_id BIGINT NOT NULL REFERENCES priorities(id) ON DELETE RESTRICT,
///     status_id BIGINT REFERENCES statuses(id) ON DELETE RESTRICT,
///     owner_id BIGINT NOT NULL REFERENCES user_profiles(id) ON DELETE RESTRICT
/// );
///
/// CREATE TABLE task_members (
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     profile_id BIGINT NOT NULL REFERENCES user_profiles(id) ON DELETE CASCADE,
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (task_id, profile_id)
/// );
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::DomainError;
use crate::models::resource::TaskResource;
use crate::policy::TaskFacts;

/// A task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,

    pub title: String,

    pub description: String,

    /// Due date, date-only
    pub due_date: NaiveDate,

    /// Server-assigned on insert; immutable afterwards
    pub created_at: DateTime<Utc>,

    /// Set when the task is marked complete; NULL while open
    pub completed_at: Option<DateTime<Utc>>,

    pub category_id: i64,

    pub priority_id: i64,

    pub status_id: Option<i64>,

    /// Owning profile (not account) id
    pub owner_id: i64,
}

/// Input for creating a task
///
/// `owner_id` is always the creating caller's profile; handlers never take
/// it from the request body.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub category_id: i64,
    pub priority_id: i64,
    pub status_id: Option<i64>,
    pub owner_id: i64,
}

/// Input for updating a task; only non-None fields are touched
///
/// `completed_at` and `status_id` are clearable: use Some(None) to reset
/// them to NULL.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub category_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub status_id: Option<Option<i64>>,
    pub owner_id: Option<i64>,
}

/// One team member of a task, in representation form
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskMember {
    pub profile_id: i64,
    pub email: String,
}

const TASK_COLUMNS: &str = "id, title, description, due_date, created_at, completed_at, \
                            category_id, priority_id, status_id, owner_id";

impl Task {
    /// Creates a new task
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced category/priority/status/profile
    /// doesn't exist or the database is unreachable
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (title, description, due_date, category_id, priority_id, status_id, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.due_date)
            .bind(data.category_id)
            .bind(data.priority_id)
            .bind(data.status_id)
            .bind(data.owner_id)
            .fetch_one(pool)
            .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Updates a task
    ///
    /// Returns the updated row, or None if the id doesn't exist. The
    /// creation timestamp is never touched.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::update_columns(&mut *conn, id, data).await
    }

    /// Column-update worker shared by [`Task::update`] and
    /// [`Task::apply_update`]; runs on whatever connection the caller is
    /// holding so it can join an open transaction.
    async fn update_columns(
        conn: &mut sqlx::PgConnection,
        id: i64,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut clauses = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            clauses.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            clauses.push(format!("description = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            clauses.push(format!("due_date = ${}", bind_count));
        }
        if data.completed_at.is_some() {
            bind_count += 1;
            clauses.push(format!("completed_at = ${}", bind_count));
        }
        if data.category_id.is_some() {
            bind_count += 1;
            clauses.push(format!("category_id = ${}", bind_count));
        }
        if data.priority_id.is_some() {
            bind_count += 1;
            clauses.push(format!("priority_id = ${}", bind_count));
        }
        if data.status_id.is_some() {
            bind_count += 1;
            clauses.push(format!("status_id = ${}", bind_count));
        }
        if data.owner_id.is_some() {
            bind_count += 1;
            clauses.push(format!("owner_id = ${}", bind_count));
        }

        if clauses.is_empty() {
            let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
            return sqlx::query_as::<_, Task>(&query)
                .bind(id)
                .fetch_optional(conn)
                .await;
        }

        let query = format!(
            "UPDATE tasks SET {} WHERE id = $1 RETURNING {TASK_COLUMNS}",
            clauses.join(", ")
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(completed_at) = data.completed_at {
            q = q.bind(completed_at);
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }
        if let Some(priority_id) = data.priority_id {
            q = q.bind(priority_id);
        }
        if let Some(status_id) = data.status_id {
            q = q.bind(status_id);
        }
        if let Some(owner_id) = data.owner_id {
            q = q.bind(owner_id);
        }

        q.fetch_optional(conn).await
    }

    /// Deletes a task; memberships and resources cascade away with it
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the team members of a task in a stable order
    ///
    /// Ordered by `added_at`, then `profile_id`. Members added in the same
    /// transaction share one `added_at` (it defaults to the transaction's
    /// `NOW()`), so within a batch the profile id decides the order; across
    /// batches, earlier additions come first.
    pub async fn members(pool: &PgPool, task_id: i64) -> Result<Vec<TaskMember>, sqlx::Error> {
        sqlx::query_as::<_, TaskMember>(
            r#"
            SELECT tm.profile_id, ua.email
            FROM task_members tm
            JOIN user_profiles up ON up.id = tm.profile_id
            JOIN user_accounts ua ON ua.id = up.account_id
            WHERE tm.task_id = $1
            ORDER BY tm.added_at, tm.profile_id
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Lists the team member emails of a task, ordered as [`Task::members`]
    pub async fn member_emails(pool: &PgPool, task_id: i64) -> Result<Vec<String>, sqlx::Error> {
        let members = Self::members(pool, task_id).await?;
        Ok(members.into_iter().map(|m| m.email).collect())
    }

    /// Adds a batch of team members by their ACCOUNT ids, all-or-nothing
    ///
    /// Every account id is resolved to its profile inside one transaction;
    /// an unknown id aborts the whole batch and nothing is persisted.
    /// Adding an account that is already a member is a no-op (membership is
    /// a set).
    ///
    /// Returns the member email list after the mutation, ordered as
    /// [`Task::members`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ReferenceNotFound` naming the first account id
    /// that doesn't resolve to a profile
    pub async fn add_members(
        pool: &PgPool,
        task_id: i64,
        account_ids: &[i64],
    ) -> Result<Vec<String>, DomainError> {
        let mut tx = pool.begin().await?;

        for &account_id in account_ids {
            let profile_id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM user_profiles WHERE account_id = $1")
                    .bind(account_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let profile_id =
                profile_id.ok_or_else(|| DomainError::unknown_team_member(account_id))?;

            sqlx::query(
                "INSERT INTO task_members (task_id, profile_id) VALUES ($1, $2) \
                 ON CONFLICT (task_id, profile_id) DO NOTHING",
            )
            .bind(task_id)
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Self::member_emails(pool, task_id).await?)
    }

    /// Removes a single team member by ACCOUNT id
    ///
    /// Returns the member email list after the removal.
    ///
    /// # Errors
    ///
    /// - `DomainError::ReferenceNotFound` if the account id doesn't resolve
    /// - `DomainError::NotTeamMember` if the account exists but isn't on the
    ///   team
    pub async fn remove_member(
        pool: &PgPool,
        task_id: i64,
        account_id: i64,
    ) -> Result<Vec<String>, DomainError> {
        let profile_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM user_profiles WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(pool)
                .await?;

        let profile_id = profile_id.ok_or_else(|| DomainError::unknown_team_member(account_id))?;

        let result = sqlx::query("DELETE FROM task_members WHERE task_id = $1 AND profile_id = $2")
            .bind(task_id)
            .bind(profile_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotTeamMember {
                task_id,
                account_id,
            });
        }

        Ok(Self::member_emails(pool, task_id).await?)
    }

    /// Applies a full update in one transaction: optionally replaces the
    /// whole team with the given PROFILE ids, then updates the columns.
    ///
    /// This is the admin full-update path; the team endpoints use
    /// [`Task::add_members`]/[`Task::remove_member`] with account ids.
    /// Nothing is persisted unless every part succeeds, so a bad owner id
    /// cannot leave a half-replaced team behind.
    ///
    /// Returns the updated row, or None if the id doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ReferenceNotFound` naming the first profile id
    /// that doesn't exist, or the new owner id if that profile is missing
    pub async fn apply_update(
        pool: &PgPool,
        task_id: i64,
        data: UpdateTask,
        team_profile_ids: Option<&[i64]>,
    ) -> Result<Option<Self>, DomainError> {
        let mut tx = pool.begin().await?;

        if let Some(profile_ids) = team_profile_ids {
            sqlx::query("DELETE FROM task_members WHERE task_id = $1")
                .bind(task_id)
                .execute(&mut *tx)
                .await?;

            for &profile_id in profile_ids {
                sqlx::query(
                    "INSERT INTO task_members (task_id, profile_id) VALUES ($1, $2) \
                     ON CONFLICT (task_id, profile_id) DO NOTHING",
                )
                .bind(task_id)
                .bind(profile_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| match &e {
                    sqlx::Error::Database(db_err)
                        if db_err
                            .constraint()
                            .map(|c| c.contains("profile"))
                            .unwrap_or(false) =>
                    {
                        DomainError::unknown_pk("team_members", profile_id)
                    }
                    _ => DomainError::Database(e),
                })?;
            }
        }

        let owner_id = data.owner_id;
        let task = Self::update_columns(&mut *tx, task_id, data)
            .await
            .map_err(|e| match (&e, owner_id) {
                (sqlx::Error::Database(db_err), Some(owner_id))
                    if db_err
                        .constraint()
                        .map(|c| c.contains("owner"))
                        .unwrap_or(false) =>
                {
                    DomainError::unknown_pk("owner", owner_id)
                }
                _ => DomainError::Database(e),
            })?;

        tx.commit().await?;

        Ok(task)
    }
}

/// A task joined with its slugs, owner email, team, and resources — the
/// complete representation-layer input, and the source of the policy facts
/// for object-level decisions.
#[derive(Debug, Clone)]
pub struct TaskDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Category name (slug form)
    pub category: String,

    /// Priority caption (slug form)
    pub priority: String,

    /// Status caption (slug form), if any
    pub status: Option<String>,

    /// Owning profile id
    pub owner_id: i64,

    /// Owner's account email
    pub owner_email: String,

    /// Team members, ordered as [`Task::members`]
    pub members: Vec<TaskMember>,

    /// Attached resources
    pub resources: Vec<TaskResource>,
}

#[derive(sqlx::FromRow)]
struct TaskDetailRow {
    id: i64,
    title: String,
    description: String,
    due_date: NaiveDate,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    category: String,
    priority: String,
    status: Option<String>,
    owner_id: i64,
    owner_email: String,
}

const TASK_DETAIL_QUERY: &str = r#"
    SELECT t.id, t.title, t.description, t.due_date, t.created_at, t.completed_at,
           c.name AS category, pr.caption AS priority, s.caption AS status,
           t.owner_id, ua.email AS owner_email
    FROM tasks t
    JOIN categories c ON c.id = t.category_id
    JOIN priorities pr ON pr.id = t.priority_id
    LEFT JOIN statuses s ON s.id = t.status_id
    JOIN user_profiles up ON up.id = t.owner_id
    JOIN user_accounts ua ON ua.id = up.account_id
"#;

impl TaskDetail {
    /// Loads one task with slugs, owner email, team, and resources
    pub async fn load(pool: &PgPool, task_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{TASK_DETAIL_QUERY} WHERE t.id = $1");

        let row = sqlx::query_as::<_, TaskDetailRow>(&query)
            .bind(task_id)
            .fetch_optional(pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let members = Task::members(pool, task_id).await?;
        let resources = TaskResource::list_for_task(pool, task_id).await?;

        Ok(Some(Self::assemble(row, members, resources)))
    }

    /// Loads every task in creation order
    pub async fn load_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("{TASK_DETAIL_QUERY} ORDER BY t.created_at, t.id");

        let rows = sqlx::query_as::<_, TaskDetailRow>(&query)
            .fetch_all(pool)
            .await?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            let members = Task::members(pool, row.id).await?;
            let resources = TaskResource::list_for_task(pool, row.id).await?;
            details.push(Self::assemble(row, members, resources));
        }

        Ok(details)
    }

    /// The ownership/membership facts the policy engine evaluates.
    pub fn facts(&self) -> TaskFacts {
        TaskFacts {
            owner_profile_id: self.owner_id,
            member_profile_ids: self.members.iter().map(|m| m.profile_id).collect(),
        }
    }

    fn assemble(row: TaskDetailRow, members: Vec<TaskMember>, resources: Vec<TaskResource>) -> Self {
        TaskDetail {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            created_at: row.created_at,
            completed_at: row.completed_at,
            category: row.category,
            priority: row.priority,
            status: row.status,
            owner_id: row.owner_id,
            owner_email: row.owner_email,
            members,
            resources,
        }
    }
}
