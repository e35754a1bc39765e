/// Task endpoints
///
/// # Endpoints
///
/// - `POST /v1/tasks` - Create a task (any authenticated; caller becomes owner)
/// - `GET /v1/tasks` - List task projections (full object or `{}` per caller)
/// - `GET /v1/tasks/:id` - Retrieve one projection
/// - `PUT/PATCH /v1/tasks/:id` - Update a task (admin, owner, or team member)
/// - `PATCH /v1/tasks/:id/team-members` - Batch add members by account id
///   (admin or owner)
/// - `DELETE /v1/tasks/:id/team-members` - Remove one member by account id
///   (admin or owner)
///
/// Category, priority, and status travel as slugs (name/caption); the
/// server resolves them and answers 400 in the
/// `Object with <field>=<value> does not exist.` shape when one dangles.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use taskdesk_shared::error::DomainError;
use taskdesk_shared::models::category::Category;
use taskdesk_shared::models::priority::Priority;
use taskdesk_shared::models::status::Status;
use taskdesk_shared::models::task::{CreateTask, Task, TaskDetail, UpdateTask};
use taskdesk_shared::policy::{authorize, require_known, Action, Actor, Target};
use taskdesk_shared::views::{project_task, TaskProjection, TaskView};

use crate::{
    app::AppState,
    error::{validation_errors, ApiError, ApiResult},
    extract::AuthPrincipal,
};

/// Create task request
///
/// The owner is never taken from the body; the server assigns the caller's
/// profile. An `owner` key in the payload is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub due_date: NaiveDate,

    /// Category referenced by name
    pub category: String,

    /// Priority referenced by caption
    pub priority: String,

    /// Status referenced by caption, optional
    pub status: Option<String>,
}

/// Update task request; both PUT and PATCH apply partial semantics
///
/// `completed_at` and `status` distinguish an absent key (leave the column
/// alone) from an explicit `null` (clear it back to NULL).
///
/// `owner` and `team_members` take PROFILE ids and are honored only for
/// administrators; for owners and team members they are silently dropped,
/// not rejected. The team-member endpoints speak account ids instead.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub due_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "double_option")]
    pub completed_at: Option<Option<DateTime<Utc>>>,

    pub category: Option<String>,

    pub priority: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<String>>,

    /// Admin only: reassign the owning profile
    pub owner: Option<i64>,

    /// Admin only: replace the whole member set (profile ids)
    pub team_members: Option<Vec<i64>>,
}

/// Maps a present-but-null JSON value to `Some(None)`; a missing key stays
/// `None` via `#[serde(default)]`
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Batch add request; account ids
#[derive(Debug, Deserialize)]
pub struct AddTeamMembersRequest {
    pub team_members: Vec<i64>,
}

/// Single remove request; account id
#[derive(Debug, Deserialize)]
pub struct RemoveTeamMemberRequest {
    pub team_member: i64,
}

/// Mutation response envelope
#[derive(Debug, Serialize)]
pub struct TaskEnvelope {
    pub message: String,
    pub data: TaskView,
}

/// Team mutation response: message plus the member emails after the change
#[derive(Debug, Serialize)]
pub struct TeamEnvelope {
    pub message: String,
    pub team_members: Vec<String>,
}

async fn resolve_category(state: &AppState, name: &str) -> Result<i64, ApiError> {
    let category = Category::find_by_name(&state.db, name)
        .await?
        .ok_or_else(|| DomainError::unknown_slug("category", "name", name))?;
    Ok(category.id)
}

async fn resolve_priority(state: &AppState, caption: &str) -> Result<i64, ApiError> {
    let priority = Priority::find_by_caption(&state.db, caption)
        .await?
        .ok_or_else(|| DomainError::unknown_slug("priority", "caption", caption))?;
    Ok(priority.id)
}

async fn resolve_status(state: &AppState, caption: &str) -> Result<i64, ApiError> {
    let status = Status::find_by_caption(&state.db, caption)
        .await?
        .ok_or_else(|| DomainError::unknown_slug("status", "caption", caption))?;
    Ok(status.id)
}

/// Loads a task's detail row or answers 404
async fn load_detail(state: &AppState, task_id: i64) -> Result<TaskDetail, ApiError> {
    TaskDetail::load(&state.db, task_id)
        .await?
        .ok_or_else(ApiError::not_found)
}

/// Create a task (any authenticated caller)
///
/// The caller's profile becomes the owner.
pub async fn create_task(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskEnvelope>)> {
    let actor = authorize(&principal, Action::CreateTask, &Target::Collection)?;

    req.validate().map_err(validation_errors)?;

    let category_id = resolve_category(&state, &req.category).await?;
    let priority_id = resolve_priority(&state, &req.priority).await?;
    let status_id = match req.status.as_deref() {
        Some(caption) => Some(resolve_status(&state, caption).await?),
        None => None,
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            category_id,
            priority_id,
            status_id,
            owner_id: actor.profile_id,
        },
    )
    .await
    .map_err(ApiError::from)?;

    tracing::info!(task_id = task.id, owner = actor.profile_id, "task created");

    let detail = load_detail(&state, task.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskEnvelope {
            message: "Task successfully created".to_string(),
            data: TaskView::from_detail(&detail),
        }),
    ))
}

/// List all tasks as caller-dependent projections
///
/// Every authenticated caller gets the whole list; entries outside the
/// caller's circle render as `{}`, keeping positions stable.
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Vec<TaskProjection>>> {
    let actor = authorize(&principal, Action::ReadTask, &Target::Collection)?;

    let details = TaskDetail::load_all(&state.db).await?;
    let projections = details
        .iter()
        .map(|detail| project_task(detail, actor))
        .collect();

    Ok(Json(projections))
}

/// Retrieve one task as a caller-dependent projection
pub async fn get_task(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskProjection>> {
    let actor = authorize(&principal, Action::ReadTask, &Target::Collection)?;

    let detail = load_detail(&state, id).await?;
    Ok(Json(project_task(&detail, actor)))
}

/// Applies the role-based write restriction to an update payload
///
/// Admins keep every field; everyone else loses `owner` and
/// `team_members` without an error.
fn restrict_writable_fields(req: &mut UpdateTaskRequest, actor: &Actor) {
    if !actor.is_staff {
        req.owner = None;
        req.team_members = None;
    }
}

/// Update a task (admin, owner, or team member)
pub async fn update_task(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
    Json(mut req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskEnvelope>> {
    let actor = require_known(&principal)?;

    let detail = load_detail(&state, id).await?;
    let facts = detail.facts();
    authorize(&principal, Action::UpdateTask, &Target::Task(&facts))?;

    req.validate().map_err(validation_errors)?;
    restrict_writable_fields(&mut req, actor);

    let category_id = match req.category.as_deref() {
        Some(name) => Some(resolve_category(&state, name).await?),
        None => None,
    };
    let priority_id = match req.priority.as_deref() {
        Some(caption) => Some(resolve_priority(&state, caption).await?),
        None => None,
    };
    let status_id = match req.status {
        Some(Some(ref caption)) => Some(Some(resolve_status(&state, caption).await?)),
        Some(None) => Some(None),
        None => None,
    };

    // One unit of work: member replacement and column update commit
    // together or not at all
    let updated = Task::apply_update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            completed_at: req.completed_at,
            category_id,
            priority_id,
            status_id,
            owner_id: req.owner,
        },
        req.team_members.as_deref(),
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    tracing::info!(task_id = updated.id, caller = actor.account_id, "task updated");

    let detail = load_detail(&state, updated.id).await?;

    Ok(Json(TaskEnvelope {
        message: "Task successfully updated".to_string(),
        data: TaskView::from_detail(&detail),
    }))
}

/// Batch add team members by account id (admin or owner)
///
/// All-or-nothing: one unknown account id fails the whole batch and
/// nothing is added. Adding an existing member is a no-op.
pub async fn add_team_members(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
    Json(req): Json<AddTeamMembersRequest>,
) -> ApiResult<Json<TeamEnvelope>> {
    require_known(&principal)?;

    let detail = load_detail(&state, id).await?;
    let facts = detail.facts();
    let actor = authorize(&principal, Action::ManageTeam, &Target::Task(&facts))?;

    let team_members = Task::add_members(&state.db, id, &req.team_members).await?;

    tracing::info!(
        task_id = id,
        caller = actor.account_id,
        added = req.team_members.len(),
        "team members added"
    );

    Ok(Json(TeamEnvelope {
        message: "Team members successfully added".to_string(),
        team_members,
    }))
}

/// Remove one team member by account id (admin or owner)
///
/// Removing an account that exists but isn't on the team answers 400 with
/// the unchanged member list; an unknown account id answers 400 naming it.
pub async fn remove_team_member(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
    Json(req): Json<RemoveTeamMemberRequest>,
) -> ApiResult<Json<TeamEnvelope>> {
    require_known(&principal)?;

    let detail = load_detail(&state, id).await?;
    let facts = detail.facts();
    let actor = authorize(&principal, Action::ManageTeam, &Target::Task(&facts))?;

    let team_members = match Task::remove_member(&state.db, id, req.team_member).await {
        Ok(team_members) => team_members,
        Err(DomainError::NotTeamMember { .. }) => {
            // Unchanged list, attached so clients can reconcile
            let team_members = Task::member_emails(&state.db, id).await.map_err(ApiError::from)?;
            return Err(ApiError::NotTeamMember { team_members });
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        task_id = id,
        caller = actor.account_id,
        removed = req.team_member,
        "team member removed"
    );

    Ok(Json(TeamEnvelope {
        message: "Team member successfully removed".to_string(),
        team_members,
    }))
}
