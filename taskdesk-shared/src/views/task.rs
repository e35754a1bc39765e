/// Task views and the visibility projection
///
/// A task renders with its reference rows replaced by their human-readable
/// values: category name, priority and status captions, owner and member
/// emails. Callers outside a task's circle receive [`TaskProjection::Hidden`],
/// which serializes to an empty object so list indexes line up across
/// callers with different visibility.
use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::models::resource::TaskResource;
use crate::models::task::TaskDetail;
use crate::policy::{self, Actor};

/// Full task representation
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(serialize_with = "super::timestamps::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "super::timestamps::serialize_option")]
    pub completed_at: Option<DateTime<Utc>>,
    pub category: String,
    pub priority: String,
    pub status: Option<String>,
    /// Owner's email
    pub owner: String,
    /// Member emails, in the stable order the membership query defines
    pub team_members: Vec<String>,
    pub resources: Vec<ResourceView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub id: i64,
    pub source_name: String,
    pub description: String,
    pub resource_link: String,
}

impl ResourceView {
    fn from_model(resource: &TaskResource) -> Self {
        ResourceView {
            id: resource.id,
            source_name: resource.source_name.clone(),
            description: resource.description.clone(),
            resource_link: resource.resource_link.clone(),
        }
    }
}

impl TaskView {
    /// Builds the view from a loaded [`TaskDetail`]
    pub fn from_detail(detail: &TaskDetail) -> Self {
        TaskView {
            id: detail.id,
            title: detail.title.clone(),
            description: detail.description.clone(),
            due_date: detail.due_date,
            created_at: detail.created_at,
            completed_at: detail.completed_at,
            category: detail.category.clone(),
            priority: detail.priority.clone(),
            status: detail.status.clone(),
            owner: detail.owner_email.clone(),
            team_members: detail.members.iter().map(|m| m.email.clone()).collect(),
            resources: detail.resources.iter().map(ResourceView::from_model).collect(),
        }
    }
}

/// A task as seen by one caller: the full view, or an empty object when
/// the caller is outside the task's circle
#[derive(Debug, Clone)]
pub enum TaskProjection {
    Full(TaskView),
    Hidden,
}

impl Serialize for TaskProjection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TaskProjection::Full(view) => view.serialize(serializer),
            TaskProjection::Hidden => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Projects a task for one caller
pub fn project_task(detail: &TaskDetail, actor: &Actor) -> TaskProjection {
    if policy::is_task_visible(actor, &detail.facts()) {
        TaskProjection::Full(TaskView::from_detail(detail))
    } else {
        TaskProjection::Hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskMember;

    fn detail_fixture() -> TaskDetail {
        TaskDetail {
            id: 42,
            title: "Quarterly report".to_string(),
            description: "Numbers for Q1".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_micro_opt(10, 30, 0, 123_456)
                .unwrap()
                .and_utc(),
            completed_at: None,
            category: "Finance".to_string(),
            priority: "High Priority".to_string(),
            status: Some("In Progress".to_string()),
            owner_id: 10,
            owner_email: "owner@example.com".to_string(),
            members: vec![
                TaskMember {
                    profile_id: 11,
                    email: "first@example.com".to_string(),
                },
                TaskMember {
                    profile_id: 12,
                    email: "second@example.com".to_string(),
                },
            ],
            resources: vec![TaskResource {
                id: 1,
                task_id: 42,
                source_name: "wiki".to_string(),
                description: "Report template".to_string(),
                resource_link: "https://wiki.example.com/reports".to_string(),
            }],
        }
    }

    fn actor(profile_id: i64, is_staff: bool) -> Actor {
        Actor {
            account_id: profile_id + 1000,
            profile_id,
            email: format!("actor{profile_id}@example.com"),
            is_staff,
            is_superuser: false,
        }
    }

    #[test]
    fn test_hidden_projection_serializes_to_empty_object() {
        let json = serde_json::to_string(&TaskProjection::Hidden).unwrap();

        assert_eq!(json, "{}");
    }

    #[test]
    fn test_full_view_replaces_references_with_readable_values() {
        let view = TaskView::from_detail(&detail_fixture());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["category"], "Finance");
        assert_eq!(json["priority"], "High Priority");
        assert_eq!(json["status"], "In Progress");
        assert_eq!(json["owner"], "owner@example.com");
        assert_eq!(
            json["team_members"],
            serde_json::json!(["first@example.com", "second@example.com"])
        );
    }

    #[test]
    fn test_timestamps_use_fixed_format() {
        let view = TaskView::from_detail(&detail_fixture());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["created_at"], "2024-01-15T10:30:00.123456Z");
        assert_eq!(json["due_date"], "2024-02-03");
        assert!(json["completed_at"].is_null());
    }

    #[test]
    fn test_owner_gets_full_projection() {
        let detail = detail_fixture();
        let projection = project_task(&detail, &actor(10, false));

        assert!(matches!(projection, TaskProjection::Full(_)));
    }

    #[test]
    fn test_member_gets_full_projection() {
        let detail = detail_fixture();
        let projection = project_task(&detail, &actor(12, false));

        assert!(matches!(projection, TaskProjection::Full(_)));
    }

    #[test]
    fn test_admin_gets_full_projection() {
        let detail = detail_fixture();
        let projection = project_task(&detail, &actor(99, true));

        assert!(matches!(projection, TaskProjection::Full(_)));
    }

    #[test]
    fn test_outsider_gets_hidden_projection() {
        let detail = detail_fixture();
        let projection = project_task(&detail, &actor(99, false));

        assert!(matches!(projection, TaskProjection::Hidden));
        assert_eq!(serde_json::to_string(&projection).unwrap(), "{}");
    }
}
