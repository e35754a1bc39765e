/// Account and profile views
///
/// An account renders with its profile inlined, the profile with its
/// position, and the position with its category. The category leaf has two
/// renderings selected per call site: the name alone (slug mode, the shape
/// the account endpoints serve) or the full category object (nested mode).
use serde::Serialize;

use crate::models::user::AccountDetail;

/// How a nested category reference renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryMode {
    /// Replace the reference with the category name
    Slug,
    /// Inline the whole category object
    Nested,
}

/// Full account representation; never carries the password hash
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub profile: ProfileView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<PositionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub is_task_manager: bool,
    pub category: CategoryRef,
}

/// A category rendered either as its name or as the full object
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Slug(String),
    Full(CategoryView),
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl AccountView {
    /// Builds the view from a loaded [`AccountDetail`]
    pub fn from_detail(detail: &AccountDetail, mode: CategoryMode) -> Self {
        let position = match (&detail.position, &detail.category) {
            (Some(position), Some(category)) => Some(PositionView {
                id: position.id,
                title: position.title.clone(),
                description: position.description.clone(),
                is_task_manager: position.is_task_manager,
                category: match mode {
                    CategoryMode::Slug => CategoryRef::Slug(category.name.clone()),
                    CategoryMode::Nested => CategoryRef::Full(CategoryView {
                        id: category.id,
                        name: category.name.clone(),
                        description: category.description.clone(),
                    }),
                },
            }),
            _ => None,
        };

        AccountView {
            id: detail.account.id,
            email: detail.account.email.clone(),
            is_active: detail.account.is_active,
            is_staff: detail.account.is_staff,
            is_superuser: detail.account.is_superuser,
            profile: ProfileView {
                id: detail.profile.id,
                first_name: detail.profile.first_name.clone(),
                last_name: detail.profile.last_name.clone(),
                position,
            },
        }
    }
}
