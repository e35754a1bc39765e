/// Access policy engine
///
/// This module is the single source of truth for who may do what. Every
/// protected operation is an [`Action`]; each action maps to an ordered list
/// of [`Predicate`]s; a request is allowed when ANY predicate grants it
/// (OR semantics). Handlers never inline role checks, they call
/// [`authorize`].
///
/// # Permission Model
///
/// 1. **Authentication presence** is checked first: an [`Principal::Anonymous`]
///    caller is always `Unauthorized`, whatever the action.
/// 2. **Predicates** are pure functions of the actor and the target; they do
///    no I/O. Callers load whatever facts the target needs (task ownership,
///    membership) before asking.
/// 3. **Visibility is not authorization**: every authenticated user may list
///    and retrieve tasks; whether they see content or an empty placeholder is
///    decided downstream by the representation layer via
///    [`is_task_visible`]. Failing visibility never rejects a request.
///
/// # Example
///
/// ```
/// use taskdesk_shared::policy::{authorize, Action, Actor, Principal, Target};
///
/// let actor = Actor {
///     account_id: 1,
///     profile_id: 10,
///     email: "pm@example.com".to_string(),
///     is_staff: false,
///     is_superuser: false,
/// };
/// let principal = Principal::Known(actor);
///
/// // Any authenticated user may create tasks
/// assert!(authorize(&principal, Action::CreateTask, &Target::Collection).is_ok());
///
/// // Only admins may create accounts
/// assert!(authorize(&principal, Action::CreateAccount, &Target::Collection).is_err());
/// ```
use serde::Serialize;

/// The authenticated caller, resolved from a validated access token.
///
/// Carries everything the predicates need so that policy evaluation stays
/// free of database access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Actor {
    /// Account id (`user_accounts.id`)
    pub account_id: i64,

    /// Profile id (`user_profiles.id`) — tasks reference profiles
    pub profile_id: i64,

    /// Normalized account email
    pub email: String,

    /// Staff flag; the admin predicate
    pub is_staff: bool,

    /// Superuser flag; tracked but grants nothing beyond `is_staff` here
    pub is_superuser: bool,
}

/// A request's caller: either nobody (no usable credentials) or a resolved
/// actor.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    Known(Actor),
}

impl Principal {
    /// Returns the actor if one is present.
    pub fn actor(&self) -> Option<&Actor> {
        match self {
            Principal::Anonymous => None,
            Principal::Known(actor) => Some(actor),
        }
    }
}

/// Every protected operation in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateTask,
    ReadTask,
    UpdateTask,
    ManageTeam,
    CreateAccount,
    ReadAccount,
    UpdateAccount,
    DeleteAccount,
}

impl Action {
    /// Stable name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateTask => "create_task",
            Action::ReadTask => "read_task",
            Action::UpdateTask => "update_task",
            Action::ManageTeam => "manage_team",
            Action::CreateAccount => "create_account",
            Action::ReadAccount => "read_account",
            Action::UpdateAccount => "update_account",
            Action::DeleteAccount => "delete_account",
        }
    }
}

/// Ownership and membership facts about one task, loaded before policy
/// evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFacts {
    /// Profile id of the task's owner
    pub owner_profile_id: i64,

    /// Profile ids of the task's team members
    pub member_profile_ids: Vec<i64>,
}

/// What an action applies to.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A specific task, with its ownership/membership facts
    Task(&'a TaskFacts),

    /// A specific user account
    Account { account_id: i64 },

    /// No specific object (creation, listing)
    Collection,
}

/// A single grant rule: pure function of actor and target.
pub type Predicate = fn(&Actor, &Target<'_>) -> bool;

/// Error type for policy decisions
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    /// No usable credentials were presented
    #[error("Authentication credentials were not provided.")]
    Unauthorized,

    /// Credentials are fine, but no predicate granted the action
    #[error("You do not have permission to perform this action.")]
    Forbidden { action: Action },
}

fn any_authenticated(_actor: &Actor, _target: &Target<'_>) -> bool {
    true
}

fn is_admin(actor: &Actor, _target: &Target<'_>) -> bool {
    actor.is_staff
}

fn is_task_owner(actor: &Actor, target: &Target<'_>) -> bool {
    matches!(target, Target::Task(facts) if facts.owner_profile_id == actor.profile_id)
}

fn is_team_member(actor: &Actor, target: &Target<'_>) -> bool {
    matches!(target, Target::Task(facts) if facts.member_profile_ids.contains(&actor.profile_id))
}

fn is_self(actor: &Actor, target: &Target<'_>) -> bool {
    matches!(target, Target::Account { account_id } if *account_id == actor.account_id)
}

/// The trio that both guards task updates and decides read visibility.
const TASK_CIRCLE: &[Predicate] = &[is_admin, is_task_owner, is_team_member];

/// Returns the ordered predicate list for an action.
///
/// | Action | Granted to |
/// |---|---|
/// | `CreateTask`, `ReadTask`, `ReadAccount` | any authenticated user |
/// | `UpdateTask` | admin, task owner, or team member |
/// | `ManageTeam` | admin or task owner |
/// | `CreateAccount` | admin only |
/// | `UpdateAccount`, `DeleteAccount` | admin or the account itself |
pub fn predicates_for(action: Action) -> &'static [Predicate] {
    match action {
        Action::CreateTask | Action::ReadTask | Action::ReadAccount => &[any_authenticated],
        Action::UpdateTask => TASK_CIRCLE,
        Action::ManageTeam => &[is_admin, is_task_owner],
        Action::CreateAccount => &[is_admin],
        Action::UpdateAccount | Action::DeleteAccount => &[is_admin, is_self],
    }
}

/// Decides whether `principal` may perform `action` on `target`.
///
/// Anonymous callers are rejected with `Unauthorized` before any predicate
/// runs. For a known actor the action's predicates are evaluated in order
/// and the first grant wins; if none grants, the result is `Forbidden`.
///
/// On success the borrowed actor is handed back so handlers can keep using
/// it (owner assignment, self checks, logging).
pub fn authorize<'p>(
    principal: &'p Principal,
    action: Action,
    target: &Target<'_>,
) -> Result<&'p Actor, PolicyError> {
    let actor = principal.actor().ok_or(PolicyError::Unauthorized)?;

    if predicates_for(action)
        .iter()
        .any(|predicate| predicate(actor, target))
    {
        Ok(actor)
    } else {
        Err(PolicyError::Forbidden { action })
    }
}

/// Rejects anonymous callers without deciding anything else.
///
/// Used by handlers that must load target facts before the real
/// [`authorize`] call, so that a missing object still answers 401 (not 404)
/// to an unauthenticated caller.
pub fn require_known(principal: &Principal) -> Result<&Actor, PolicyError> {
    principal.actor().ok_or(PolicyError::Unauthorized)
}

/// The post-fetch visibility filter for task reads: admins, the owner, and
/// team members see the task; everyone else gets the empty projection.
///
/// Deliberately NOT an [`authorize`] path: failing it hides content, it
/// never rejects the request.
pub fn is_task_visible(actor: &Actor, facts: &TaskFacts) -> bool {
    let target = Target::Task(facts);
    TASK_CIRCLE
        .iter()
        .any(|predicate| predicate(actor, &target))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: i64 = 1;
    const OWNER: i64 = 2;
    const MEMBER: i64 = 3;
    const OUTSIDER: i64 = 4;

    fn actor(id: i64, is_staff: bool) -> Actor {
        Actor {
            account_id: id,
            // Keep profile ids distinct from account ids so a predicate
            // comparing the wrong field fails the tests.
            profile_id: id + 100,
            email: format!("user{id}@example.com"),
            is_staff,
            is_superuser: is_staff,
        }
    }

    fn task_facts() -> TaskFacts {
        TaskFacts {
            owner_profile_id: OWNER + 100,
            member_profile_ids: vec![MEMBER + 100],
        }
    }

    const ALL_ACTIONS: [Action; 8] = [
        Action::CreateTask,
        Action::ReadTask,
        Action::UpdateTask,
        Action::ManageTeam,
        Action::CreateAccount,
        Action::ReadAccount,
        Action::UpdateAccount,
        Action::DeleteAccount,
    ];

    #[test]
    fn test_anonymous_is_always_unauthorized() {
        let facts = task_facts();
        for action in ALL_ACTIONS {
            let result = authorize(&Principal::Anonymous, action, &Target::Task(&facts));
            assert_eq!(
                result.unwrap_err(),
                PolicyError::Unauthorized,
                "anonymous caller must be unauthorized for {action:?}"
            );
        }
    }

    #[test]
    fn test_create_and_read_allow_any_authenticated() {
        let outsider = Principal::Known(actor(OUTSIDER, false));

        for action in [Action::CreateTask, Action::ReadTask, Action::ReadAccount] {
            assert!(
                authorize(&outsider, action, &Target::Collection).is_ok(),
                "{action:?} should be granted to any authenticated user"
            );
        }
    }

    #[test]
    fn test_update_task_requires_admin_owner_or_member() {
        let facts = task_facts();
        let cases = [
            (ADMIN, true, true),
            (OWNER, false, true),
            (MEMBER, false, true),
            (OUTSIDER, false, false),
        ];

        for (id, staff, expected) in cases {
            let principal = Principal::Known(actor(id, staff));
            let result = authorize(&principal, Action::UpdateTask, &Target::Task(&facts));
            assert_eq!(
                result.is_ok(),
                expected,
                "update by account {id} (staff={staff})"
            );
        }
    }

    #[test]
    fn test_manage_team_excludes_members() {
        let facts = task_facts();
        let cases = [
            (ADMIN, true, true),
            (OWNER, false, true),
            (MEMBER, false, false),
            (OUTSIDER, false, false),
        ];

        for (id, staff, expected) in cases {
            let principal = Principal::Known(actor(id, staff));
            let result = authorize(&principal, Action::ManageTeam, &Target::Task(&facts));
            assert_eq!(
                result.is_ok(),
                expected,
                "manage team by account {id} (staff={staff})"
            );
        }
    }

    #[test]
    fn test_create_account_is_admin_only() {
        let admin = Principal::Known(actor(ADMIN, true));
        let regular = Principal::Known(actor(OWNER, false));

        assert!(authorize(&admin, Action::CreateAccount, &Target::Collection).is_ok());

        let err = authorize(&regular, Action::CreateAccount, &Target::Collection).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Forbidden {
                action: Action::CreateAccount
            }
        );
    }

    #[test]
    fn test_update_and_delete_account_allow_admin_or_self() {
        let target = Target::Account {
            account_id: OUTSIDER,
        };

        for action in [Action::UpdateAccount, Action::DeleteAccount] {
            let admin = Principal::Known(actor(ADMIN, true));
            assert!(authorize(&admin, action, &target).is_ok());

            let same = Principal::Known(actor(OUTSIDER, false));
            assert!(authorize(&same, action, &target).is_ok());

            let other = Principal::Known(actor(MEMBER, false));
            assert!(matches!(
                authorize(&other, action, &target),
                Err(PolicyError::Forbidden { .. })
            ));
        }
    }

    #[test]
    fn test_forbidden_and_unauthorized_are_distinct() {
        let regular = Principal::Known(actor(OUTSIDER, false));

        let forbidden = authorize(&regular, Action::CreateAccount, &Target::Collection);
        let unauthorized = authorize(&Principal::Anonymous, Action::CreateAccount, &Target::Collection);

        assert!(matches!(forbidden, Err(PolicyError::Forbidden { .. })));
        assert!(matches!(unauthorized, Err(PolicyError::Unauthorized)));
    }

    #[test]
    fn test_visibility_matches_the_update_circle() {
        let facts = task_facts();

        assert!(is_task_visible(&actor(ADMIN, true), &facts));
        assert!(is_task_visible(&actor(OWNER, false), &facts));
        assert!(is_task_visible(&actor(MEMBER, false), &facts));
        assert!(!is_task_visible(&actor(OUTSIDER, false), &facts));
    }

    #[test]
    fn test_require_known() {
        assert_eq!(
            require_known(&Principal::Anonymous).unwrap_err(),
            PolicyError::Unauthorized
        );
        assert!(require_known(&Principal::Known(actor(OWNER, false))).is_ok());
    }

    #[test]
    fn test_policy_error_display() {
        assert_eq!(
            PolicyError::Unauthorized.to_string(),
            "Authentication credentials were not provided."
        );
        assert_eq!(
            PolicyError::Forbidden {
                action: Action::UpdateTask
            }
            .to_string(),
            "You do not have permission to perform this action."
        );
    }
}
