/// Integration tests for the TaskDesk API
///
/// These drive the router as a `tower::Service` against a real PostgreSQL
/// database and verify the documented contracts end-to-end:
/// - the 401/403 split
/// - admin-only account creation and the password-confirmation error
/// - task visibility (full view vs `{}`) across owner, member, admin,
///   and outsider
/// - team-membership mutation semantics (all-or-nothing batch add,
///   idempotence, non-member removal)
///
/// All tests are ignored by default; run them with a database via
/// `cargo test -- --ignored`.

mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestContext};
use serde_json::json;
use tower::Service as _;

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_health_endpoint() {
    let ctx = TestContext::new().await.unwrap();

    let request = ctx.request(Method::GET, "/health", None, None);
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_anonymous_task_list_is_401() {
    let ctx = TestContext::new().await.unwrap();

    let request = ctx.request(Method::GET, "/v1/tasks", None, None);
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Authentication credentials were not provided.");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_account_creation_is_admin_only() {
    let ctx = TestContext::new().await.unwrap();

    let payload = json!({
        "email": format!("newcomer-{}@Example.COM", ctx.run_id),
        "password": "a-long-enough-password",
        "password_confirmation": "a-long-enough-password",
        "first_name": "New",
        "last_name": "Comer"
    });

    // A regular user is forbidden
    let request = ctx.request(
        Method::POST,
        "/v1/accounts",
        Some(&ctx.owner.token),
        Some(payload.clone()),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json(response).await["error"], "forbidden");

    // The admin succeeds, and the stored email has its domain lowercased
    let request = ctx.request(
        Method::POST,
        "/v1/accounts",
        Some(&ctx.admin.token),
        Some(payload),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["message"], "User successfully created");
    assert_eq!(
        body["data"]["email"],
        format!("newcomer-{}@example.com", ctx.run_id)
    );
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_password_mismatch_yields_the_contract_error() {
    let ctx = TestContext::new().await.unwrap();

    let payload = json!({
        "email": format!("mismatch-{}@example.com", ctx.run_id),
        "password": "a-long-enough-password",
        "password_confirmation": "a-different-password!",
        "first_name": "Mis",
        "last_name": "Match"
    });

    let request = ctx.request(
        Method::POST,
        "/v1/accounts",
        Some(&ctx.admin.token),
        Some(payload),
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Validation error");
    assert_eq!(
        body["error"]["non_field_errors"],
        json!(["Passwords do not match!"])
    );

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_duplicate_email_is_400_not_409() {
    let ctx = TestContext::new().await.unwrap();

    // The owner fixture already holds this address
    let payload = json!({
        "email": ctx.owner.account.email,
        "password": "a-long-enough-password",
        "password_confirmation": "a-long-enough-password",
        "first_name": "Dup",
        "last_name": "Licate"
    });

    let request = ctx.request(
        Method::POST,
        "/v1/accounts",
        Some(&ctx.admin.token),
        Some(payload),
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"]["email"].is_array());

    ctx.cleanup().await.unwrap();
}

/// Creates a task owned by the context's owner fixture, returning its id
async fn create_owned_task(ctx: &TestContext) -> i64 {
    let payload = json!({
        "title": "Quarterly report",
        "description": "Numbers for Q1",
        "due_date": "2030-06-01",
        "category": ctx.category.name,
        "priority": ctx.priority.caption,
        "status": ctx.status.caption
    });

    let request = ctx.request(
        Method::POST,
        "/v1/tasks",
        Some(&ctx.owner.token),
        Some(payload),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["message"], "Task successfully created");
    assert_eq!(body["data"]["owner"], ctx.owner.account.email);
    body["data"]["id"].as_i64().expect("task id")
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_task_visibility_end_to_end() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}");

    // The outsider gets the empty projection, not an error
    let request = ctx.request(Method::GET, &uri, Some(&ctx.outsider.token), None);
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({}));

    // The owner adds the outsider to the team by account id
    let request = ctx.request(
        Method::PATCH,
        &format!("{uri}/team-members"),
        Some(&ctx.owner.token),
        Some(json!({ "team_members": [ctx.outsider.account.id] })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(
        body["team_members"],
        json!([ctx.outsider.account.email])
    );

    // As a member the former outsider now sees the full representation,
    // with people rendered as emails and references as slugs
    let request = ctx.request(Method::GET, &uri, Some(&ctx.outsider.token), None);
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["owner"], ctx.owner.account.email);
    assert_eq!(body["team_members"], json!([ctx.outsider.account.email]));
    assert_eq!(body["category"], ctx.category.name);
    assert_eq!(body["priority"], ctx.priority.caption);

    // The admin sees the task without being owner or member
    let request = ctx.request(Method::GET, &uri, Some(&ctx.admin.token), None);
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["owner"], ctx.owner.account.email);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_task_list_mixes_full_and_hidden_projections() {
    let ctx = TestContext::new().await.unwrap();
    create_owned_task(&ctx).await;

    let request = ctx.request(Method::GET, "/v1/tasks", Some(&ctx.outsider.token), None);
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let list = body.as_array().expect("list response");
    // Our task is present in the list but hidden from the outsider
    assert!(list.iter().any(|entry| entry == &json!({})));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_batch_add_with_unknown_id_is_all_or_nothing() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}/team-members");

    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "team_members": [ctx.outsider.account.id, 999_999_999] })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("999999999"));

    // Nothing was added: the valid id in the same batch did not land
    let request = ctx.request(
        Method::GET,
        &format!("/v1/tasks/{task_id}"),
        Some(&ctx.owner.token),
        None,
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["team_members"], json!([]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_adding_an_existing_member_is_idempotent() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}/team-members");
    let payload = json!({ "team_members": [ctx.outsider.account.id] });

    for _ in 0..2 {
        let request = ctx.request(
            Method::PATCH,
            &uri,
            Some(&ctx.owner.token),
            Some(payload.clone()),
        );
        let response = ctx.app.clone().call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(
            body["team_members"],
            json!([ctx.outsider.account.email])
        );
    }

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_removing_a_non_member_returns_400_with_member_list() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}/team-members");

    // The outsider exists but was never added
    let request = ctx.request(
        Method::DELETE,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "team_member": ctx.outsider.account.id })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["message"], "User is not a team member");
    assert_eq!(body["team_members"], json!([]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_remove_member_roundtrip() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}/team-members");

    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "team_members": [ctx.outsider.account.id] })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = ctx.request(
        Method::DELETE,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "team_member": ctx.outsider.account.id })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["message"], "Team member successfully removed");
    assert_eq!(body["team_members"], json!([]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_members_cannot_manage_the_team() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}/team-members");

    // Put the outsider on the team first
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "team_members": [ctx.outsider.account.id] })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Members may update the task but not its membership
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.outsider.token),
        Some(json!({ "team_members": [ctx.admin.account.id] })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_non_admin_update_drops_protected_fields() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}");

    // The owner smuggles owner/team_members into an ordinary update;
    // they are dropped, the title change lands
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({
            "title": "Renamed by owner",
            "owner": ctx.outsider.profile_id,
            "team_members": [ctx.outsider.profile_id]
        })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["data"]["title"], "Renamed by owner");
    assert_eq!(body["data"]["owner"], ctx.owner.account.email);
    assert_eq!(body["data"]["team_members"], json!([]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_admin_update_may_reassign_owner() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}");

    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.admin.token),
        Some(json!({ "owner": ctx.outsider.profile_id })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["data"]["owner"], ctx.outsider.account.email);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_admin_update_with_bad_owner_rolls_back_team_change() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}");

    // A valid team replacement paired with a dangling owner id must fail
    // as one unit: the 400 names the owner, and no member lands
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.admin.token),
        Some(json!({
            "owner": 999_999_999,
            "team_members": [ctx.outsider.profile_id]
        })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(
        body["error"]["owner"],
        json!(["Invalid pk \"999999999\" - object does not exist."])
    );

    let request = ctx.request(Method::GET, &uri, Some(&ctx.owner.token), None);
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = read_json(response).await;
    assert_eq!(body["owner"], ctx.owner.account.email);
    assert_eq!(body["team_members"], json!([]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_explicit_null_clears_status_and_completed_at() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = create_owned_task(&ctx).await;
    let uri = format!("/v1/tasks/{task_id}");

    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "completed_at": "2030-06-01T12:00:00Z" })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["data"]["completed_at"].is_string());

    // An update that omits both keys leaves them alone
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "title": "Still in flight" })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    let body = read_json(response).await;
    assert!(body["data"]["completed_at"].is_string());
    assert_eq!(body["data"]["status"], ctx.status.caption);

    // Explicit nulls reset both back to NULL
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "completed_at": null, "status": null })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["data"]["completed_at"].is_null());
    assert!(body["data"]["status"].is_null());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_unknown_slug_reference_names_the_value() {
    let ctx = TestContext::new().await.unwrap();

    let payload = json!({
        "title": "Dangling reference",
        "due_date": "2030-06-01",
        "category": "No Such Department",
        "priority": ctx.priority.caption
    });

    let request = ctx.request(
        Method::POST,
        "/v1/tasks",
        Some(&ctx.owner.token),
        Some(payload),
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(
        body["error"]["category"],
        json!(["Object with name=No Such Department does not exist."])
    );

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_account_self_update_and_delete() {
    let ctx = TestContext::new().await.unwrap();
    let account_id = ctx.outsider.account.id;
    let uri = format!("/v1/accounts/{account_id}");

    // Another regular user may not touch the account
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.owner.token),
        Some(json!({ "email": format!("hijack-{}@example.com", ctx.run_id) })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The account itself may
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.outsider.token),
        Some(json!({ "email": format!("renamed-{}@EXAMPLE.com", ctx.run_id) })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["message"], "User successfully updated");
    assert_eq!(
        body["data"]["email"],
        format!("renamed-{}@example.com", ctx.run_id)
    );

    // And may delete itself; 204 carries no body
    let request = ctx.request(Method::DELETE, &uri, Some(&ctx.outsider.token), None);
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_password_change_requires_confirmation() {
    let ctx = TestContext::new().await.unwrap();
    let uri = format!("/v1/accounts/{}", ctx.outsider.account.id);

    // A lone password is rejected
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.outsider.token),
        Some(json!({ "password": "another-long-password" })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert!(body["error"]["password_confirmation"].is_array());

    // With the matching confirmation it goes through
    let request = ctx.request(
        Method::PATCH,
        &uri,
        Some(&ctx.outsider.token),
        Some(json!({
            "password": "another-long-password",
            "password_confirmation": "another-long-password"
        })),
    );
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_account_list_and_retrieve() {
    let ctx = TestContext::new().await.unwrap();

    let request = ctx.request(Method::GET, "/v1/accounts", Some(&ctx.outsider.token), None);
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body.as_array().unwrap().len() >= 3);

    let uri = format!("/v1/accounts/{}", ctx.owner.account.id);
    let request = ctx.request(Method::GET, &uri, Some(&ctx.outsider.token), None);
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["email"], ctx.owner.account.email);
    assert_eq!(body["profile"]["first_name"], "owner");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_missing_task_is_404() {
    let ctx = TestContext::new().await.unwrap();

    let request = ctx.request(
        Method::GET,
        "/v1/tasks/999999999",
        Some(&ctx.owner.token),
        None,
    );
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["message"], "Not found.");

    ctx.cleanup().await.unwrap();
}
