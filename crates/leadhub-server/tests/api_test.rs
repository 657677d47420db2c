//! End-to-end API tests over an in-memory database.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use leadhub_auth::AuthConfig;
use leadhub_server::{AppState, app};

async fn setup_app() -> Router {
    let db = surrealdb::engine::any::connect("mem://").await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    leadhub_db::run_migrations(&db).await.unwrap();

    let state = AppState::new(
        db,
        AuthConfig {
            jwt_secret: "test-secret-not-for-production".into(),
            ..Default::default()
        },
        None,
        "http://localhost:3000".into(),
    );
    app(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register an account and return `(token, user_id)`.
async fn register(app: &Router, name: &str, email: &str, role: Option<&str>) -> (String, String) {
    let mut body = json!({
        "name": name,
        "email": email,
        "password": "password123",
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    let (status, reply) = send(app, "POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {reply}");
    (
        reply["data"]["token"].as_str().unwrap().to_string(),
        reply["data"]["id"].as_str().unwrap().to_string(),
    )
}

async fn create_lead(app: &Router, token: &str, name: &str, email: &str, phone: &str, extra: Value) {
    let mut body = json!({
        "name": name,
        "email": email,
        "phone": phone,
        "source": "Website",
    });
    if let Some(map) = extra.as_object() {
        for (k, v) in map {
            body[k] = v.clone();
        }
    }
    let (status, reply) = send(app, "POST", "/api/leads", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create lead failed: {reply}");
}

#[tokio::test]
async fn health_check() {
    let app = setup_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn first_registered_user_is_superadmin() {
    let app = setup_app().await;

    // Requested role is overridden for the first account.
    let (token, _) = register(&app, "Alice", "alice@example.com", Some("agent")).await;

    let (status, me) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["role"], "superadmin");
    assert_eq!(me["data"]["email"], "alice@example.com");

    // Later registrations default to agent.
    let (token2, _) = register(&app, "Bob", "bob@example.com", None).await;
    let (_, me2) = send(&app, "GET", "/api/auth/me", Some(&token2), None).await;
    assert_eq!(me2["data"]["role"], "agent");
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_email_identically() {
    let app = setup_app().await;
    register(&app, "Alice", "alice@example.com", None).await;

    let (status1, body1) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "alice@example.com", "password": "wrong"})),
    )
    .await;
    let (status2, body2) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "ghost@example.com", "password": "whatever"})),
    )
    .await;

    assert_eq!(status1, StatusCode::UNAUTHORIZED);
    assert_eq!(status2, StatusCode::UNAUTHORIZED);
    assert_eq!(body1["message"], body2["message"]);
    assert_eq!(body1["success"], false);
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = setup_app().await;
    let (status, body) = send(&app, "GET", "/api/leads", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn forgot_password_replies_identically_for_known_and_unknown_emails() {
    let app = setup_app().await;
    register(&app, "Alice", "alice@example.com", None).await;

    let (status_known, body_known) = send(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({"email": "alice@example.com"})),
    )
    .await;
    let (status_unknown, body_unknown) = send(
        &app,
        "POST",
        "/api/auth/forgot-password",
        None,
        Some(json!({"email": "ghost@example.com"})),
    )
    .await;

    assert_eq!(status_known, StatusCode::OK);
    assert_eq!(status_unknown, StatusCode::OK);
    assert_eq!(body_known["message"], body_unknown["message"]);
    assert_eq!(body_known["success"], true);
}

#[tokio::test]
async fn agent_listing_is_scoped_to_assigned_leads() {
    let app = setup_app().await;
    let (admin_token, _) = register(&app, "Admin", "admin@example.com", None).await;
    let (agent_token, agent_id) = register(&app, "Agent", "agent@example.com", Some("agent")).await;

    create_lead(
        &app,
        &admin_token,
        "Mine",
        "mine@example.com",
        "555-0100",
        json!({"assignedTo": agent_id}),
    )
    .await;
    create_lead(
        &app,
        &admin_token,
        "Unassigned",
        "unassigned@example.com",
        "555-0101",
        json!({}),
    )
    .await;
    create_lead(
        &app,
        &admin_token,
        "Other",
        "other@example.com",
        "555-0102",
        json!({"assignedTo": uuid::Uuid::new_v4().to_string()}),
    )
    .await;

    // Admin sees all three.
    let (_, all) = send(&app, "GET", "/api/leads", Some(&admin_token), None).await;
    assert_eq!(all["total"], 3);

    // Agent sees only the lead assigned to them.
    let (status, scoped) = send(&app, "GET", "/api/leads", Some(&agent_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scoped["total"], 1);
    for lead in scoped["data"].as_array().unwrap() {
        assert_eq!(lead["assignedTo"].as_str(), Some(agent_id.as_str()));
    }
}

#[tokio::test]
async fn agent_gets_authorization_error_on_foreign_lead() {
    let app = setup_app().await;
    let (admin_token, _) = register(&app, "Admin", "admin@example.com", None).await;
    let (agent_token, _) = register(&app, "Agent", "agent@example.com", Some("agent")).await;

    create_lead(
        &app,
        &admin_token,
        "Unassigned",
        "unassigned@example.com",
        "555-0101",
        json!({}),
    )
    .await;

    let (_, listing) = send(&app, "GET", "/api/leads", Some(&admin_token), None).await;
    let lead_id = listing["data"][0]["id"].as_str().unwrap().to_string();

    // 403, not 404: the lead exists but is not theirs.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/leads/{lead_id}"),
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    // Agents cannot create or delete leads either.
    let (status, _) = send(
        &app,
        "POST",
        "/api/leads",
        Some(&agent_token),
        Some(json!({
            "name": "Nope",
            "email": "nope@example.com",
            "phone": "555-0199",
            "source": "Website",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/leads/{lead_id}"),
        Some(&agent_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn superadmin_accounts_are_protected_from_each_other() {
    let app = setup_app().await;
    let (sa1_token, sa1_id) = register(&app, "First", "first@example.com", None).await;
    // The original registration flow accepts an explicit role, so a
    // second superadmin can exist.
    let (_, sa2_id) = register(&app, "Second", "second@example.com", Some("superadmin")).await;

    // Editing or deleting another superadmin fails even for a superadmin.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{sa2_id}"),
        Some(&sa1_token),
        Some(json!({"name": "Hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/users/{sa2_id}"),
        Some(&sa1_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Editing itself is allowed.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{sa1_id}"),
        Some(&sa1_token),
        Some(json!({"name": "Renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "self edit failed: {body}");
    assert_eq!(body["data"]["name"], "Renamed");
}

#[tokio::test]
async fn user_management_is_superadmin_only() {
    let app = setup_app().await;
    register(&app, "Admin", "admin@example.com", None).await;
    let (agent_token, _) = register(&app, "Agent", "agent@example.com", Some("agent")).await;

    let (status, _) = send(&app, "GET", "/api/users", Some(&agent_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

fn import_workbook(rows: &[[&str; 4]]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, head) in ["name", "email", "phone", "source"].iter().enumerate() {
        sheet.write_string(0, col as u16, *head).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string((r + 1) as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

async fn send_import(app: &Router, token: &str, xlsx: &[u8]) -> (StatusCode, Value) {
    let boundary = "leadhub-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"leads.xlsx\"\r\n\
             Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(xlsx);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/leads/import")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn import_reports_partial_success_with_row_numbers() {
    let app = setup_app().await;
    let (token, _) = register(&app, "Admin", "admin@example.com", None).await;

    // First data row (spreadsheet row 2) misses the phone; second is
    // valid.
    let xlsx = import_workbook(&[
        ["No Phone", "nophone@example.com", "", "Website"],
        ["Valid", "valid@example.com", "555-0100", "Website"],
    ]);

    let (status, body) = send_import(&app, &token, &xlsx).await;
    assert_eq!(status, StatusCode::OK, "import failed: {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["successCount"], 1);
    assert_eq!(body["errorCount"], 1);
    assert_eq!(body["errors"][0]["row"], 2);
    assert_eq!(body["leads"][0]["email"], "valid@example.com");

    // Re-importing the same sheet flags the valid row as a duplicate.
    let (_, again) = send_import(&app, &token, &xlsx).await;
    assert_eq!(again["successCount"], 0);
    assert_eq!(again["errorCount"], 2);
}

#[tokio::test]
async fn import_is_admin_only_and_requires_a_file() {
    let app = setup_app().await;
    register(&app, "Admin", "admin@example.com", None).await;
    let (agent_token, _) = register(&app, "Agent", "agent@example.com", Some("agent")).await;

    let xlsx = import_workbook(&[["X", "x@example.com", "555-0100", "Website"]]);
    let (status, _) = send_import(&app, &agent_token, &xlsx).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dashboard_conversion_rate() {
    let app = setup_app().await;
    let (token, _) = register(&app, "Admin", "admin@example.com", None).await;

    // No leads: rate is exactly zero.
    let (_, empty) = send(&app, "GET", "/api/analytics/dashboard", Some(&token), None).await;
    assert_eq!(empty["data"]["conversionRate"], 0.0);
    assert_eq!(empty["data"]["totalLeads"], 0);

    create_lead(&app, &token, "A", "a@example.com", "555-0100", json!({"status": "Won"})).await;
    create_lead(&app, &token, "B", "b@example.com", "555-0101", json!({})).await;
    create_lead(&app, &token, "C", "c@example.com", "555-0102", json!({})).await;
    create_lead(&app, &token, "D", "d@example.com", "555-0103", json!({})).await;

    let (status, stats) = send(&app, "GET", "/api/analytics/dashboard", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["totalLeads"], 4);
    assert_eq!(stats["data"]["leadsByStatus"]["Won"], 1);
    assert_eq!(stats["data"]["leadsByStatus"]["Contacted"], 0);
    assert_eq!(stats["data"]["conversionRate"], 25.0);
}

#[tokio::test]
async fn export_produces_a_spreadsheet_attachment() {
    let app = setup_app().await;
    let (token, _) = register(&app, "Admin", "admin@example.com", None).await;
    create_lead(&app, &token, "A", "a@example.com", "555-0100", json!({})).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/leads/export")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("leads_export_"));
    assert!(disposition.ends_with(".xlsx"));

    // xlsx payloads are zip archives.
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn note_authorization_rules() {
    let app = setup_app().await;
    let (admin_token, _) = register(&app, "Admin", "admin@example.com", None).await;
    let (agent_token, agent_id) = register(&app, "Agent", "agent@example.com", Some("agent")).await;

    create_lead(
        &app,
        &admin_token,
        "Noted",
        "noted@example.com",
        "555-0100",
        json!({"assignedTo": agent_id}),
    )
    .await;
    let (_, listing) = send(&app, "GET", "/api/leads", Some(&admin_token), None).await;
    let lead_id = listing["data"][0]["id"].as_str().unwrap().to_string();

    // The assigned agent can add a note.
    let (status, noted) = send(
        &app,
        "POST",
        &format!("/api/leads/{lead_id}/notes"),
        Some(&agent_token),
        Some(json!({"content": "called them"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let note_id = noted["data"]["notes"][0]["id"].as_str().unwrap().to_string();

    // Only the creator can edit the note.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/leads/{lead_id}/notes/{note_id}"),
        Some(&admin_token),
        Some(json!({"content": "rewritten"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A non-agent role may delete someone else's note.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/leads/{lead_id}/notes/{note_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
