// tests/api_tests.rs

use std::sync::Arc;

use innovaid_backend::{
    config::Config,
    events::EventBus,
    models::user::CurrentUser,
    routes,
    services::LostFoundService,
    state::AppState,
    store::MemoryItemStore,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};

const SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    client: reqwest::Client,
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
async fn spawn_app() -> TestApp {
    let config = Config::for_secret(SECRET);
    let service = LostFoundService::new(Arc::new(MemoryItemStore::new()), EventBus::default());
    let state = AppState { service, config };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

fn token_for(id: &str, role: &str) -> String {
    let user = CurrentUser {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@campus.edu", id),
        phone: Some("0123456789".to_string()),
        role: role.to_string(),
    };
    sign_jwt(&user, SECRET, 600).expect("Failed to sign token")
}

fn backpack() -> Value {
    json!({
        "type": "lost",
        "itemName": "Blue Backpack",
        "category": "Bag",
        "location": "Library",
        "description": "Navy blue backpack left near entrance"
    })
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn report(&self, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/lostfound"))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Reports `body` and returns the created item's id.
    async fn report_ok(&self, token: &str, body: &Value) -> String {
        let response = self.report(token, body).await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn update(&self, token: &str, id: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/api/lostfound/{}", id)))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request");
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = spawn_app().await;

    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let (status, doc) = app.get_json("/api/openapi.json").await;
    assert_eq!(status, 200);
    assert!(doc["paths"]["/api/lostfound"].is_object());
}

#[tokio::test]
async fn report_creates_pending_item() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");

    let response = app.report(&u1, &backpack()).await;
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["message"].is_string());
    let item = &body["data"];
    assert_eq!(item["status"], "pending");
    assert_eq!(item["viewCount"], 0);
    assert_eq!(item["priority"], "medium");
    assert_eq!(item["isActive"], true);
    assert_eq!(item["reportedBy"], "u1");
    assert_eq!(item["reportedByName"], "User u1");
    assert_eq!(item["contactInfo"]["email"], "u1@campus.edu");
}

#[tokio::test]
async fn report_requires_a_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/lostfound"))
        .json(&backpack())
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let response = app.report("not-a-token", &backpack()).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn report_fails_validation() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");

    let mut too_long = backpack();
    too_long["itemName"] = json!("x".repeat(101));
    let response = app.report(&u1, &too_long).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let mut bad_category = backpack();
    bad_category["category"] = json!("Furniture");
    assert_eq!(app.report(&u1, &bad_category).await.status().as_u16(), 400);

    let mut bad_image = backpack();
    bad_image["images"] = json!(["https://cdn.campus.edu/photo.bmp"]);
    assert_eq!(app.report(&u1, &bad_image).await.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_resolves_item() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");
    let admin = token_for("a1", "admin");
    let id = app.report_ok(&u1, &backpack()).await;

    let response = app.update(&admin, &id, &json!({"status": "resolved"})).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["resolvedAt"].is_string());

    let (status, body) = app.get_json(&format!("/api/lostfound/{}", id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "resolved");

    // resolved is terminal
    let response = app.update(&admin, &id, &json!({"status": "pending"})).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn stranger_cannot_edit() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");
    let u2 = token_for("u2", "student");
    let id = app.report_ok(&u1, &backpack()).await;

    let response = app.update(&u2, &id, &json!({"description": "edited"})).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .delete(app.url(&format!("/api/lostfound/{}", id)))
        .bearer_auth(&u2)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let (_, body) = app.get_json(&format!("/api/lostfound/{}", id)).await;
    assert_eq!(
        body["data"]["description"],
        "Navy blue backpack left near entrance"
    );
}

#[tokio::test]
async fn reporter_edits_but_cannot_moderate() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");
    let id = app.report_ok(&u1, &backpack()).await;

    let response = app
        .update(
            &u1,
            &id,
            &json!({"description": "Has a keychain", "status": "resolved", "adminNotes": "self-approved"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["description"], "Has a keychain");
    assert_eq!(body["data"]["status"], "pending");
    assert!(body["data"].get("adminNotes").is_none());
}

#[tokio::test]
async fn search_and_type_filter() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");
    let id = app.report_ok(&u1, &backpack()).await;

    let (status, body) = app.get_json("/api/lostfound?search=backpack&type=lost").await;
    assert_eq!(status, 200);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|item| item["id"].as_str())
        .collect();
    assert!(ids.contains(&id.as_str()));

    let (_, body) = app.get_json("/api/lostfound?search=bicycle").await;
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = app.get_json("/api/lostfound?search=BACKPACK&type=all").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.get_json("/api/lostfound?status=misplaced").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn second_page_of_three() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");
    for name in ["Umbrella", "Laptop", "Scarf"] {
        let mut body = backpack();
        body["itemName"] = json!(name);
        app.report_ok(&u1, &body).await;
    }

    let (status, body) = app.get_json("/api/lostfound?page=2&limit=1").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["pagination"],
        json!({"current": 2, "pages": 3, "total": 3, "limit": 1})
    );

    // Malformed paging values fall back to defaults
    let (status, body) = app.get_json("/api/lostfound?page=abc&limit=-4").await;
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["current"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
}

#[tokio::test]
async fn stats_fold_claimed_into_resolved() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");
    let admin = token_for("a1", "admin");

    let plan = [
        ("lost", None),
        ("lost", Some("claimed")),
        ("found", Some("claimed")),
        ("found", Some("resolved")),
        ("found", Some("resolved")),
    ];
    for (item_type, status) in plan {
        let mut body = backpack();
        body["type"] = json!(item_type);
        let id = app.report_ok(&u1, &body).await;
        if let Some(status) = status {
            let response = app.update(&admin, &id, &json!({"status": status})).await;
            assert_eq!(response.status().as_u16(), 200);
        }
    }

    let response = app
        .client
        .get(app.url("/api/lostfound/admin/stats"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["data"],
        json!({"total": 5, "lost": 2, "found": 3, "pending": 1, "resolved": 4})
    );
}

#[tokio::test]
async fn stats_are_admin_only() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/lostfound/admin/stats"))
        .bearer_auth(token_for("u1", "student"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .get(app.url("/api/lostfound/admin/stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn unknown_or_malformed_id_is_404() {
    let app = spawn_app().await;

    let (status, body) = app
        .get_json(&format!("/api/lostfound/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, _) = app.get_json("/api/lostfound/not-a-uuid").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn detail_reads_count_views() {
    let app = spawn_app().await;
    let id = app.report_ok(&token_for("u1", "student"), &backpack()).await;

    for expected in 1..=3 {
        let (_, body) = app.get_json(&format!("/api/lostfound/{}", id)).await;
        assert_eq!(body["data"]["viewCount"], expected);
    }
}

#[tokio::test]
async fn my_items_lists_only_own_reports() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");
    let u2 = token_for("u2", "student");
    app.report_ok(&u1, &backpack()).await;
    app.report_ok(&u1, &backpack()).await;
    app.report_ok(&u2, &backpack()).await;

    let response = app
        .client
        .get(app.url("/api/lostfound/user/my-items"))
        .bearer_auth(&u1)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["reportedBy"] == "u1"));
}

#[tokio::test]
async fn owner_deletes_item() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");
    let id = app.report_ok(&u1, &backpack()).await;

    let response = app
        .client
        .delete(app.url(&format!("/api/lostfound/{}", id)))
        .bearer_auth(&u1)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body.get("data").is_none());

    let (status, _) = app.get_json(&format!("/api/lostfound/{}", id)).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn malformed_query_string_gets_error_envelope() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/lostfound?page=1&page=2"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = response.json().await.expect("body is JSON");
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("page"));
}

#[tokio::test]
async fn plain_text_round_trips_and_is_searchable() {
    let app = spawn_app().await;
    let u1 = token_for("u1", "student");

    let mut body = backpack();
    body["description"] = json!("Keys & wallet <near> gate");
    let id = app.report_ok(&u1, &body).await;

    let (_, fetched) = app.get_json(&format!("/api/lostfound/{}", id)).await;
    assert_eq!(fetched["data"]["description"], "Keys & wallet <near> gate");

    let response = app
        .client
        .get(app.url("/api/lostfound"))
        .query(&[("search", "keys & wallet")])
        .send()
        .await
        .unwrap();
    let found: Value = response.json().await.unwrap();
    assert_eq!(found["pagination"]["total"], 1);
    assert_eq!(found["data"][0]["id"], id.as_str());
}
