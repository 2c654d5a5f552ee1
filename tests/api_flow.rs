//! End-to-end tests against a live server.

use std::time::Duration;

use axum::http::StatusCode;
use catalog_connector::catalog::Document;
use catalog_connector::storage::StoreError;
use reqwest::header;
use serde_json::{json, Value};

mod common;

use common::{http, valid_item, TestServer, PIN};

#[tokio::test]
async fn test_submission_moderation_flow() {
    let server = TestServer::start().await;
    let public = server.client();

    let id = public.submit_item(&valid_item("Helper")).await.unwrap();
    assert!(!id.is_empty());

    // Pending items stay out of the public catalog.
    let catalog = public.public_catalog().await.unwrap();
    assert!(catalog.items.iter().all(|i| i.id != id));
    assert_eq!(catalog.settings["title"], "GPTMart");

    let admin = server.admin().await;
    let items = admin.items().await.unwrap();
    let pending = items.iter().find(|i| i.id == id).unwrap();
    assert_eq!(pending.status, "pending");
    assert!(!pending.featured);
    assert_eq!(pending.categories, vec!["Writing", "Research"]);
    assert!(pending.submitted_by.is_some());

    let approved = admin.update_item(&id, &json!({ "status": "live" })).await.unwrap();
    assert_eq!(approved.status, "live");
    assert_eq!(approved.created_at, pending.created_at);
    let catalog = public.public_catalog().await.unwrap();
    assert_eq!(catalog.items.len(), 1);
    assert_eq!(catalog.items[0].title, "Helper");

    admin.update_item(&id, &json!({ "status": "hidden" })).await.unwrap();
    assert!(public.public_catalog().await.unwrap().items.is_empty());

    admin.delete_item(&id).await.unwrap();
    let err = admin.delete_item(&id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    server.stop().await;
}

#[tokio::test]
async fn test_submission_cannot_self_approve() {
    let server = TestServer::start().await;
    let mut item = valid_item("Sneaky");
    item["status"] = json!("live");
    item["featured"] = json!(true);

    let id = server.client().submit_item(&item).await.unwrap();
    let admin = server.admin().await;
    let stored = admin.items().await.unwrap().into_iter().find(|i| i.id == id).unwrap();
    assert_eq!(stored.status, "pending");
    assert!(!stored.featured);

    server.stop().await;
}

#[tokio::test]
async fn test_public_submissions_are_appended() {
    let server = TestServer::start().await;
    let public = server.client();

    let first = public.submit_item(&valid_item("First")).await.unwrap();
    let second = public.submit_item(&valid_item("Second")).await.unwrap();

    let doc = server.document();
    let stored: Vec<&str> = doc["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(stored, vec![first.as_str(), second.as_str()]);

    server.stop().await;
}

#[tokio::test]
async fn test_submission_validation_errors() {
    let server = TestServer::start().await;
    let client = server.client();

    let err = client
        .submit_item(&json!({ "url": "https://chatgpt.com/g/x" }))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert!(err.to_string().contains("Title is required"));

    let err = client
        .submit_item(&json!({ "title": "X", "url": "https://example.com/g/x" }))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert!(err.to_string().contains("Link must start with https://chatgpt.com/g/"));

    // Nothing was stored.
    assert!(server.document()["items"].as_array().unwrap().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_submission_rate_limit_is_per_client() {
    let server = TestServer::start().await;
    let client = http();

    let submit = |ip: &'static str| {
        client
            .post(server.url("/api/gpts/submit"))
            .header("x-forwarded-for", ip)
            .json(&valid_item("Limited"))
            .send()
    };

    for _ in 0..5 {
        assert_eq!(submit("203.0.113.7").await.unwrap().status(), StatusCode::CREATED);
    }
    let res = submit("203.0.113.7").await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Too many submissions. Try later.");

    assert_eq!(submit("198.51.100.1").await.unwrap().status(), StatusCode::CREATED);
    assert_eq!(server.document()["items"].as_array().unwrap().len(), 6);

    server.stop().await;
}

#[tokio::test]
async fn test_admin_routes_require_session() {
    let server = TestServer::start().await;
    let client = http();

    for path in ["/api/gpts", "/api/leads", "/api/leads/export", "/api/settings"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Unauthorized");
    }

    let res = client
        .get(server.url("/api/gpts"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let mut wrong = server.client();
    let err = wrong.login("0000").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    server.stop().await;
}

#[tokio::test]
async fn test_login_cookie_and_logout() {
    let server = TestServer::start().await;
    let client = http();

    let res = client
        .post(server.url("/api/login"))
        .form(&[("passcode", PIN)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=3600"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    let token = body["token"].as_str().unwrap().to_string();

    let session = format!("session={token}");
    let res = client
        .get(server.url("/api/gpts"))
        .header(header::COOKIE, &session)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/api/logout"))
        .header(header::COOKIE, &session)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    // The token itself is dead, not just the cookie.
    let res = client
        .get(server.url("/api/gpts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    server.stop().await;
}

#[tokio::test]
async fn test_admin_create_and_partial_update() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let first = admin.create_item(&valid_item("First")).await.unwrap();
    let mut draft = valid_item("Second");
    draft["status"] = json!("hidden");
    draft["featured"] = json!(true);
    let second = admin.create_item(&draft).await.unwrap();

    let items = admin.items().await.unwrap();
    assert_eq!(items[0].id, second);
    assert_eq!(items[0].status, "hidden");
    assert!(items[0].featured);
    assert_eq!(items[1].id, first);
    assert_eq!(items[1].status, "live");

    let updated = admin
        .update_item(&first, &json!({ "desc": "Edited", "id": "hijack" }))
        .await
        .unwrap();
    assert_eq!(updated.id, first);
    assert_eq!(updated.desc, "Edited");
    assert_eq!(updated.title, "First");

    let err = admin
        .update_item(&first, &json!({ "status": "archived" }))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));

    let err = admin.update_item("missing", &json!({ "desc": "x" })).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

    server.stop().await;
}

#[tokio::test]
async fn test_leads_capture_and_export() {
    let server = TestServer::start().await;
    let public = server.client();

    public
        .submit_lead(&json!({
            "email": "ann@example.com",
            "name": "Ann",
            "message": "Please feature my GPT, thanks",
            "tz": "Europe/Berlin",
        }))
        .await
        .unwrap();

    let err = public
        .submit_lead(&json!({ "email": "not-an-email", "message": "hi" }))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    let err = public.submit_lead(&json!({ "email": "a@b.co" })).await.unwrap_err();
    assert!(err.to_string().contains("Email and message required"));

    let admin = server.admin().await;
    let leads = admin.leads().await.unwrap();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].email, "ann@example.com");
    assert_eq!(leads[0].tz, "Europe/Berlin");
    assert!(!leads[0].ip.is_empty());

    let csv = admin.export_leads().await.unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("id,email,name,message,ip,ua,tz,createdAt"));
    assert!(lines.next().unwrap().contains("\"Please feature my GPT, thanks\""));

    admin.delete_lead(&leads[0].id).await.unwrap();
    assert!(admin.leads().await.unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_write_failure_is_a_server_error() {
    let server = TestServer::start().await;
    let before = std::fs::read(server.dir.path().join("db.json")).unwrap();

    // An occupied staging path makes the next write fail.
    let staging = server.dir.path().join("db.json.tmp");
    std::fs::create_dir(&staging).unwrap();
    std::fs::write(staging.join("occupied"), "x").unwrap();

    let lead = json!({ "email": "ann@example.com", "message": "hello" });
    let res = http().post(server.url("/api/leads")).json(&lead).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Server error" }));
    assert_eq!(std::fs::read(server.dir.path().join("db.json")).unwrap(), before);

    std::fs::remove_dir_all(&staging).unwrap();
    let res = http().post(server.url("/api/leads")).json(&lead).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(server.document()["leads"].as_array().unwrap().len(), 1);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queued_write_outlasts_request_timeout() {
    let server = TestServer::start_with(|c| c.timeouts.request_secs = 1).await;

    // Hold the document longer than the request timeout.
    let store = server.store.clone();
    let (locked, wait_locked) = tokio::sync::oneshot::channel();
    let holder = tokio::spawn(async move {
        store
            .mutate(move |_: &mut Document| {
                let _ = locked.send(());
                std::thread::sleep(Duration::from_millis(1500));
                Ok::<_, StoreError>(())
            })
            .await
    });
    wait_locked.await.unwrap();

    let res = http()
        .post(server.url("/api/leads"))
        .json(&json!({ "email": "ann@example.com", "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    holder.await.unwrap().unwrap();
    assert_eq!(server.document()["leads"].as_array().unwrap().len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn test_settings_merge() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let settings = admin
        .update_settings(&json!({ "title": "  Curated  ", "tagline": "Best picks" }))
        .await
        .unwrap();
    assert_eq!(settings["title"], "Curated");
    assert_eq!(settings["tagline"], "Best picks");

    let catalog = server.client().public_catalog().await.unwrap();
    assert_eq!(catalog.settings["title"], "Curated");
    assert_eq!(catalog.settings["tagline"], "Best picks");

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_api_route_and_banner() {
    let server = TestServer::start().await;
    let client = http();

    let res = client.get(server.url("/api/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "API route not found");

    let banner = client.get(server.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(banner.contains("connector is running"));

    assert!(server.client().health().await.unwrap());
    server.stop().await;
}

#[tokio::test]
async fn test_cors_reflects_origin_with_credentials() {
    let server = TestServer::start().await;
    let res = http()
        .request(reqwest::Method::OPTIONS, server.url("/api/gpts/submit"))
        .header(header::ORIGIN, "https://shop.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    let headers = res.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://shop.example");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    server.stop().await;
}

#[tokio::test]
async fn test_request_id_and_security_headers() {
    let server = TestServer::start().await;
    let res = http().get(server.url("/api/health")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    server.stop().await;
}
