//! Integration tests for the HTTP API
//!
//! Routes are driven in-process with `oneshot`; vendors are fakes and
//! storage lives in a temp dir.

mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::Engine;
use common::{TestApp, TestOptions, ADMIN_PASS};
use http_body_util::BodyExt;
use neurobiz_server::create_router;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

/// Test helper: JSON request, optionally with the admin header
fn json_request(method: &str, uri: &str, body: Value, admin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(pass) = admin {
        builder = builder.header("x-admin-pass", pass);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, admin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(pass) = admin {
        builder = builder.header("x-admin-pass", pass);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

async fn admin_app() -> Result<(TestApp, Router)> {
    let app = TestApp::new(TestOptions::with_admin()).await?;
    let router = create_router(app.state.clone());
    Ok((app, router))
}

// =============================================================================
// Agent + transcripts
// =============================================================================

#[tokio::test]
async fn test_agent_turn_is_visible_to_admin() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/agent",
            json!({"conversationId": "c1", "role": "user", "text": "hi"}),
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (status, body) = send(&router, empty_request("GET", "/api/transcripts/c1", Some(ADMIN_PASS))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "c1");
    let turns = body["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["text"], "hi");
    assert_eq!(turns[0]["role"], "user");
    assert!(turns[0]["ts"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_agent_keeps_free_form_fields() -> Result<()> {
    let (app, router) = admin_app().await?;

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/agent",
            json!({
                "conversationId": "c2",
                "role": "tool",
                "mode": "voice",
                "solutionText": "AI receptionist",
                "cta": {"href": "/contact"}
            }),
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let transcript = app.state.transcripts.get("c2").await?.unwrap();
    let turn = &transcript.turns[0];
    assert_eq!(turn.extra["solutionText"], "AI receptionist");
    assert_eq!(turn.extra["cta"]["href"], "/contact");
    assert!(!turn.extra.contains_key("conversationId"));

    Ok(())
}

#[tokio::test]
async fn test_agent_ended_phase_finishes_conversation() -> Result<()> {
    let (app, router) = admin_app().await?;

    for (role, text, phase) in [("user", "thanks", "closing"), ("assistant", "bye", "ended")] {
        let (status, _) = send(
            &router,
            json_request(
                "POST",
                "/api/agent",
                json!({"conversationId": "c3", "role": role, "text": text, "phase": phase}),
                None,
            ),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let transcript = app.state.transcripts.get("c3").await?.unwrap();
    assert_eq!(transcript.turns.len(), 2);
    assert_eq!(transcript.finished, Some(true));
    assert!(transcript.finished_at.is_some());

    let (_, listing) = send(&router, empty_request("GET", "/api/transcripts", Some(ADMIN_PASS))).await?;
    assert_eq!(listing[0]["id"], "c3");
    assert_eq!(listing[0]["finished"], true);
    assert_eq!(listing[0]["turnCount"], 2);

    Ok(())
}

#[tokio::test]
async fn test_agent_ignores_client_timestamp() -> Result<()> {
    let (app, router) = admin_app().await?;

    let before = chrono::Utc::now();
    for ts in [json!(1700000000000u64), json!("not-a-date"), json!("2001-01-01T00:00:00Z")] {
        let (status, body) = send(
            &router,
            json_request(
                "POST",
                "/api/agent",
                json!({"conversationId": "c4", "role": "user", "text": "hi", "ts": ts.clone()}),
                None,
            ),
        )
        .await?;
        assert_eq!(status, StatusCode::OK, "rejected ts {}", ts);
        assert_eq!(body, json!({"ok": true}));
    }

    let transcript = app.state.transcripts.get("c4").await?.unwrap();
    assert_eq!(transcript.turns.len(), 3);
    for turn in &transcript.turns {
        assert!(turn.ts.unwrap() >= before);
        assert!(!turn.extra.contains_key("ts"));
    }

    Ok(())
}

#[tokio::test]
async fn test_agent_validation_errors() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let cases = [
        json!({"role": "user", "text": "no id"}),
        json!({"conversationId": "", "role": "user"}),
        json!({"conversationId": "c1", "text": "no role"}),
        json!({"conversationId": "c1", "role": "narrator"}),
        json!({"conversationId": "c1", "role": "user", "phase": "later"}),
        json!({"conversationId": "../../etc", "role": "user"}),
    ];

    for body in cases {
        let (status, response) = send(&router, json_request("POST", "/api/agent", body.clone(), None)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {}", body);
        assert!(response["error"].is_string());
    }

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/agent")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, response) = send(&router, malformed).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_transcripts_require_admin_pass() -> Result<()> {
    let (_app, router) = admin_app().await?;

    for request in [
        empty_request("GET", "/api/transcripts", None),
        empty_request("GET", "/api/transcripts", Some("wrong")),
        empty_request("GET", "/api/transcripts/c1", None),
        empty_request("DELETE", "/api/transcripts/c1", Some("wrong")),
    ] {
        let (status, body) = send(&router, request).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    Ok(())
}

#[tokio::test]
async fn test_admin_routes_locked_without_configured_pass() -> Result<()> {
    let app = TestApp::new(TestOptions::default()).await?;
    let router = create_router(app.state.clone());

    let (status, _) = send(&router, empty_request("GET", "/api/transcripts", Some(ADMIN_PASS))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_transcript_not_found_and_delete() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, _) = send(&router, empty_request("GET", "/api/transcripts/nope", Some(ADMIN_PASS))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &router,
        json_request("POST", "/api/agent", json!({"conversationId": "gone", "role": "user"}), None),
    )
    .await?;

    let (status, body) = send(&router, empty_request("DELETE", "/api/transcripts/gone", Some(ADMIN_PASS))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (status, _) = send(&router, empty_request("DELETE", "/api/transcripts/gone", Some(ADMIN_PASS))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

// =============================================================================
// Articles
// =============================================================================

#[tokio::test]
async fn test_article_lifecycle() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, created) = send(
        &router,
        json_request(
            "POST",
            "/api/articles",
            json!({"title": "Voice agents for clinics", "body": "…", "id": "ignored"}),
            Some(ADMIN_PASS),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_ne!(id, "ignored");

    let (status, list) = send(&router, empty_request("GET", "/api/articles", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Voice agents for clinics");

    let (status, updated) = send(
        &router,
        json_request(
            "PUT",
            &format!("/api/articles/{}", id),
            json!({"title": "Voice agents for dental clinics"}),
            Some(ADMIN_PASS),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Voice agents for dental clinics");
    assert_eq!(updated["body"], "…");

    let (status, article) = send(&router, empty_request("GET", &format!("/api/articles/{}", id), None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(article["id"], id.as_str());
    assert_eq!(article["title"], "Voice agents for dental clinics");

    let (status, _) = send(
        &router,
        empty_request("DELETE", &format!("/api/articles/{}", id), Some(ADMIN_PASS)),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&router, empty_request("GET", &format!("/api/articles/{}", id), None)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_article_writes_require_admin() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, _) = send(
        &router,
        json_request("POST", "/api/articles", json!({"title": "x"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &router,
        json_request(
            "PUT",
            "/api/articles/00000000-0000-0000-0000-000000000000",
            json!({"title": "x"}),
            Some(ADMIN_PASS),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

// =============================================================================
// Vendor-backed endpoints
// =============================================================================

#[tokio::test]
async fn test_chat_proxies_to_agent() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, body) = send(
        &router,
        json_request("POST", "/api/chat", json!({"message": "hello", "conversationId": "c9"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "[c9] echo: hello");

    let (status, _) = send(&router, json_request("POST", "/api/chat", json!({}), None)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_vendor_failure_is_generic_500() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, body) = send(
        &router,
        json_request("POST", "/api/chat", json!({"message": "explode"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(!error.contains("internal upstream detail"));

    Ok(())
}

#[tokio::test]
async fn test_tts_returns_base64_wav() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, body) = send(&router, json_request("POST", "/api/tts", json!({"text": "Hello"}), None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mimeType"], "audio/wav");

    let audio = base64::engine::general_purpose::STANDARD.decode(body["audio"].as_str().unwrap())?;
    assert_eq!(audio, b"RIFF:Hello");

    let (status, _) = send(&router, json_request("POST", "/api/tts", json!({"text": "   "}), None)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_solution_uses_answers() -> Result<()> {
    let (app, router) = admin_app().await?;

    let (status, body) = send(
        &router,
        json_request("POST", "/api/solution", json!({"answers": "Law firm, 12 staff"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "LLM: Prospect answers:");

    let calls = app.llm.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1.contains("Law firm, 12 staff"));

    let (status, _) = send(&router, json_request("POST", "/api/solution", json!({"answers": null}), None)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_summary_reads_transcript() -> Result<()> {
    let (app, router) = admin_app().await?;

    let (status, _) = send(
        &router,
        json_request("POST", "/api/summary", json!({"conversationId": "missing"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for (role, text) in [("user", "We run three gyms"), ("assistant", "Let's automate sign-ups")] {
        send(
            &router,
            json_request(
                "POST",
                "/api/agent",
                json!({"conversationId": "s1", "role": role, "text": text}),
                None,
            ),
        )
        .await?;
    }

    let (status, body) = send(
        &router,
        json_request("POST", "/api/summary", json!({"conversationId": "s1"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "LLM: user: We run three gyms");

    let calls = app.llm.calls.lock().unwrap().clone();
    assert_eq!(
        calls.last().unwrap().1,
        "user: We run three gyms\nassistant: Let's automate sign-ups"
    );

    Ok(())
}

#[tokio::test]
async fn test_summary_of_textless_transcript_is_rejected() -> Result<()> {
    let (_app, router) = admin_app().await?;

    send(
        &router,
        json_request("POST", "/api/agent", json!({"conversationId": "quiet", "role": "system"}), None),
    )
    .await?;

    let (status, _) = send(
        &router,
        json_request("POST", "/api/summary", json!({"conversationId": "quiet"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_realtime_bootstrap() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, session) = send(
        &router,
        json_request("POST", "/api/realtime/session", json!({"instructions": "Be brief"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["client_secret"]["value"], "ek_test");
    assert_eq!(session["instructions"], "Be brief");

    // Body is optional
    let (status, session) = send(&router, empty_request("POST", "/api/realtime/session", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["id"], "sess_test");

    let (status, body) = send(
        &router,
        json_request("POST", "/api/realtime/say", json!({"text": "Welcome to NeuroBiz"}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["type"], "response.create");
    assert!(body["event"]["response"]["instructions"]
        .as_str()
        .unwrap()
        .contains("Welcome to NeuroBiz"));

    Ok(())
}

#[tokio::test]
async fn test_realtime_session_rejects_malformed_body() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/realtime/session")
        .header("content-type", "application/json")
        .body(Body::from("{\"instructions\": "))
        .unwrap();
    let (status, body) = send(&router, malformed).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &router,
        json_request("POST", "/api/realtime/session", json!({"instructions": 5}), None),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (_app, router) = admin_app().await?;

    let (status, body) = send(&router, empty_request("GET", "/health", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());

    Ok(())
}
