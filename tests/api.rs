//! API endpoint integration tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tutor_backend::{Result, Tutor, TutorModel};

mod common;
use common::{general_thread, get, post, register, router_with_tutor, send, test_router};

/// Model that records prompts and echoes a fixed reply
struct RecordingModel {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TutorModel for RecordingModel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("Let's work through it together.".to_string())
    }
}

#[tokio::test]
async fn test_health_and_welcome() {
    let router = test_router();

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(&router, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "ok");

    let (_, body) = get(&router, "/").await;
    assert_eq!(body["message"], "Welcome to the AI Tutoring MVP!");
}

#[tokio::test]
async fn test_register_and_login() {
    let router = test_router();
    let user_id = register(&router, "alice").await;

    let (status, body) = post(
        &router,
        "/register",
        json!({ "username": "alice", "password": "other" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "username already registered");

    let (status, _) = post(&router, "/register", json!({ "username": "al", "password": "secret" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = post(&router, "/login", json!({ "username": "alice", "password": "secret" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["role"], "student");

    let (status, _) = post(&router, "/login", json!({ "username": "alice", "password": "wrong" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&router, "/login", json!({ "username": "nobody", "password": "secret" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_user_profile() {
    let router = test_router();
    let user_id = register(&router, "bob").await;

    let (status, body) = get(&router, &format!("/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");
    assert_eq!(body["subscription_status"], "inactive");
    assert_eq!(body["message_count"], 0);
    assert_eq!(body["xp"], 0);
    assert_eq!(body["level"], 0);
    assert_eq!(body["streak_count"], 0);

    let (status, _) = get(&router, "/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, threads) = get(&router, &format!("/threads/{user_id}")).await;
    assert_eq!(threads.as_array().unwrap().len(), 1);
    assert_eq!(threads[0]["name"], "General");
}

#[tokio::test]
async fn test_chat_records_history_and_progress() {
    let router = test_router();
    let user_id = register(&router, "carol").await;
    let thread_id = general_thread(&router, user_id).await;

    for message in ["What is a fraction?", "I think I get it"] {
        let (status, body) = post(
            &router,
            "/chat",
            json!({ "user_id": user_id, "thread_id": thread_id, "message": message }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["response"].as_str().unwrap().is_empty());
    }

    let (_, history) = get(&router, &format!("/history/{user_id}/{thread_id}")).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["message"], "What is a fraction?");
    assert_eq!(history[1]["message"], "I think I get it");

    let (_, profile) = get(&router, &format!("/users/{user_id}")).await;
    assert_eq!(profile["xp"], 20);
    assert_eq!(profile["streak_count"], 1);
    assert_eq!(profile["message_count"], 2);
}

#[tokio::test]
async fn test_chat_rejects_foreign_thread() {
    let router = test_router();
    let owner = register(&router, "owner").await;
    let intruder = register(&router, "intruder").await;
    let thread_id = general_thread(&router, owner).await;

    let (status, _) = post(
        &router,
        "/chat",
        json!({ "user_id": intruder, "thread_id": thread_id, "message": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &router,
        "/chat",
        json!({ "user_id": owner, "thread_id": thread_id, "message": "   " }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_chat_prompt_carries_compacted_context() {
    let model = Arc::new(RecordingModel {
        prompts: Mutex::new(Vec::new()),
    });
    let router = router_with_tutor(Tutor::new(model.clone()));
    let user_id = register(&router, "dana").await;
    let thread_id = general_thread(&router, user_id).await;

    for i in 1..=7 {
        let (status, _) = post(
            &router,
            "/chat",
            json!({ "user_id": user_id, "thread_id": thread_id, "message": format!("q{i}") }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Seventh call saw six prior pairs: one summarized, five verbatim
    let prompts = model.prompts.lock().unwrap();
    let last = prompts.last().unwrap();
    assert!(last.contains("Summary: Student: q1 Tutor: Let's work through it together."));
    assert!(last.contains("Student: q2\nTutor: "));
    assert!(last.contains("Student: q6\nTutor: "));
    assert!(last.contains("\n\nq7"));
    drop(prompts);

    let (status, body) = get(&router, &format!("/summaries/{user_id}/{thread_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["summary"].as_str().unwrap().starts_with("Student: q1"));
}

#[tokio::test]
async fn test_dashboard_badges() {
    let router = test_router();
    let user_id = register(&router, "erin").await;
    let thread_id = general_thread(&router, user_id).await;

    let (_, body) = get(&router, &format!("/dashboard/{user_id}")).await;
    assert_eq!(body["total_messages"], 0);
    assert_eq!(body["badges"], json!([]));

    for i in 0..10 {
        post(
            &router,
            "/chat",
            json!({ "user_id": user_id, "thread_id": thread_id, "message": format!("m{i}") }),
        )
        .await;
    }

    let (status, body) = get(&router, &format!("/dashboard/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_messages"], 10);
    assert_eq!(body["sessions_count"], 1);
    assert_eq!(body["badges"], json!(["First Chat Completed", "10 Messages"]));
    assert_eq!(body["xp"], 100);
    assert_eq!(body["level"], 1);
}

#[tokio::test]
async fn test_goal_lifecycle_awards_bonus() {
    let router = test_router();
    let user_id = register(&router, "frank").await;

    let (status, _) = post(
        &router,
        "/goals",
        json!({ "user_id": user_id, "topic_id": 1, "target_sessions": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(
        &router,
        "/goals",
        json!({ "user_id": user_id, "topic_id": 9999, "target_sessions": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, goal) = post(
        &router,
        "/goals",
        json!({ "user_id": user_id, "topic_id": 1, "description": "Times tables", "target_sessions": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let goal_id = goal["id"].as_i64().unwrap();

    let (_, goal) = post(&router, &format!("/goals/{goal_id}/complete"), json!({})).await;
    assert_eq!(goal["completed_sessions"], 1);
    let (_, profile) = get(&router, &format!("/users/{user_id}")).await;
    assert_eq!(profile["xp"], 0);

    let (_, goal) = post(&router, &format!("/goals/{goal_id}/complete"), json!({})).await;
    assert_eq!(goal["completed_sessions"], 2);
    let (_, profile) = get(&router, &format!("/users/{user_id}")).await;
    assert_eq!(profile["xp"], 50);

    let (status, _) = post(&router, "/goals/4242/complete", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, goals) = get(&router, &format!("/goals/{user_id}")).await;
    assert_eq!(goals.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_goal_templates() {
    let router = test_router();
    let user_id = register(&router, "gina").await;

    let (status, goals) = post(&router, "/goals/templates/math", json!({ "user_id": user_id })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(goals.as_array().unwrap().len(), 2);

    let (status, _) = post(&router, "/goals/templates/astrology", json!({ "user_id": user_id })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&router, "/goals/templates/science", json!({ "user_id": 999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plans() {
    let router = test_router();
    let user_id = register(&router, "hank").await;
    let other = register(&router, "ivy").await;

    let (_, goal) = post(
        &router,
        "/goals",
        json!({ "user_id": user_id, "topic_id": 2, "target_sessions": 3 }),
    )
    .await;
    let goal_id = goal["id"].as_i64().unwrap();

    let (status, body) = post(&router, "/plans", json!({ "user_id": user_id, "goal_ids": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "No goals provided");

    let (status, _) = post(&router, "/plans", json!({ "user_id": other, "goal_ids": [goal_id] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, plan) = post(
        &router,
        "/plans",
        json!({ "user_id": user_id, "goal_ids": [goal_id], "recurrence": "weekly" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["goals"][0]["id"], goal_id);
    let plan_id = plan["id"].as_i64().unwrap();

    let (_, plans) = get(&router, &format!("/plans/{user_id}")).await;
    assert_eq!(plans.as_array().unwrap().len(), 1);

    let (status, body) = send(&router, Method::DELETE, &format!("/plans/{plan_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");

    let (status, _) = send(&router, Method::DELETE, &format!("/plans/{plan_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_topics_and_feedback() {
    let router = test_router();
    let user_id = register(&router, "jack").await;

    let (_, topics) = get(&router, "/topics").await;
    assert_eq!(topics.as_array().unwrap().len(), 20);

    let (status, topic) = post(&router, "/topics", json!({ "name": "Astronomy" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let topic_id = topic["id"].as_i64().unwrap();

    let (status, _) = post(&router, "/topics", json!({ "name": "Astronomy" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &router,
        "/feedback",
        json!({ "user_id": user_id, "topic_id": topic_id, "rating": 6 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(
        &router,
        "/feedback",
        json!({ "user_id": user_id, "topic_id": topic_id, "rating": 5, "comments": "Great" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, feedback) = get(&router, &format!("/feedback/{topic_id}")).await;
    assert_eq!(feedback[0]["rating"], 5);
    assert_eq!(feedback[0]["comments"], "Great");
}

#[tokio::test]
async fn test_summaries() {
    let router = test_router();
    let user_id = register(&router, "kate").await;
    let thread_id = general_thread(&router, user_id).await;

    let (status, _) = get(&router, &format!("/summaries/{user_id}/{thread_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let body = json!({ "user_id": user_id, "thread_id": thread_id, "summary": "Reviewing fractions" });
    let (status, _) = send(&router, Method::PUT, "/summaries", Some(body.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&router, "/summaries", body).await;
    assert_eq!(status, StatusCode::CREATED);

    let updated = json!({ "user_id": user_id, "thread_id": thread_id, "summary": "Reviewing decimals" });
    let (status, _) = send(&router, Method::PUT, "/summaries", Some(updated)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&router, &format!("/summaries/{user_id}/{thread_id}")).await;
    assert_eq!(body["summary"], "Reviewing decimals");
}

#[tokio::test]
async fn test_blank_summary_rejected() {
    let router = test_router();
    let user_id = register(&router, "kira").await;
    let thread_id = general_thread(&router, user_id).await;

    let body = json!({ "user_id": user_id, "thread_id": thread_id, "summary": "   " });
    let (status, _) = post(&router, "/summaries", body.clone()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&router, Method::PUT, "/summaries", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = get(&router, &format!("/summaries/{user_id}/{thread_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_written_summary_regenerated_as_history_grows() {
    let router = test_router();
    let user_id = register(&router, "kobe").await;
    let thread_id = general_thread(&router, user_id).await;

    let chat = |i: usize| json!({ "user_id": user_id, "thread_id": thread_id, "message": format!("q{i}") });
    for i in 1..=7 {
        post(&router, "/chat", chat(i)).await;
    }

    let body = json!({ "user_id": user_id, "thread_id": thread_id, "summary": "Practising times tables" });
    let (status, _) = post(&router, "/summaries", body).await;
    assert_eq!(status, StatusCode::CREATED);

    // Eighth chat still sees the two older pairs the summary was written over
    post(&router, "/chat", chat(8)).await;
    let (_, body) = get(&router, &format!("/summaries/{user_id}/{thread_id}")).await;
    assert_eq!(body["summary"], "Practising times tables");

    // Ninth chat pushes q3 out of the window
    post(&router, "/chat", chat(9)).await;
    let (_, body) = get(&router, &format!("/summaries/{user_id}/{thread_id}")).await;
    let summary = body["summary"].as_str().unwrap();
    assert!(summary.contains("Student: q3"));
    assert!(!summary.contains("times tables"));
}

#[tokio::test]
async fn test_subscription_flow() {
    let router = test_router();
    let user_id = register(&router, "liam").await;

    let (_, sub) = get(&router, &format!("/subscription/{user_id}")).await;
    assert_eq!(sub["status"], "inactive");

    let (status, _) = post(&router, "/subscribe", json!({ "user_id": user_id, "action": "cancel" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(&router, "/subscribe", json!({ "user_id": user_id, "action": "upgrade" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sub) = post(&router, "/subscribe", json!({ "user_id": user_id, "action": "subscribe" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sub["status"], "active");

    let (_, profile) = get(&router, &format!("/users/{user_id}")).await;
    assert_eq!(profile["subscription_status"], "active");

    let (_, sub) = post(&router, "/subscribe", json!({ "user_id": user_id, "action": "cancel" })).await;
    assert_eq!(sub["status"], "inactive");
    assert!(sub["end_date"].is_string());
}

#[tokio::test]
async fn test_materials() {
    let router = test_router();

    let (_, body) = get(&router, "/materials").await;
    let subjects = body["subjects"].as_array().unwrap();
    assert!(subjects.iter().any(|s| s == "math"));

    let (status, body) = get(&router, "/materials/Math").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "math");
    assert!(body["categories"].as_array().unwrap().iter().any(|c| c == "algebra"));

    let (status, body) = get(&router, "/materials/math/algebra").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["units"].is_array());

    let (status, body) = get(&router, "/materials/math/calculus").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Category not found");

    let (status, body) = get(&router, "/materials/alchemy").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Subject not found");
}
