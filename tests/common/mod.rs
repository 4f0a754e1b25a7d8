// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use quiz_backend::{
    config::Config, models::user::Role, repositories::MemoryStore, routes, state::AppState,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};
use uuid::Uuid;

const TEST_SECRET: &str = "test_secret_for_integration_tests";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

/// Spawns the app over a fresh in-memory store on a random port.
pub async fn spawn_app() -> TestApp {
    let config = Config {
        database_url: String::new(),
        jwt_secret: TEST_SECRET.to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 1,
    };

    let state = AppState::in_memory(Arc::new(MemoryStore::new()), config);
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

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Mints a token the way the external identity provider would.
    pub fn token(&self, user_id: Uuid, role: Role) -> String {
        sign_jwt(user_id, role, TEST_SECRET, 600).unwrap()
    }

    /// A token for an admin that does not need to exist in the store.
    pub fn admin_token(&self) -> String {
        self.token(Uuid::new_v4(), Role::Admin)
    }

    pub async fn create_user(&self, full_name: &str, role: &str) -> (Uuid, String) {
        let email = format!("{}@example.com", Uuid::new_v4().simple());
        let response = self
            .client
            .post(self.url("/api/users"))
            .bearer_auth(self.admin_token())
            .json(&json!({"full_name": full_name, "email": email, "role": role}))
            .send()
            .await
            .expect("Failed to create user");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
        let role = match role {
            "teacher" => Role::Teacher,
            "admin" => Role::Admin,
            _ => Role::User,
        };
        (id, self.token(id, role))
    }

    pub async fn create_course(&self, teacher_id: Uuid) -> Value {
        let code = format!("C-{}", &Uuid::new_v4().simple().to_string()[..8]);
        let response = self
            .client
            .post(self.url("/api/courses"))
            .bearer_auth(self.admin_token())
            .json(&json!({"name": format!("Course {code}"), "code": code, "teacher_id": teacher_id}))
            .send()
            .await
            .expect("Failed to create course");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn create_quiz(
        &self,
        teacher_token: &str,
        course_id: &str,
        max_attempts: Option<i32>,
    ) -> Value {
        let response = self
            .client
            .post(self.url("/api/quizzes"))
            .bearer_auth(teacher_token)
            .json(&json!({
                "title": "Weekly quiz",
                "description": "Chapter 1",
                "course_id": course_id,
                "max_attempts": max_attempts,
                "is_published": true
            }))
            .send()
            .await
            .expect("Failed to create quiz");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    /// Adds `count` single-choice questions, each with one right and one wrong option.
    pub async fn add_questions(&self, teacher_token: &str, quiz_id: &str, count: usize) -> Vec<Value> {
        let questions: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "content": format!("Question {i}"),
                    "type": "SINGLE_CHOICE",
                    "points": 1,
                    "options": [
                        {"content": "right", "is_correct": true},
                        {"content": "wrong", "is_correct": false}
                    ]
                })
            })
            .collect();

        let response = self
            .client
            .post(self.url(&format!("/api/quizzes/{quiz_id}/questions")))
            .bearer_auth(teacher_token)
            .json(&questions)
            .send()
            .await
            .expect("Failed to add questions");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }
}

/// `{question_id, option_id}` answering `question` with its right or wrong option.
pub fn answer(question: &Value, correct: bool) -> Value {
    let option = question["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["is_correct"].as_bool() == Some(correct))
        .unwrap();
    json!({"question_id": question["id"], "option_id": option["id"]})
}
