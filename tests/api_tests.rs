// tests/api_tests.rs

mod common;

use common::spawn_app;
use quiz_backend::models::user::Role;
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn missing_token_is_401() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/users")).send().await.unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn invalid_token_is_401() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/courses"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn user_crud_works() {
    // Arrange
    let app = spawn_app().await;
    let admin = app.admin_token();

    // Act: create
    let response = app
        .client
        .post(app.url("/api/users"))
        .bearer_auth(&admin)
        .json(&json!({"full_name": "Ada Lovelace", "email": "ada@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["role"], "user");
    let id = user["id"].as_str().unwrap().to_string();

    // Duplicate e-mail
    let response = app
        .client
        .post(app.url("/api/users"))
        .bearer_auth(&admin)
        .json(&json!({"full_name": "Someone Else", "email": "ada@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Partial update keeps untouched fields
    let response = app
        .client
        .put(app.url(&format!("/api/users/{id}")))
        .bearer_auth(&admin)
        .json(&json!({"role": "teacher"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["role"], "teacher");
    assert_eq!(updated["full_name"], "Ada Lovelace");

    // Delete, then it is gone
    let response = app
        .client
        .delete(app.url(&format!("/api/users/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url(&format!("/api/users/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn create_user_rejects_bad_email() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/users"))
        .bearer_auth(app.admin_token())
        .json(&json!({"full_name": "Bob", "email": "nope"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn page_size_out_of_range_is_400() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/users?page=1&page_size=101"))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn users_list_is_paginated() {
    let app = spawn_app().await;
    for name in ["A", "B", "C"] {
        app.create_user(name, "user").await;
    }

    let response = app
        .client
        .get(app.url("/api/users?page=1&page_size=2"))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["total_page"], 2);
    assert_eq!(body["next"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn join_and_kick_course() {
    // Arrange
    let app = spawn_app().await;
    let (teacher_id, teacher_token) = app.create_user("Teacher", "teacher").await;
    let (student_id, student_token) = app.create_user("Student", "user").await;
    let course = app.create_course(teacher_id).await;
    let course_id = course["id"].as_str().unwrap();
    let code = course["code"].as_str().unwrap();

    // Act: join by code
    let response = app
        .client
        .post(app.url(&format!("/api/courses/join?course_code={code}")))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    // Joining twice conflicts
    let response = app
        .client
        .post(app.url(&format!("/api/courses/join?course_code={code}")))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let enrolled: Value = app
        .client
        .get(app.url("/api/courses/enrolled"))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(enrolled["total_items"], 1);
    assert_eq!(enrolled["data"][0]["id"], course_id);

    let students: Value = app
        .client
        .get(app.url(&format!("/api/courses/{course_id}/students")))
        .bearer_auth(&teacher_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(students["data"][0]["id"], json!(student_id));

    // A student may not kick
    let kick_url = app.url(&format!("/api/courses/{course_id}/kick/{student_id}"));
    let response = app
        .client
        .delete(&kick_url)
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // The course teacher may
    let response = app
        .client
        .delete(&kick_url)
        .bearer_auth(&teacher_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .delete(&kick_url)
        .bearer_auth(&teacher_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn join_unknown_code_is_404() {
    let app = spawn_app().await;
    let (_, token) = app.create_user("Student", "user").await;

    let response = app
        .client
        .post(app.url("/api/courses/join?course_code=DOES-NOT-EXIST"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn plain_user_cannot_create_quiz() {
    let app = spawn_app().await;
    let (teacher_id, _) = app.create_user("Teacher", "teacher").await;
    let course = app.create_course(teacher_id).await;
    let student_token = app.token(Uuid::new_v4(), Role::User);

    let response = app
        .client
        .post(app.url("/api/quizzes"))
        .bearer_auth(&student_token)
        .json(&json!({"title": "Nope", "course_id": course["id"]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn create_quiz_for_unknown_course_is_404() {
    let app = spawn_app().await;
    let (_, teacher_token) = app.create_user("Teacher", "teacher").await;

    let response = app
        .client
        .post(app.url("/api/quizzes"))
        .bearer_auth(&teacher_token)
        .json(&json!({"title": "Orphan", "course_id": Uuid::new_v4()}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn quiz_questions_round_trip() {
    // Arrange
    let app = spawn_app().await;
    let (teacher_id, teacher_token) = app.create_user("Teacher", "teacher").await;
    let course = app.create_course(teacher_id).await;
    let quiz = app
        .create_quiz(&teacher_token, course["id"].as_str().unwrap(), Some(3))
        .await;
    let quiz_id = quiz["id"].as_str().unwrap();
    assert_eq!(quiz["teacher_id"], json!(teacher_id));

    // Act
    app.add_questions(&teacher_token, quiz_id, 3).await;
    let response = app
        .client
        .get(app.url(&format!("/api/quizzes/{quiz_id}/questions?page=1&page_size=2")))
        .bearer_auth(&teacher_token)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["next"], 2);
    assert_eq!(body["data"][0]["content"], "Question 0");
    assert_eq!(body["data"][0]["type"], "SINGLE_CHOICE");
    assert_eq!(body["data"][0]["options"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn quiz_patch_clears_cap() {
    let app = spawn_app().await;
    let (teacher_id, teacher_token) = app.create_user("Teacher", "teacher").await;
    let course = app.create_course(teacher_id).await;
    let quiz = app
        .create_quiz(&teacher_token, course["id"].as_str().unwrap(), Some(2))
        .await;
    let quiz_id = quiz["id"].as_str().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/quizzes/{quiz_id}")))
        .bearer_auth(&teacher_token)
        .json(&json!({"max_attempts": null}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["max_attempts"].is_null());
    assert_eq!(body["title"], "Weekly quiz");
}

#[tokio::test]
async fn deleting_course_removes_its_quizzes() {
    let app = spawn_app().await;
    let (teacher_id, teacher_token) = app.create_user("Teacher", "teacher").await;
    let course = app.create_course(teacher_id).await;
    let course_id = course["id"].as_str().unwrap();
    let quiz = app.create_quiz(&teacher_token, course_id, None).await;

    let response = app
        .client
        .delete(app.url(&format!("/api/courses/{course_id}")))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url(&format!("/api/quizzes/{}", quiz["id"].as_str().unwrap())))
        .bearer_auth(&teacher_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
