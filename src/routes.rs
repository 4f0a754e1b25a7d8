// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempt, course, quiz, user},
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Every `/api` route requires a valid bearer token.
/// * Quiz authoring additionally requires the teacher or admin role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let attempt_routes = Router::new()
        .route(
            "/",
            get(attempt::list_attempts).post(attempt::start_attempt),
        )
        .route("/by_quiz/{quiz_id}", get(attempt::attempts_by_quiz))
        .route("/{id}", get(attempt::get_attempt))
        .route("/{id}/submit", post(attempt::submit_attempt));

    let user_routes = Router::new()
        .route("/", get(user::list_users).post(user::create_user))
        .route(
            "/{id}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        );

    let course_routes = Router::new()
        .route("/", get(course::list_courses).post(course::create_course))
        .route("/enrolled", get(course::list_enrolled_courses))
        .route("/join", post(course::join_course))
        .route(
            "/{id}",
            get(course::get_course)
                .put(course::update_course)
                .delete(course::delete_course),
        )
        .route("/{id}/students", get(course::list_course_students))
        .route("/{id}/kick/{student_id}", delete(course::kick_student));

    let quiz_routes = Router::new()
        .route("/course/{course_id}", get(quiz::list_course_quizzes))
        .route(
            "/{id}",
            get(quiz::get_quiz)
                .put(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        .route("/{id}/questions", get(quiz::list_questions))
        // Authoring routes: auth first, then the role check
        .merge(
            Router::new()
                .route("/", post(quiz::create_quiz))
                .route("/{id}/questions", post(quiz::add_questions))
                .route_layer(middleware::from_fn(teacher_middleware)),
        );

    let api_routes = Router::new()
        .nest("/attempts", attempt_routes)
        .nest("/users", user_routes)
        .nest("/courses", course_routes)
        .nest("/quizzes", quiz_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
