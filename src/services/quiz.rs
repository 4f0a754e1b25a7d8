// src/services/quiz.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::{PageParams, PaginatedResponse},
        question::{CreateQuestionRequest, QuestionWithOptions},
        quiz::{CreateQuizRequest, Quiz, QuizPatch, QuizSummary},
    },
    repositories::{AttemptRepository, CourseRepository, QuestionRepository, QuizRepository},
    services::scoring::remaining_attempts,
    utils::html::clean_html,
};

pub struct QuizService {
    quizzes: Arc<dyn QuizRepository>,
    courses: Arc<dyn CourseRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl QuizService {
    pub fn new(
        quizzes: Arc<dyn QuizRepository>,
        courses: Arc<dyn CourseRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            quizzes,
            courses,
            questions,
            attempts,
        }
    }

    /// Creates a quiz in an existing course, authored by `teacher_id`.
    pub async fn create(&self, teacher_id: Uuid, req: CreateQuizRequest) -> AppResult<Quiz> {
        if self.courses.find_by_id(req.course_id).await?.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let quiz = Quiz {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            description: req.description.as_deref().map(clean_html),
            course_id: req.course_id,
            teacher_id: Some(teacher_id),
            time_limit: req.time_limit,
            max_attempts: req.max_attempts,
            total_points: req.total_points,
            is_published: req.is_published,
            created_at: Utc::now(),
        };

        let quiz = self.quizzes.create(quiz).await?;
        tracing::info!("Teacher {} created quiz {}", teacher_id, quiz.id);
        Ok(quiz)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Quiz> {
        self.quizzes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    pub async fn update(&self, id: Uuid, patch: QuizPatch) -> AppResult<Quiz> {
        patch.check_ranges().map_err(AppError::BadRequest)?;

        let mut quiz = self.get(id).await?;
        patch.apply_to(&mut quiz);
        quiz.description = quiz.description.as_deref().map(clean_html);

        self.quizzes
            .update(&quiz)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.quizzes.delete(id).await? {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        tracing::info!("Deleted quiz {}", id);
        Ok(())
    }

    /// Quizzes of a course, each annotated with `user_id`'s attempt counters.
    pub async fn list_by_course(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        params: PageParams,
    ) -> AppResult<PaginatedResponse<QuizSummary>> {
        if self.courses.find_by_id(course_id).await?.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let (quizzes, total) = self
            .quizzes
            .list_by_course(course_id, params.offset(), params.limit())
            .await?;

        let mut items = Vec::with_capacity(quizzes.len());
        for quiz in quizzes {
            let attempt_count = self.attempts.count_for(user_id, quiz.id).await?;
            let latest = self.attempts.latest_for(user_id, quiz.id).await?;
            items.push(QuizSummary {
                remaining_attempts: remaining_attempts(quiz.max_attempts, attempt_count),
                latest_attempt_finished_at: latest.and_then(|a| a.finished_at),
                attempt_count,
                quiz,
            });
        }

        Ok(PaginatedResponse::new(params, total, items))
    }

    /// Appends questions (with their options) to a quiz, after any existing ones.
    pub async fn add_questions(
        &self,
        quiz_id: Uuid,
        questions: Vec<CreateQuestionRequest>,
    ) -> AppResult<Vec<QuestionWithOptions>> {
        if questions.is_empty() {
            return Err(AppError::BadRequest("No questions supplied".to_string()));
        }
        for question in &questions {
            question.check_option_count().map_err(AppError::BadRequest)?;
        }
        self.get(quiz_id).await?;

        let questions: Vec<CreateQuestionRequest> = questions
            .into_iter()
            .map(|mut q| {
                q.content = clean_html(&q.content);
                for option in &mut q.options {
                    option.content = clean_html(&option.content);
                }
                q
            })
            .collect();

        let created = self.questions.add_questions(quiz_id, questions).await?;
        tracing::info!("Added {} questions to quiz {}", created.len(), quiz_id);
        Ok(created)
    }

    pub async fn list_questions(
        &self,
        quiz_id: Uuid,
        params: PageParams,
    ) -> AppResult<PaginatedResponse<QuestionWithOptions>> {
        self.get(quiz_id).await?;
        let (questions, total) = self
            .questions
            .list_by_quiz(quiz_id, params.offset(), params.limit())
            .await?;
        Ok(PaginatedResponse::new(params, total, questions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            course::Course,
            question::{CreateOptionRequest, QuestionType},
        },
        repositories::MemoryStore,
    };

    async fn setup() -> (Arc<MemoryStore>, QuizService, Course) {
        let store = Arc::new(MemoryStore::new());
        let course = CourseRepository::create(
            store.as_ref(),
            Course {
                id: Uuid::new_v4(),
                name: "Networks".to_string(),
                code: "NET-1".to_string(),
                teacher_id: None,
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        let service = QuizService::new(store.clone(), store.clone(), store.clone(), store.clone());
        (store, service, course)
    }

    fn quiz_request(course_id: Uuid, max_attempts: Option<i32>) -> CreateQuizRequest {
        CreateQuizRequest {
            title: "Sockets".to_string(),
            description: Some("<p>Read chapter 3</p><script>alert(1)</script>".to_string()),
            course_id,
            time_limit: Some(20),
            max_attempts,
            total_points: None,
            is_published: true,
        }
    }

    fn question(content: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            content: content.to_string(),
            question_type: QuestionType::TrueFalse,
            points: 2,
            options: vec![
                CreateOptionRequest {
                    content: "True".to_string(),
                    is_correct: true,
                },
                CreateOptionRequest {
                    content: "False".to_string(),
                    is_correct: false,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_create_requires_course() {
        let (_, service, _) = setup().await;
        let err = service
            .create(Uuid::new_v4(), quiz_request(Uuid::new_v4(), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_sanitizes_description() {
        let (_, service, course) = setup().await;
        let teacher = Uuid::new_v4();

        let quiz = service.create(teacher, quiz_request(course.id, None)).await.unwrap();

        assert_eq!(quiz.description.as_deref(), Some("<p>Read chapter 3</p>"));
        assert_eq!(quiz.teacher_id, Some(teacher));
    }

    #[tokio::test]
    async fn test_questions_keep_insertion_order() {
        let (_, service, course) = setup().await;
        let quiz = service
            .create(Uuid::new_v4(), quiz_request(course.id, None))
            .await
            .unwrap();

        service
            .add_questions(quiz.id, vec![question("first"), question("second")])
            .await
            .unwrap();
        service
            .add_questions(quiz.id, vec![question("third")])
            .await
            .unwrap();

        let page = service
            .list_questions(quiz.id, PageParams::default())
            .await
            .unwrap();
        let contents: Vec<&str> = page.data.iter().map(|q| q.question.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(page.data[0].options[0].content, "True");
        assert_eq!(page.total_items, 3);
    }

    #[tokio::test]
    async fn test_question_without_options_is_rejected() {
        let (_, service, course) = setup().await;
        let quiz = service
            .create(Uuid::new_v4(), quiz_request(course.id, None))
            .await
            .unwrap();

        let mut bad = question("empty");
        bad.options.clear();
        let err = service.add_questions(quiz.id, vec![bad]).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_summary_counts_attempts() {
        let (store, service, course) = setup().await;
        let quiz = service
            .create(Uuid::new_v4(), quiz_request(course.id, Some(2)))
            .await
            .unwrap();
        let user = Uuid::new_v4();

        let attempt = store
            .create_next(user, quiz.id, Utc::now(), Some(2))
            .await
            .unwrap()
            .unwrap();
        let finished_at = Utc::now();
        store
            .finish(attempt.id, Vec::new(), 0.0, finished_at)
            .await
            .unwrap();
        store.create_next(user, quiz.id, Utc::now(), Some(2)).await.unwrap();

        let page = service
            .list_by_course(course.id, user, PageParams::default())
            .await
            .unwrap();
        let summary = &page.data[0];

        assert_eq!(summary.attempt_count, 2);
        assert_eq!(summary.remaining_attempts, Some(0));
        // Latest attempt is #2, still in progress.
        assert_eq!(summary.latest_attempt_finished_at, None);
    }

    #[tokio::test]
    async fn test_update_rejects_negative_cap() {
        let (_, service, course) = setup().await;
        let quiz = service
            .create(Uuid::new_v4(), quiz_request(course.id, None))
            .await
            .unwrap();

        let patch: QuizPatch = serde_json::from_str(r#"{"max_attempts": -3}"#).unwrap();
        let err = service.update(quiz.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
