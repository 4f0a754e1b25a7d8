// src/repositories/memory.rs

//! In-memory implementation of every repository trait.
//!
//! All tables live behind a single `RwLock`, so each operation is atomic with
//! respect to the others. Orderings and cascades mirror the Postgres schema.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        attempt::{Attempt, AttemptAnswer, AttemptFilter, AttemptWithUser, NewAttemptAnswer},
        course::{Course, Enrollment},
        question::{CreateQuestionRequest, Question, QuestionOption, QuestionWithOptions},
        quiz::Quiz,
        user::User,
    },
    repositories::{
        AttemptRepository, CourseRepository, QuestionRepository, QuizRepository, UserRepository,
    },
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    courses: HashMap<Uuid, Course>,
    enrollments: Vec<Enrollment>,
    quizzes: HashMap<Uuid, Quiz>,
    questions: HashMap<Uuid, Question>,
    options: HashMap<Uuid, QuestionOption>,
    attempts: HashMap<Uuid, Attempt>,
    answers: Vec<AttemptAnswer>,
}

impl Tables {
    fn remove_attempts_where(&mut self, pred: impl Fn(&Attempt) -> bool) {
        let doomed: Vec<Uuid> = self
            .attempts
            .values()
            .filter(|a| pred(*a))
            .map(|a| a.id)
            .collect();
        for id in &doomed {
            self.attempts.remove(id);
        }
        self.answers.retain(|a| !doomed.contains(&a.attempt_id));
    }

    fn remove_quiz(&mut self, quiz_id: Uuid) {
        self.quizzes.remove(&quiz_id);
        self.remove_attempts_where(|a| a.quiz_id == quiz_id);

        let questions: Vec<Uuid> = self
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .map(|q| q.id)
            .collect();
        for id in &questions {
            self.questions.remove(id);
        }
        self.options.retain(|_, o| !questions.contains(&o.question_id));
        self.answers.retain(|a| !questions.contains(&a.question_id));
    }

    fn options_of(&self, question_id: Uuid) -> Vec<QuestionOption> {
        let mut options: Vec<QuestionOption> = self
            .options
            .values()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect();
        options.sort_by_key(|o| o.position);
        options
    }

    fn position_of(&self, question_id: Uuid) -> i32 {
        self.questions
            .get(&question_id)
            .map(|q| q.position)
            .unwrap_or(i32::MAX)
    }
}

/// Slices one page out of an already ordered list and reports the total.
fn paginate<T>(items: Vec<T>, offset: i64, limit: i64) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let page = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (page, total)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: User) -> AppResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' already exists",
                user.email
            )));
        }
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        let t = self.tables.read().await;
        let mut users: Vec<User> = t.users.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(paginate(users, offset, limit))
    }

    async fn update(&self, user: &User) -> AppResult<Option<User>> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&user.id) {
            return Ok(None);
        }
        if t.users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(AppError::Conflict(format!(
                "Email '{}' already exists",
                user.email
            )));
        }
        t.users.insert(user.id, user.clone());
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.write().await;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.enrollments.retain(|e| e.user_id != id);
        t.remove_attempts_where(|a| a.user_id == id);
        for course in t.courses.values_mut() {
            if course.teacher_id == Some(id) {
                course.teacher_id = None;
            }
        }
        for quiz in t.quizzes.values_mut() {
            if quiz.teacher_id == Some(id) {
                quiz.teacher_id = None;
            }
        }
        Ok(true)
    }
}

fn course_conflict(t: &Tables, course: &Course) -> Option<AppError> {
    let others = t.courses.values().filter(|c| c.id != course.id);
    for other in others {
        if other.code == course.code {
            return Some(AppError::Conflict(format!(
                "Course code '{}' already exists",
                course.code
            )));
        }
        if other.name == course.name {
            return Some(AppError::Conflict(format!(
                "Course name '{}' already exists",
                course.name
            )));
        }
    }
    None
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn create(&self, course: Course) -> AppResult<Course> {
        let mut t = self.tables.write().await;
        if let Some(err) = course_conflict(&t, &course) {
            return Err(err);
        }
        t.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Course>> {
        Ok(self.tables.read().await.courses.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Course>> {
        let t = self.tables.read().await;
        Ok(t.courses.values().find(|c| c.code == code).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Course>, i64)> {
        let t = self.tables.read().await;
        let mut courses: Vec<Course> = t.courses.values().cloned().collect();
        courses.sort_by_key(|c| (c.created_at, c.id));
        Ok(paginate(courses, offset, limit))
    }

    async fn list_enrolled(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Course>, i64)> {
        let t = self.tables.read().await;
        let mut rows: Vec<(DateTime<Utc>, Course)> = t
            .enrollments
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| t.courses.get(&e.course_id).map(|c| (e.joined_at, c.clone())))
            .collect();
        rows.sort_by_key(|(joined_at, c)| (*joined_at, c.id));
        let courses = rows.into_iter().map(|(_, c)| c).collect();
        Ok(paginate(courses, offset, limit))
    }

    async fn update(&self, course: &Course) -> AppResult<Option<Course>> {
        let mut t = self.tables.write().await;
        if !t.courses.contains_key(&course.id) {
            return Ok(None);
        }
        if let Some(err) = course_conflict(&t, course) {
            return Err(err);
        }
        t.courses.insert(course.id, course.clone());
        Ok(Some(course.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.write().await;
        if t.courses.remove(&id).is_none() {
            return Ok(false);
        }
        t.enrollments.retain(|e| e.course_id != id);
        let quizzes: Vec<Uuid> = t
            .quizzes
            .values()
            .filter(|q| q.course_id == id)
            .map(|q| q.id)
            .collect();
        for quiz_id in quizzes {
            t.remove_quiz(quiz_id);
        }
        Ok(true)
    }

    async fn find_enrollment(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Enrollment>> {
        let t = self.tables.read().await;
        Ok(t.enrollments
            .iter()
            .find(|e| e.course_id == course_id && e.user_id == user_id)
            .cloned())
    }

    async fn create_enrollment(&self, enrollment: Enrollment) -> AppResult<Enrollment> {
        let mut t = self.tables.write().await;
        if t.enrollments
            .iter()
            .any(|e| e.course_id == enrollment.course_id && e.user_id == enrollment.user_id)
        {
            return Err(AppError::Conflict("User already enrolled".to_string()));
        }
        t.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn delete_enrollment(&self, course_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.enrollments.len();
        t.enrollments
            .retain(|e| !(e.course_id == course_id && e.user_id == user_id));
        Ok(t.enrollments.len() < before)
    }

    async fn list_students(
        &self,
        course_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<User>, i64)> {
        let t = self.tables.read().await;
        let mut rows: Vec<(DateTime<Utc>, User)> = t
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .filter_map(|e| t.users.get(&e.user_id).map(|u| (e.joined_at, u.clone())))
            .collect();
        rows.sort_by_key(|(joined_at, u)| (*joined_at, u.id));
        let users = rows.into_iter().map(|(_, u)| u).collect();
        Ok(paginate(users, offset, limit))
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        let mut t = self.tables.write().await;
        t.quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Quiz>> {
        Ok(self.tables.read().await.quizzes.get(&id).cloned())
    }

    async fn list_by_course(
        &self,
        course_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Quiz>, i64)> {
        let t = self.tables.read().await;
        let mut quizzes: Vec<Quiz> = t
            .quizzes
            .values()
            .filter(|q| q.course_id == course_id)
            .cloned()
            .collect();
        quizzes.sort_by_key(|q| (q.created_at, q.id));
        Ok(paginate(quizzes, offset, limit))
    }

    async fn update(&self, quiz: &Quiz) -> AppResult<Option<Quiz>> {
        let mut t = self.tables.write().await;
        match t.quizzes.get_mut(&quiz.id) {
            Some(existing) => {
                *existing = quiz.clone();
                Ok(Some(quiz.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut t = self.tables.write().await;
        if !t.quizzes.contains_key(&id) {
            return Ok(false);
        }
        t.remove_quiz(id);
        Ok(true)
    }
}

#[async_trait]
impl QuestionRepository for MemoryStore {
    async fn add_questions(
        &self,
        quiz_id: Uuid,
        questions: Vec<CreateQuestionRequest>,
    ) -> AppResult<Vec<QuestionWithOptions>> {
        let mut t = self.tables.write().await;
        let mut position = t
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .map(|q| q.position + 1)
            .max()
            .unwrap_or(0);

        let mut created = Vec::with_capacity(questions.len());
        for req in questions {
            let question = Question {
                id: Uuid::new_v4(),
                quiz_id,
                content: req.content,
                question_type: req.question_type,
                points: req.points,
                position,
            };
            position += 1;

            let options: Vec<QuestionOption> = req
                .options
                .into_iter()
                .enumerate()
                .map(|(index, opt)| QuestionOption {
                    id: Uuid::new_v4(),
                    question_id: question.id,
                    content: opt.content,
                    is_correct: opt.is_correct,
                    position: index as i32,
                })
                .collect();

            t.questions.insert(question.id, question.clone());
            for option in &options {
                t.options.insert(option.id, option.clone());
            }
            created.push(QuestionWithOptions { question, options });
        }
        Ok(created)
    }

    async fn find_question(&self, id: Uuid) -> AppResult<Option<Question>> {
        Ok(self.tables.read().await.questions.get(&id).cloned())
    }

    async fn find_option(&self, id: Uuid) -> AppResult<Option<QuestionOption>> {
        Ok(self.tables.read().await.options.get(&id).cloned())
    }

    async fn count_by_quiz(&self, quiz_id: Uuid) -> AppResult<i64> {
        let t = self.tables.read().await;
        Ok(t.questions.values().filter(|q| q.quiz_id == quiz_id).count() as i64)
    }

    async fn list_by_quiz(
        &self,
        quiz_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuestionWithOptions>, i64)> {
        let t = self.tables.read().await;
        let mut questions: Vec<Question> = t
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.position);

        let (page, total) = paginate(questions, offset, limit);
        let items = page
            .into_iter()
            .map(|question| {
                let options = t.options_of(question.id);
                QuestionWithOptions { question, options }
            })
            .collect();
        Ok((items, total))
    }
}

fn attempt_order(a: &Attempt) -> (DateTime<Utc>, i32, Uuid) {
    (a.started_at, a.attempt_number, a.id)
}

#[async_trait]
impl AttemptRepository for MemoryStore {
    async fn count_for(&self, user_id: Uuid, quiz_id: Uuid) -> AppResult<i64> {
        let t = self.tables.read().await;
        Ok(t.attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .count() as i64)
    }

    async fn latest_for(&self, user_id: Uuid, quiz_id: Uuid) -> AppResult<Option<Attempt>> {
        let t = self.tables.read().await;
        Ok(t.attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .max_by_key(|a| a.attempt_number)
            .cloned())
    }

    async fn create_next(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        started_at: DateTime<Utc>,
        max_attempts: Option<i32>,
    ) -> AppResult<Option<Attempt>> {
        let mut t = self.tables.write().await;
        let existing: Vec<i32> = t
            .attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .map(|a| a.attempt_number)
            .collect();

        if let Some(max) = max_attempts {
            if existing.len() as i64 >= i64::from(max) {
                return Ok(None);
            }
        }

        let attempt = Attempt {
            id: Uuid::new_v4(),
            user_id,
            quiz_id,
            attempt_number: existing.iter().copied().max().unwrap_or(0) + 1,
            score: None,
            started_at,
            finished_at: None,
        };
        t.attempts.insert(attempt.id, attempt.clone());
        Ok(Some(attempt))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Attempt>> {
        Ok(self.tables.read().await.attempts.get(&id).cloned())
    }

    async fn finish(
        &self,
        attempt_id: Uuid,
        answers: Vec<NewAttemptAnswer>,
        score: f64,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>> {
        let mut t = self.tables.write().await;
        let attempt = match t.attempts.get_mut(&attempt_id) {
            Some(a) if a.finished_at.is_none() => {
                a.score = Some(score);
                a.finished_at = Some(finished_at);
                a.clone()
            }
            _ => return Ok(None),
        };

        t.answers.extend(answers.into_iter().map(|a| AttemptAnswer {
            id: Uuid::new_v4(),
            attempt_id,
            question_id: a.question_id,
            option_id: a.option_id,
            is_correct: a.is_correct,
            score: a.score,
        }));
        Ok(Some(attempt))
    }

    async fn answers_for(&self, attempt_id: Uuid) -> AppResult<Vec<AttemptAnswer>> {
        let t = self.tables.read().await;
        let mut answers: Vec<AttemptAnswer> = t
            .answers
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect();
        answers.sort_by_key(|a| t.position_of(a.question_id));
        Ok(answers)
    }

    async fn list(
        &self,
        filter: AttemptFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Attempt>, i64)> {
        let t = self.tables.read().await;
        let mut attempts: Vec<Attempt> = t
            .attempts
            .values()
            .filter(|a| filter.user_id.is_none_or(|id| a.user_id == id))
            .filter(|a| filter.quiz_id.is_none_or(|id| a.quiz_id == id))
            .cloned()
            .collect();
        attempts.sort_by_key(attempt_order);
        Ok(paginate(attempts, offset, limit))
    }

    async fn list_by_quiz_with_users(&self, quiz_id: Uuid) -> AppResult<Vec<AttemptWithUser>> {
        let t = self.tables.read().await;
        let mut attempts: Vec<Attempt> = t
            .attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect();
        attempts.sort_by_key(attempt_order);
        Ok(attempts
            .into_iter()
            .map(|attempt| {
                let user_name = t.users.get(&attempt.user_id).map(|u| u.full_name.clone());
                AttemptWithUser { attempt, user_name }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use std::sync::Arc;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Test User".to_string(),
            email: email.to_string(),
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        UserRepository::create(&store, user("a@example.com"))
            .await
            .unwrap();

        let err = UserRepository::create(&store, user("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_attempt_numbers_and_cap() {
        let store = MemoryStore::new();
        let (u, q) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store.create_next(u, q, Utc::now(), Some(2)).await.unwrap();
        let second = store.create_next(u, q, Utc::now(), Some(2)).await.unwrap();
        let third = store.create_next(u, q, Utc::now(), Some(2)).await.unwrap();

        assert_eq!(first.unwrap().attempt_number, 1);
        assert_eq!(second.unwrap().attempt_number, 2);
        assert!(third.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_starts_get_distinct_numbers() {
        let store = Arc::new(MemoryStore::new());
        let (u, q) = (Uuid::new_v4(), Uuid::new_v4());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let store = store.clone();
            tasks.spawn(async move { store.create_next(u, q, Utc::now(), None).await });
        }

        let mut numbers = Vec::new();
        while let Some(res) = tasks.join_next().await {
            numbers.push(res.unwrap().unwrap().unwrap().attempt_number);
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_concurrent_starts_respect_cap() {
        let store = Arc::new(MemoryStore::new());
        let (u, q) = (Uuid::new_v4(), Uuid::new_v4());

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..6 {
            let store = store.clone();
            tasks.spawn(async move { store.create_next(u, q, Utc::now(), Some(3)).await });
        }

        let mut created = 0;
        while let Some(res) = tasks.join_next().await {
            if res.unwrap().unwrap().is_some() {
                created += 1;
            }
        }
        assert_eq!(created, 3);
        assert_eq!(store.count_for(u, q).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_finish_is_one_shot() {
        let store = MemoryStore::new();
        let attempt = store
            .create_next(Uuid::new_v4(), Uuid::new_v4(), Utc::now(), None)
            .await
            .unwrap()
            .unwrap();

        let done = store
            .finish(attempt.id, Vec::new(), 5.0, Utc::now())
            .await
            .unwrap();
        assert_eq!(done.unwrap().score, Some(5.0));

        let again = store
            .finish(attempt.id, Vec::new(), 9.0, Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());

        let stored = AttemptRepository::find_by_id(&store, attempt.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.score, Some(5.0));
    }

    #[tokio::test]
    async fn test_deleting_user_removes_attempts() {
        let store = MemoryStore::new();
        let owner = UserRepository::create(&store, user("owner@example.com"))
            .await
            .unwrap();
        let quiz_id = Uuid::new_v4();
        store
            .create_next(owner.id, quiz_id, Utc::now(), None)
            .await
            .unwrap();

        assert!(UserRepository::delete(&store, owner.id).await.unwrap());
        assert_eq!(store.count_for(owner.id, quiz_id).await.unwrap(), 0);
    }
}
