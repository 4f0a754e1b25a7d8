// src/services/course.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        course::{Course, CoursePatch, CreateCourseRequest, Enrollment},
        pagination::{PageParams, PaginatedResponse},
        user::User,
    },
    repositories::{CourseRepository, UserRepository},
};

pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    users: Arc<dyn UserRepository>,
}

impl CourseService {
    pub fn new(courses: Arc<dyn CourseRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { courses, users }
    }

    pub async fn create(&self, req: CreateCourseRequest) -> AppResult<Course> {
        if let Some(teacher_id) = req.teacher_id {
            self.ensure_user(teacher_id, "Teacher not found").await?;
        }

        let course = Course {
            id: Uuid::new_v4(),
            name: req.name.trim().to_string(),
            code: req.code.trim().to_string(),
            teacher_id: req.teacher_id,
            created_at: Utc::now(),
        };

        let course = self.courses.create(course).await?;
        tracing::info!("Created course {} ({})", course.id, course.code);
        Ok(course)
    }

    pub async fn list(&self, params: PageParams) -> AppResult<PaginatedResponse<Course>> {
        let (courses, total) = self.courses.list(params.offset(), params.limit()).await?;
        Ok(PaginatedResponse::new(params, total, courses))
    }

    /// Courses the given user is enrolled in, oldest enrollment first.
    pub async fn list_enrolled(
        &self,
        user_id: Uuid,
        params: PageParams,
    ) -> AppResult<PaginatedResponse<Course>> {
        let (courses, total) = self
            .courses
            .list_enrolled(user_id, params.offset(), params.limit())
            .await?;
        Ok(PaginatedResponse::new(params, total, courses))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Course> {
        self.courses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    pub async fn update(&self, id: Uuid, patch: CoursePatch) -> AppResult<Course> {
        let mut course = self.get(id).await?;
        if let Some(Some(teacher_id)) = patch.teacher_id {
            self.ensure_user(teacher_id, "Teacher not found").await?;
        }

        patch.apply_to(&mut course);
        course.name = course.name.trim().to_string();
        course.code = course.code.trim().to_string();

        self.courses
            .update(&course)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.courses.delete(id).await? {
            return Err(AppError::NotFound("Course not found".to_string()));
        }
        tracing::info!("Deleted course {}", id);
        Ok(())
    }

    /// Enrolls `user_id` into the course identified by its join code.
    pub async fn join(&self, user_id: Uuid, course_code: &str) -> AppResult<Enrollment> {
        let course = self
            .courses
            .find_by_code(course_code.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        self.ensure_user(user_id, "User not found").await?;

        if self.courses.find_enrollment(course.id, user_id).await?.is_some() {
            return Err(AppError::Conflict("User already enrolled".to_string()));
        }

        let enrollment = self
            .courses
            .create_enrollment(Enrollment {
                id: Uuid::new_v4(),
                course_id: course.id,
                user_id,
                joined_at: Utc::now(),
            })
            .await?;

        tracing::info!("User {} joined course {}", user_id, course.id);
        Ok(enrollment)
    }

    pub async fn list_students(
        &self,
        course_id: Uuid,
        params: PageParams,
    ) -> AppResult<PaginatedResponse<User>> {
        self.get(course_id).await?;
        let (users, total) = self
            .courses
            .list_students(course_id, params.offset(), params.limit())
            .await?;
        Ok(PaginatedResponse::new(params, total, users))
    }

    /// Removes a student from a course.
    ///
    /// Allowed for the course's teacher and for admins only.
    pub async fn kick(
        &self,
        course_id: Uuid,
        student_id: Uuid,
        caller_id: Uuid,
        caller_is_admin: bool,
    ) -> AppResult<()> {
        let course = self.get(course_id).await?;
        if !caller_is_admin && course.teacher_id != Some(caller_id) {
            return Err(AppError::Forbidden(
                "Only the course teacher can remove students".to_string(),
            ));
        }

        if !self.courses.delete_enrollment(course_id, student_id).await? {
            return Err(AppError::NotFound("Enrollment not found".to_string()));
        }

        tracing::info!(
            "User {} removed student {} from course {}",
            caller_id,
            student_id,
            course_id
        );
        Ok(())
    }

    async fn ensure_user(&self, id: Uuid, missing: &str) -> AppResult<()> {
        match self.users.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(missing.to_string())),
        }
    }
}
