// src/services/mod.rs

pub mod attempt;
pub mod course;
pub mod quiz;
pub mod report;
pub mod scoring;
pub mod user;

pub use attempt::AttemptService;
pub use course::CourseService;
pub use quiz::QuizService;
pub use report::ReportService;
pub use user::UserService;
