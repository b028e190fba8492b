pub mod enrollments;
pub mod quizzes;
