mod user;
pub use user::{UserEntity, UserEntityCreate};

mod course;
pub use course::{Course, CourseCreate};

mod lesson;
pub use lesson::{Lesson, LessonCreate};

mod quiz;
pub use quiz::{Quiz, QuizCreate};

mod question;
pub use question::{Question, QuestionCreate};

mod enrollment;
pub use enrollment::{Enrollment, EnrollmentCreate, EnrollmentWithNamesRow};

mod submission;
pub use submission::{Submission, SubmissionCreate};
