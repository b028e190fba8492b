use clap::{Parser, Subcommand};
use eduflow::model::entity::{
    Course,
    CourseCreate,
    Lesson,
    LessonCreate,
    Question,
    QuestionCreate,
    Quiz,
    QuizCreate,
    UserEntity,
    UserEntityCreate,
};
use eduflow::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use eduflow::web::AuthenticatedUser;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the course DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage quizzes
    Quiz {
        #[command(subcommand)]
        action: QuizCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// `student`, `instructor` or `admin`
        #[arg(long, default_value = "student")]
        role: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        /// Email of the instructor owning the course
        #[arg(long)]
        instructor_email: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Course title to attach the lesson to
        #[arg(long)]
        course_title: String,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Quiz management
#[derive(Subcommand, Debug)]
pub enum QuizCommands {
    Add {
        /// Lesson title to attach the quiz to
        #[arg(long)]
        lesson_title: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = true)]
        is_active: bool,
    },
    AddQuestion {
        /// Quiz title to attach the question to
        #[arg(long)]
        quiz_title: String,
        #[arg(long)]
        question_text: String,
        /// JSON array of option strings, e.g. '["a", "b", "c"]'
        #[arg(long)]
        options: String,
        #[arg(long)]
        correct_option: i32,
        #[arg(long, default_value_t = 1)]
        points: i32,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

#[tokio::main]
async fn main() -> eduflow::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let db_con = DbConnection::connect(&std::env::var("DATABASE_URL").unwrap())?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { email, username, password, role } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreate {
                        email,
                        username,
                        password_hash: eduflow::auth::hash_password(&password).unwrap(),
                        role,
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { instructor_email, title, description } => {
                let instructor_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
                        .bind(&instructor_email)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(|e| DatabaseError::SqlxError(e))?;

                let course = Course::create(
                    &mm,
                    &actor,
                    CourseCreate {
                        instructor_id,
                        title,
                        description,
                    },
                )
                .await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add { course_title, title, file, order_index } => {
                let course_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM courses WHERE title = $1")
                        .bind(&course_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(|e| DatabaseError::SqlxError(e))?;

                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        course_id,
                        title,
                        content,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Quiz { action } => match action {
            QuizCommands::Add { lesson_title, title, description, is_active } => {
                let lesson_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM lessons WHERE title = $1")
                        .bind(&lesson_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(|e| DatabaseError::SqlxError(e))?;

                let quiz = Quiz::create(
                    &mm,
                    &actor,
                    QuizCreate {
                        lesson_id,
                        title,
                        description,
                        is_active: Some(is_active),
                    },
                )
                .await?;
                println!("Quiz created: {:?}", quiz);
            }

            QuizCommands::AddQuestion {
                quiz_title,
                question_text,
                options,
                correct_option,
                points,
                order_index,
            } => {
                let quiz_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM quizzes WHERE title = $1")
                        .bind(&quiz_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(|e| DatabaseError::SqlxError(e))?;

                let options: serde_json::Value =
                    serde_json::from_str(&options).map_err(DatabaseError::SerdeError)?;

                let question = Question::create(
                    &mm,
                    &actor,
                    QuestionCreate {
                        quiz_id,
                        question_text,
                        options,
                        correct_option,
                        points: Some(points),
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Question created: {:?}", question);
            }
        },
    }

    Ok(())
}
