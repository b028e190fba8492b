use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Question {
    id: Uuid,
    quiz_id: Uuid,
    question_text: String,
    /// JSON array of option strings.
    options: serde_json::Value,
    correct_option: i32,
    points: i32,
    order_index: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuestionCreate {
    pub quiz_id: Uuid,
    pub question_text: String,
    pub options: serde_json::Value,
    pub correct_option: i32,
    pub points: Option<i32>,
    pub order_index: Option<i32>,
}

impl ResourceTyped for Question {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Question
    }
}

impl Question {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    pub fn options(&self) -> &serde_json::Value {
        &self.options
    }

    pub fn correct_option(&self) -> i32 {
        self.correct_option
    }

    pub fn points(&self) -> i32 {
        self.points
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[async_trait]
impl CrudRepository<Question, QuestionCreate, Uuid> for Question {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("INSERT INTO questions (id, quiz_id, question_text, options, correct_option, points, order_index) VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(data.quiz_id)
            .bind(&data.question_text)
            .bind(&data.options)
            .bind(data.correct_option)
            .bind(data.points.unwrap_or(1))
            .bind(data.order_index.unwrap_or(0))
            .fetch_one(mm.executor())
            .await?;

        let id = result.try_get("id")?;
        Ok(Question {
            id,
            quiz_id: data.quiz_id,
            question_text: data.question_text,
            options: data.options,
            correct_option: data.correct_option,
            points: data.points.unwrap_or(1),
            order_index: data.order_index.unwrap_or(0),
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuestionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE questions SET question_text = $1, options = $2, correct_option = $3, points = $4, order_index = $5 WHERE id = $6")
            .bind(&data.question_text)
            .bind(&data.options)
            .bind(data.correct_option)
            .bind(data.points.unwrap_or(self.points))
            .bind(data.order_index.unwrap_or(self.order_index))
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.question_text = data.question_text;
        self.points = data.points.unwrap_or(self.points);
        self.order_index = data.order_index.unwrap_or(self.order_index);
        self.options = data.options;
        self.correct_option = data.correct_option;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM questions LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Question {
    /// Questions of a quiz, in the order submissions are graded against.
    pub async fn all_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM questions WHERE quiz_id = $1 ORDER BY order_index, id")
                .bind(quiz_id)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Question {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let instructor_id: Uuid = sqlx::query_scalar(
            r#"
            SELECT c.instructor_id
            FROM courses c
            JOIN lessons l ON l.course_id = c.id
            JOIN quizzes q ON q.lesson_id = l.id
            WHERE q.id = $1
            "#,
        )
        .bind(self.quiz_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(instructor_id)
    }
}
