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
pub struct Quiz {
    id: Uuid,
    lesson_id: Uuid,
    title: String,
    description: String,
    is_active: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QuizCreate {
    pub lesson_id: Uuid,
    pub title: String,
    pub description: String,
    pub is_active: Option<bool>,
}

impl ResourceTyped for Quiz {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Quiz
    }
}

impl Quiz {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lesson_id(&self) -> Uuid {
        self.lesson_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

#[async_trait]
impl CrudRepository<Quiz, QuizCreate, Uuid> for Quiz {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("INSERT INTO quizzes (id, lesson_id, title, description, is_active) VALUES ($1,$2,$3,$4,$5) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(data.lesson_id)
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.is_active.unwrap_or(true))
            .fetch_one(mm.executor())
            .await?;

        let id = result.try_get("id")?;
        Ok(Quiz {
            id,
            lesson_id: data.lesson_id,
            title: data.title,
            description: data.description,
            is_active: data.is_active.unwrap_or(true),
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: QuizCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE quizzes SET title = $1, description = $2, is_active = $3 WHERE id = $4")
            .bind(&data.title)
            .bind(&data.description)
            .bind(data.is_active.unwrap_or(self.is_active))
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.title = data.title;
        self.description = data.description;
        self.is_active = data.is_active.unwrap_or(self.is_active);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM quizzes WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quizzes WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM quizzes LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quizzes")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Quiz {
    pub async fn all_by_lesson(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        lesson_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM quizzes WHERE lesson_id = $1")
            .bind(lesson_id)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    /// Course the quiz belongs to, through its lesson.
    pub async fn course_id(&self, mm: &ModelManager) -> DatabaseResult<Uuid> {
        let course_id: Uuid = sqlx::query_scalar("SELECT course_id FROM lessons WHERE id = $1")
            .bind(self.lesson_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(course_id)
    }
}

#[async_trait]
impl HasOwner for Quiz {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let instructor_id: Uuid = sqlx::query_scalar(
            "SELECT c.instructor_id FROM courses c JOIN lessons l ON l.course_id = c.id WHERE l.id = $1",
        )
        .bind(self.lesson_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(instructor_id)
    }
}
