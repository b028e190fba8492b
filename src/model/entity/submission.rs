use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Submission {
    id: Uuid,
    student_id: Uuid,
    quiz_id: Uuid,
    /// JSON array of selected option indices, one per question.
    answers: serde_json::Value,
    score: i32,
    submitted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmissionCreate {
    pub student_id: Uuid,
    pub quiz_id: Uuid,
    pub answers: serde_json::Value,
    pub score: i32,
}

impl ResourceTyped for Submission {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Submission
    }
}

impl Submission {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> Uuid {
        self.student_id
    }

    pub fn quiz_id(&self) -> Uuid {
        self.quiz_id
    }

    pub fn answers(&self) -> &serde_json::Value {
        &self.answers
    }

    pub fn score(&self) -> i32 {
        self.score
    }
}

#[async_trait]
impl CrudRepository<Submission, SubmissionCreate, Uuid> for Submission {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SubmissionCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("INSERT INTO submissions (id, student_id, quiz_id, answers, score) VALUES ($1,$2,$3,$4,$5) RETURNING id, submitted_at")
            .bind(Uuid::new_v4())
            .bind(data.student_id)
            .bind(data.quiz_id)
            .bind(&data.answers)
            .bind(data.score)
            .fetch_one(mm.executor())
            .await?;

        let id = result.try_get("id")?;
        let submitted_at = result.try_get("submitted_at")?;
        Ok(Submission {
            id,
            student_id: data.student_id,
            quiz_id: data.quiz_id,
            answers: data.answers,
            score: data.score,
            submitted_at,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: SubmissionCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE submissions SET answers = $1, score = $2 WHERE id = $3")
            .bind(&data.answers)
            .bind(data.score)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.answers = data.answers;
        self.score = data.score;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM submissions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM submissions WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM submissions LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Submission {
    pub async fn find_by_student_and_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        student_id: Uuid,
        quiz_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM submissions WHERE student_id = $1 AND quiz_id = $2")
                .bind(student_id)
                .bind(quiz_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    pub async fn all_by_quiz(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        quiz_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM submissions WHERE quiz_id = $1 ORDER BY submitted_at")
                .bind(quiz_id)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Submission {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.student_id)
    }
}
