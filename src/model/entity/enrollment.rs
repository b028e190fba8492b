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
pub struct Enrollment {
    id: Uuid,
    student_id: Uuid,
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
    progress: f64,
    completed: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct EnrollmentCreate {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub progress: f64,
    pub completed: bool,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> Uuid {
        self.student_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn completed(&self) -> bool {
        self.completed
    }
}

#[async_trait]
impl CrudRepository<Enrollment, EnrollmentCreate, Uuid> for Enrollment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: EnrollmentCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query("INSERT INTO enrollments (id, student_id, course_id, progress, completed) VALUES ($1,$2,$3,$4,$5) RETURNING id, enrolled_at")
            .bind(Uuid::new_v4())
            .bind(data.student_id)
            .bind(data.course_id)
            .bind(data.progress)
            .bind(data.completed)
            .fetch_one(mm.executor())
            .await?;

        let id = result.try_get("id")?;
        let enrolled_at = result.try_get("enrolled_at")?;
        Ok(Enrollment {
            id,
            student_id: data.student_id,
            course_id: data.course_id,
            enrolled_at,
            progress: data.progress,
            completed: data.completed,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: EnrollmentCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE enrollments SET progress = $1, completed = $2 WHERE id = $3")
            .bind(data.progress)
            .bind(data.completed)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.progress = data.progress;
        self.completed = data.completed;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM enrollments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM enrollments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM enrollments LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Enrollment {
    pub async fn find_by_student_and_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        student_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM enrollments WHERE student_id = $1 AND course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn exists(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        student_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<bool> {
        Ok(Self::find_by_student_and_course(mm, actor, student_id, course_id)
            .await?
            .is_some())
    }
}

#[async_trait]
impl HasOwner for Enrollment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.student_id)
    }
}

// Utils

/// Enrollment joined with the student and course names, the shape returned
/// by the progress endpoint.
#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct EnrollmentWithNamesRow {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub course_id: Uuid,
    pub course_title: String,
    pub progress: f64,
    pub completed: bool,
}

impl EnrollmentWithNamesRow {
    pub async fn find_by_student_and_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        student_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let row = sqlx::query_as(
            r#"
            SELECT
                e.id,
                e.student_id,
                u.username AS student_name,
                e.course_id,
                c.title AS course_title,
                e.progress,
                e.completed
            FROM enrollments e
            JOIN users u ON u.id = e.student_id
            JOIN courses c ON c.id = e.course_id
            WHERE e.student_id = $1 AND e.course_id = $2
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(row)
    }

    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                e.id,
                e.student_id,
                u.username AS student_name,
                e.course_id,
                c.title AS course_title,
                e.progress,
                e.completed
            FROM enrollments e
            JOIN users u ON u.id = e.student_id
            JOIN courses c ON c.id = e.course_id
            WHERE e.course_id = $1
            ORDER BY e.enrolled_at
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
