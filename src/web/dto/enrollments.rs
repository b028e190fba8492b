use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::EnrollmentWithNamesRow;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EnrollmentResponse {
    id: Uuid,
    student_id: Uuid,
    student_name: String,
    course_id: Uuid,
    course_title: String,
    progress: f64,
    completed: bool,
}

impl From<EnrollmentWithNamesRow> for EnrollmentResponse {
    fn from(row: EnrollmentWithNamesRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            course_id: row.course_id,
            course_title: row.course_title,
            progress: row.progress,
            completed: row.completed,
        }
    }
}
