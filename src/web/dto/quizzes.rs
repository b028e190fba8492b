use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Question, Quiz};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionResponse {
    id: Uuid,
    question_text: String,
    options: serde_json::Value,
    points: i32,
    order_index: i32,
    /// Present for the owning instructor (and admin) only.
    #[serde(skip_serializing_if = "Option::is_none")]
    correct_option: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizWithQuestions {
    id: Uuid,
    lesson_id: Uuid,
    title: String,
    description: String,
    is_active: bool,
    questions: Vec<QuestionResponse>,
}

impl QuizWithQuestions {
    pub fn from_entity(quiz: Quiz, questions: Vec<Question>, reveal_answers: bool) -> Self {
        Self {
            id: quiz.id(),
            lesson_id: quiz.lesson_id(),
            title: quiz.title().to_string(),
            description: quiz.description().to_string(),
            is_active: quiz.is_active(),
            questions: questions
                .into_iter()
                .map(|q| QuestionResponse {
                    id: q.id(),
                    question_text: q.question_text().to_string(),
                    options: q.options().clone(),
                    points: q.points(),
                    order_index: q.order_index(),
                    correct_option: if reveal_answers {
                        Some(q.correct_option())
                    } else {
                        None
                    },
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuizSubmitRequest {
    /// Selected option index per question, in question order.
    pub answers: Vec<i32>,
}
