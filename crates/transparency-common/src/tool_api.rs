use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Answer, Product};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateProductParams {
    /// Product name (required).
    pub name: String,
    /// One of: food, cosmetics, electronics, clothing, other (case-insensitive).
    pub category: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProductIdParams {
    /// 24-character hex product id returned by create_product.
    pub product_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SaveAnswerParams {
    pub product_id: String,
    /// The question that was asked.
    pub question: String,
    /// The answer given.
    pub answer: String,
    /// 1-based questionnaire step (default: 1).
    pub step: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateQuestionParams {
    /// Product category; drives the question focus and the fallback bank.
    pub category: String,
    /// Number of questions already answered (0-based index of the next question).
    pub current_step: u32,
    pub previous_answer: Option<String>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductCreatedResponse {
    pub product_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerSavedResponse {
    pub answer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerListResponse {
    pub answers: Vec<Answer>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswersClearedResponse {
    pub deleted_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedQuestionResponse {
    /// `None` once the questionnaire is complete.
    pub next_question: Option<String>,
    pub is_complete: bool,
    /// Step index to send with the next request.
    pub current_step: u32,
    /// True when the static fallback bank was used instead of the LLM.
    pub fallback: bool,
}
