/// Product transparency workflow: products, answers, scores and reports.
///
/// Inputs are validated here before anything touches storage. Scores and
/// reports are recomputed from the stored product and its answers and then
/// written back as the product's current record.
use chrono::Utc;
use tracing::info;

use transparency_common::model::{is_valid_record_id, Answer, Category, Product};
use transparency_common::tool_api::{
    CreateProductParams, GenerateQuestionParams, GeneratedQuestionResponse, SaveAnswerParams,
};
use transparency_scorer::{compute_score, generate_report, rating_for};

use crate::error::AppError;
use crate::questions::{QuestionOutcome, QuestionRequest, QuestionSource};
use crate::store::{ReportRecord, ScoreRecord, Store};

const DEFAULT_STEP: u32 = 1;

#[derive(Clone)]
pub struct TransparencyService {
    store: Store,
    questions: QuestionSource,
}

impl TransparencyService {
    pub fn new(store: Store, questions: QuestionSource) -> Self {
        Self { store, questions }
    }

    pub async fn create_product(&self, params: CreateProductParams) -> Result<Product, AppError> {
        let name = required("name", &params.name)?;
        let category = parse_category(&params.category)?;
        let product = Product::new(
            name,
            category,
            optional(params.description),
            optional(params.manufacturer),
        );

        self.store.insert_product(&product).await?;
        info!(product_id = %product.id, %category, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product, AppError> {
        let id = product_id_arg(product_id)?;
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::not_found("product", id))
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.store.list_products().await?)
    }

    pub async fn generate_question(
        &self,
        params: GenerateQuestionParams,
    ) -> Result<GeneratedQuestionResponse, AppError> {
        let request = QuestionRequest {
            category: parse_category(&params.category)?,
            current_step: params.current_step,
            previous_answer: optional(params.previous_answer),
            product_name: optional(params.product_name),
            product_description: optional(params.product_description),
        };

        let response = match self.questions.next_question(&request).await {
            QuestionOutcome::Complete => GeneratedQuestionResponse {
                next_question: None,
                is_complete: true,
                current_step: request.current_step,
                fallback: false,
            },
            QuestionOutcome::Generated(question) => GeneratedQuestionResponse {
                next_question: Some(question),
                is_complete: false,
                current_step: request.current_step + 1,
                fallback: false,
            },
            QuestionOutcome::Fallback(question) => GeneratedQuestionResponse {
                next_question: Some(question),
                is_complete: false,
                current_step: request.current_step + 1,
                fallback: true,
            },
        };
        Ok(response)
    }

    pub async fn save_answer(&self, params: SaveAnswerParams) -> Result<Answer, AppError> {
        let product = self.get_product(&params.product_id).await?;
        let question = required("question", &params.question)?;
        let answer = required("answer", &params.answer)?;
        let step = params.step.unwrap_or(DEFAULT_STEP);
        if step == 0 {
            return Err(AppError::validation("step must be 1 or greater"));
        }

        let answer = Answer::new(&product.id, question, answer, step);
        self.store.append_answer(&answer).await?;
        info!(product_id = %product.id, answer_id = %answer.id, step, "answer saved");
        Ok(answer)
    }

    pub async fn list_answers(&self, product_id: &str) -> Result<Vec<Answer>, AppError> {
        let product = self.get_product(product_id).await?;
        Ok(self.store.answers(&product.id).await?)
    }

    pub async fn clear_answers(&self, product_id: &str) -> Result<usize, AppError> {
        let product = self.get_product(product_id).await?;
        let deleted = self.store.delete_answers(&product.id).await?;
        info!(product_id = %product.id, deleted, "answers cleared");
        Ok(deleted)
    }

    pub async fn calculate_score(&self, product_id: &str) -> Result<ScoreRecord, AppError> {
        let product = self.get_product(product_id).await?;
        let answers = self.store.answers(&product.id).await?;
        self.score_and_store(&product, &answers).await
    }

    pub async fn get_score(&self, product_id: &str) -> Result<ScoreRecord, AppError> {
        let id = product_id_arg(product_id)?;
        self.store
            .get_score(id)
            .await?
            .ok_or_else(|| AppError::not_found("score", id))
    }

    /// Build and store a report. Uses the product's current score, computing
    /// and storing one first when none exists.
    pub async fn generate_report(&self, product_id: &str) -> Result<ReportRecord, AppError> {
        let product = self.get_product(product_id).await?;
        let answers = self.store.answers(&product.id).await?;

        let score = match self.store.get_score(&product.id).await? {
            Some(record) => record,
            None => self.score_and_store(&product, &answers).await?,
        };

        let generated_at = Utc::now();
        let record = ReportRecord {
            product_id: product.id.clone(),
            transparency_score: score.transparency_score,
            report: generate_report(&product, &answers, &score.to_score(), generated_at),
            generated_at,
        };
        self.store.put_report(&record).await?;
        info!(
            product_id = %product.id,
            score = record.transparency_score,
            rating = %record.report.transparency_score.rating,
            "report generated"
        );
        Ok(record)
    }

    pub async fn get_report(&self, product_id: &str) -> Result<ReportRecord, AppError> {
        let id = product_id_arg(product_id)?;
        self.store
            .get_report(id)
            .await?
            .ok_or_else(|| AppError::not_found("report", id))
    }

    async fn score_and_store(
        &self,
        product: &Product,
        answers: &[Answer],
    ) -> Result<ScoreRecord, AppError> {
        let score = compute_score(product, answers);
        let record = ScoreRecord::new(&product.id, score, answers.len(), Utc::now());
        self.store.put_score(&record).await?;
        info!(
            product_id = %product.id,
            score = record.transparency_score,
            rating = %rating_for(record.transparency_score),
            answers = answers.len(),
            "score calculated"
        );
        Ok(record)
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(value)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_category(raw: &str) -> Result<Category, AppError> {
    let raw = required("category", raw)?;
    raw.parse::<Category>()
        .map_err(|e| AppError::validation(e.to_string()))
}

fn product_id_arg(raw: &str) -> Result<&str, AppError> {
    let id = raw.trim();
    if !is_valid_record_id(id) {
        return Err(AppError::validation(format!(
            "invalid product id format: {raw}"
        )));
    }
    Ok(id)
}
