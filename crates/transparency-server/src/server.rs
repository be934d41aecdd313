/// MCP server for product transparency scoring.
///
/// Tools follow the questionnaire workflow: create a product, ask up to five
/// questions (`generate_question`), record answers, then score and report.
use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tracing::warn;

use transparency_common::model::Product;
use transparency_common::tool_api::{
    AnswerListResponse, AnswerSavedResponse, AnswersClearedResponse, CreateProductParams,
    GenerateQuestionParams, GeneratedQuestionResponse, ProductCreatedResponse, ProductIdParams,
    ProductListResponse, SaveAnswerParams,
};

use crate::error::AppError;
use crate::service::TransparencyService;
use crate::store::{ReportRecord, ScoreRecord};

#[derive(Clone)]
pub struct TransparencyServer {
    service: TransparencyService,
    tool_router: ToolRouter<TransparencyServer>,
}

impl TransparencyServer {
    pub fn new(service: TransparencyService) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl TransparencyServer {
    #[tool(description = "Register a product for transparency review. Category is one of food, cosmetics, electronics, clothing, other.")]
    async fn create_product(
        &self,
        Parameters(params): Parameters<CreateProductParams>,
    ) -> Result<Json<ProductCreatedResponse>, String> {
        let product = self.service.create_product(params).await.map_err(tool_error)?;
        Ok(Json(ProductCreatedResponse {
            product_id: product.id,
        }))
    }

    #[tool(description = "Get a product by id.")]
    async fn get_product(
        &self,
        Parameters(params): Parameters<ProductIdParams>,
    ) -> Result<Json<Product>, String> {
        let product = self
            .service
            .get_product(&params.product_id)
            .await
            .map_err(tool_error)?;
        Ok(Json(product))
    }

    #[tool(description = "List all products in creation order.")]
    async fn list_products(&self) -> Result<Json<ProductListResponse>, String> {
        let products = self.service.list_products().await.map_err(tool_error)?;
        Ok(Json(ProductListResponse {
            count: products.len(),
            products,
        }))
    }

    #[tool(description = "Get the next transparency question for a product category. current_step is the number of questions already asked; after five questions the questionnaire is complete. Falls back to a static question when the LLM is unavailable.")]
    async fn generate_question(
        &self,
        Parameters(params): Parameters<GenerateQuestionParams>,
    ) -> Result<Json<GeneratedQuestionResponse>, String> {
        let response = self
            .service
            .generate_question(params)
            .await
            .map_err(tool_error)?;
        Ok(Json(response))
    }

    #[tool(description = "Record an answer to a transparency question for a product.")]
    async fn save_answer(
        &self,
        Parameters(params): Parameters<SaveAnswerParams>,
    ) -> Result<Json<AnswerSavedResponse>, String> {
        let answer = self.service.save_answer(params).await.map_err(tool_error)?;
        Ok(Json(AnswerSavedResponse { answer_id: answer.id }))
    }

    #[tool(description = "List a product's answers ordered by questionnaire step.")]
    async fn list_answers(
        &self,
        Parameters(params): Parameters<ProductIdParams>,
    ) -> Result<Json<AnswerListResponse>, String> {
        let answers = self
            .service
            .list_answers(&params.product_id)
            .await
            .map_err(tool_error)?;
        Ok(Json(AnswerListResponse {
            count: answers.len(),
            answers,
        }))
    }

    #[tool(description = "Delete all answers recorded for a product.")]
    async fn clear_answers(
        &self,
        Parameters(params): Parameters<ProductIdParams>,
    ) -> Result<Json<AnswersClearedResponse>, String> {
        let deleted_count = self
            .service
            .clear_answers(&params.product_id)
            .await
            .map_err(tool_error)?;
        Ok(Json(AnswersClearedResponse { deleted_count }))
    }

    #[tool(description = "Compute the transparency score (0-100) with its completeness, detail and compliance breakdown and up to five recommendations. Replaces the product's stored score.")]
    async fn calculate_score(
        &self,
        Parameters(params): Parameters<ProductIdParams>,
    ) -> Result<Json<ScoreRecord>, String> {
        let record = self
            .service
            .calculate_score(&params.product_id)
            .await
            .map_err(tool_error)?;
        Ok(Json(record))
    }

    #[tool(description = "Get the product's most recently calculated score.")]
    async fn get_score(
        &self,
        Parameters(params): Parameters<ProductIdParams>,
    ) -> Result<Json<ScoreRecord>, String> {
        let record = self
            .service
            .get_score(&params.product_id)
            .await
            .map_err(tool_error)?;
        Ok(Json(record))
    }

    #[tool(description = "Generate the product transparency report (rating, analysis, compliance areas, summary). Calculates a score first if none is stored. Replaces the product's stored report.")]
    async fn generate_report(
        &self,
        Parameters(params): Parameters<ProductIdParams>,
    ) -> Result<Json<ReportRecord>, String> {
        let record = self
            .service
            .generate_report(&params.product_id)
            .await
            .map_err(tool_error)?;
        Ok(Json(record))
    }

    #[tool(description = "Get the product's most recently generated report.")]
    async fn get_report(
        &self,
        Parameters(params): Parameters<ProductIdParams>,
    ) -> Result<Json<ReportRecord>, String> {
        let record = self
            .service
            .get_report(&params.product_id)
            .await
            .map_err(tool_error)?;
        Ok(Json(record))
    }
}

fn tool_error(err: AppError) -> String {
    match err {
        AppError::Common(e) => {
            warn!(error = %e, "storage operation failed");
            format!("storage error: {e}")
        }
        other => other.to_string(),
    }
}

#[tool_handler]
impl ServerHandler for TransparencyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "transparency-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Product transparency MCP server. Create a product with create_product, \
                 walk through up to five questions with generate_question and save_answer, \
                 then use calculate_score for the weighted transparency score and \
                 generate_report for the full report. get_score and get_report return \
                 the stored results."
                    .to_string(),
            ),
        }
    }
}
