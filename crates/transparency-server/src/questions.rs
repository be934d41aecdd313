/// Transparency questionnaire: LLM-generated questions with a static fallback.
///
/// A questionnaire has at most [`MAX_QUESTIONS`] questions. Each request names
/// the 0-based step it wants; the LLM is asked for one question focused on the
/// product's category, and any failure (no API key, rate limit, upstream error,
/// empty completion) is answered from the fallback bank instead.
use std::sync::Arc;

use tracing::{debug, warn};

use transparency_common::model::Category;
use transparency_common::openai::{ChatCompletionRequest, Message, OpenAiClient};

use crate::config::QuestionSettings;
use crate::rate_limit::RateLimiter;

pub const MAX_QUESTIONS: u32 = 5;

const SYSTEM_PROMPT: &str = "You are a product transparency expert who generates insightful \
questions to help assess product transparency. Generate only ONE specific question that would \
help evaluate product transparency. Be direct and professional.";

const CLOSING_QUESTION: &str = "What additional transparency information would you like to share?";

const FOOD_QUESTIONS: [&str; 5] = [
    "What are the specific sources and origins of your main ingredients?",
    "What quality control measures are in place during manufacturing?",
    "What allergens are present and how are cross-contamination risks managed?",
    "What nutritional testing and verification processes do you follow?",
    "What sustainability practices are implemented in your supply chain?",
];

const COSMETICS_QUESTIONS: [&str; 5] = [
    "What are the concentrations and sources of active ingredients used?",
    "What dermatological testing has been conducted on this product?",
    "What allergens or potential irritants should consumers be aware of?",
    "What preservation methods are used to maintain product stability?",
    "What sustainability measures are implemented in packaging and production?",
];

const ELECTRONICS_QUESTIONS: [&str; 5] = [
    "What materials and components are used in manufacturing this product?",
    "What safety certifications and testing standards does this product meet?",
    "What is the expected product lifespan and failure rates?",
    "What recycling or disposal programs are available for this product?",
    "What data privacy and security measures are implemented?",
];

static FOOD_FOCUS: [&str; 6] = [
    "Ingredient sourcing and origin",
    "Manufacturing processes and quality control",
    "Nutritional information and testing",
    "Allergen information and safety measures",
    "Sustainability and ethical practices",
    "Regulatory compliance and certifications",
];

static COSMETICS_FOCUS: [&str; 6] = [
    "Active ingredient concentrations and sources",
    "Safety testing and dermatological approval",
    "Skin compatibility and allergen information",
    "Manufacturing standards and quality control",
    "Packaging sustainability and recycling",
    "Regulatory compliance and certifications",
];

static ELECTRONICS_FOCUS: [&str; 6] = [
    "Component sourcing and material composition",
    "Manufacturing processes and quality standards",
    "Safety certifications and testing procedures",
    "Environmental impact and recycling programs",
    "Warranty terms and customer support",
    "Data privacy and security measures",
];

static GENERAL_FOCUS: [&str; 5] = [
    "Material sourcing and supply chain",
    "Manufacturing processes and quality control",
    "Safety standards and testing procedures",
    "Environmental impact and sustainability",
    "Regulatory compliance and certifications",
];

#[derive(Debug, Clone)]
pub struct QuestionRequest {
    pub category: Category,
    /// 0-based index of the question being requested
    pub current_step: u32,
    pub previous_answer: Option<String>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOutcome {
    /// All questions have been asked.
    Complete,
    Generated(String),
    Fallback(String),
}

#[derive(Clone)]
pub struct QuestionSource {
    client: Option<Arc<OpenAiClient>>,
    settings: QuestionSettings,
    limiter: Option<RateLimiter>,
}

impl QuestionSource {
    pub fn new(
        client: Option<Arc<OpenAiClient>>,
        settings: QuestionSettings,
        limiter: Option<RateLimiter>,
    ) -> Self {
        Self {
            client,
            settings,
            limiter,
        }
    }

    /// Source that never calls an LLM.
    #[cfg(test)]
    pub fn fallback_only() -> Self {
        Self::new(None, QuestionSettings::default(), None)
    }

    pub fn uses_llm(&self) -> bool {
        self.client.is_some()
    }

    pub async fn next_question(&self, request: &QuestionRequest) -> QuestionOutcome {
        if request.current_step >= MAX_QUESTIONS {
            return QuestionOutcome::Complete;
        }

        match self.generate(request).await {
            Some(question) => QuestionOutcome::Generated(question),
            None => QuestionOutcome::Fallback(
                fallback_question(request.category, request.current_step).to_string(),
            ),
        }
    }

    async fn generate(&self, request: &QuestionRequest) -> Option<String> {
        let client = self.client.as_ref()?;

        if let Some(limiter) = &self.limiter {
            if let Err(wait) = limiter.try_acquire().await {
                warn!(
                    rps = limiter.rps(),
                    retry_in_ms = wait.as_millis(),
                    "question generation rate limited, using fallback"
                );
                return None;
            }
        }

        let chat = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(build_prompt(request))],
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
        };

        match client.chat_completions(chat, None).await {
            Ok(response) => {
                let question = response.first_text().map(str::to_string);
                if question.is_none() {
                    warn!(step = request.current_step, "empty completion, using fallback");
                }
                question
            }
            Err(e) => {
                warn!(error = %e, step = request.current_step, "question generation failed, using fallback");
                None
            }
        }
    }
}

/// Static question for a category and 0-based step.
pub fn fallback_question(category: Category, step: u32) -> &'static str {
    let bank = match category {
        Category::Cosmetics => &COSMETICS_QUESTIONS,
        Category::Electronics => &ELECTRONICS_QUESTIONS,
        Category::Food | Category::Clothing | Category::Other => &FOOD_QUESTIONS,
    };
    bank.get(step as usize).copied().unwrap_or(CLOSING_QUESTION)
}

pub fn build_prompt(request: &QuestionRequest) -> String {
    let mut prompt = format!(
        "Product: {}\nCategory: {}\nDescription: {}\nQuestion #{} of {MAX_QUESTIONS}",
        request.product_name.as_deref().unwrap_or("Unknown Product"),
        request.category,
        request
            .product_description
            .as_deref()
            .unwrap_or("No description provided"),
        request.current_step + 1,
    );

    if request.current_step > 0 {
        if let Some(previous) = request.previous_answer.as_deref().filter(|a| !a.is_empty()) {
            prompt.push_str(&format!("\nPrevious answer: {previous}"));
        }
    }

    let focus: &[&str] = match request.category {
        Category::Food => &FOOD_FOCUS,
        Category::Cosmetics => &COSMETICS_FOCUS,
        Category::Electronics => &ELECTRONICS_FOCUS,
        Category::Clothing | Category::Other => &GENERAL_FOCUS,
    };
    let heading = match request.category {
        Category::Clothing | Category::Other => {
            "Generate a specific transparency question about:".to_string()
        }
        category => format!("Generate a specific question about {category} transparency such as:"),
    };

    prompt.push_str("\n\n");
    prompt.push_str(&heading);
    for area in focus {
        prompt.push_str("\n- ");
        prompt.push_str(area);
    }

    debug!(step = request.current_step, category = %request.category, "question prompt built");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(category: Category, step: u32) -> QuestionRequest {
        QuestionRequest {
            category,
            current_step: step,
            previous_answer: None,
            product_name: None,
            product_description: None,
        }
    }

    #[test]
    fn test_fallback_bank_by_category() {
        assert_eq!(fallback_question(Category::Food, 0), FOOD_QUESTIONS[0]);
        assert_eq!(fallback_question(Category::Cosmetics, 1), COSMETICS_QUESTIONS[1]);
        assert_eq!(fallback_question(Category::Electronics, 4), ELECTRONICS_QUESTIONS[4]);
    }

    #[test]
    fn test_fallback_uses_food_bank_for_other_categories() {
        for step in 0..MAX_QUESTIONS {
            assert_eq!(
                fallback_question(Category::Clothing, step),
                fallback_question(Category::Food, step)
            );
            assert_eq!(
                fallback_question(Category::Other, step),
                fallback_question(Category::Food, step)
            );
        }
    }

    #[test]
    fn test_fallback_beyond_bank() {
        assert_eq!(fallback_question(Category::Food, 5), CLOSING_QUESTION);
        assert_eq!(fallback_question(Category::Electronics, 40), CLOSING_QUESTION);
    }

    #[test]
    fn test_prompt_defaults_and_focus() {
        let prompt = build_prompt(&request(Category::Cosmetics, 0));
        assert!(prompt.starts_with(
            "Product: Unknown Product\nCategory: cosmetics\nDescription: No description provided\nQuestion #1 of 5"
        ));
        assert!(prompt.contains("Generate a specific question about cosmetics transparency such as:"));
        assert!(prompt.contains("\n- Safety testing and dermatological approval"));
        assert!(!prompt.contains("Previous answer"));
    }

    #[test]
    fn test_prompt_includes_previous_answer_after_first_step() {
        let mut req = request(Category::Food, 2);
        req.product_name = Some("Oat Bar".to_string());
        req.previous_answer = Some("Oats come from Finland".to_string());

        let prompt = build_prompt(&req);
        assert!(prompt.starts_with("Product: Oat Bar\n"));
        assert!(prompt.contains("Question #3 of 5\nPrevious answer: Oats come from Finland"));

        req.current_step = 0;
        assert!(!build_prompt(&req).contains("Previous answer"));
    }

    #[test]
    fn test_prompt_general_focus_for_clothing() {
        let prompt = build_prompt(&request(Category::Clothing, 1));
        assert!(prompt.contains("Generate a specific transparency question about:"));
        assert!(prompt.contains("\n- Material sourcing and supply chain"));
    }

    #[tokio::test]
    async fn test_complete_after_max_questions() {
        let source = QuestionSource::fallback_only();
        assert_eq!(
            source.next_question(&request(Category::Food, MAX_QUESTIONS)).await,
            QuestionOutcome::Complete
        );
        assert_eq!(
            source.next_question(&request(Category::Food, 9)).await,
            QuestionOutcome::Complete
        );
    }

    #[tokio::test]
    async fn test_without_client_uses_fallback() {
        let source = QuestionSource::fallback_only();
        assert!(!source.uses_llm());
        assert_eq!(
            source.next_question(&request(Category::Electronics, 2)).await,
            QuestionOutcome::Fallback(ELECTRONICS_QUESTIONS[2].to_string())
        );
    }
}
