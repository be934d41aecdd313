/// Record storage for products, answers, scores and reports.
///
/// Two backends share one interface: Redis for durable deployments and an
/// in-process map for local runs and tests. Products are listed in creation
/// order; answers are returned ordered by step, then creation time. Score and
/// report records are one per product and replaced on every write.
///
/// Redis key schema:
/// - `pt:v1:product:{id}`: JSON Product
/// - `pt:v1:products`: list of product ids in creation order
/// - `pt:v1:answers:{product_id}`: list of JSON Answers in insertion order
/// - `pt:v1:score:{product_id}`: JSON ScoreRecord
/// - `pt:v1:report:{product_id}`: JSON ReportRecord
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use transparency_common::error::CommonError;
use transparency_common::model::{sort_answers, Answer, Product};
use transparency_common::redis::RedisClient;
use transparency_scorer::{Breakdown, Report, Score};

const KEY_PREFIX: &str = "pt:v1:";

/// Latest computed score for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreRecord {
    pub product_id: String,
    pub transparency_score: u32,
    pub breakdown: Breakdown,
    pub recommendations: Vec<String>,
    /// Number of answers the score was computed from
    pub total_questions: usize,
    pub calculated_at: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn new(
        product_id: impl Into<String>,
        score: Score,
        total_questions: usize,
        calculated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            transparency_score: score.transparency_score,
            breakdown: score.breakdown,
            recommendations: score.recommendations,
            total_questions,
            calculated_at,
        }
    }

    pub fn to_score(&self) -> Score {
        Score {
            transparency_score: self.transparency_score,
            breakdown: self.breakdown.clone(),
            recommendations: self.recommendations.clone(),
        }
    }
}

/// Latest generated report for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportRecord {
    pub product_id: String,
    pub transparency_score: u32,
    pub report: Report,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Store {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Redis(RedisClient),
    Memory(Arc<RwLock<MemoryState>>),
}

#[derive(Default)]
struct MemoryState {
    products: HashMap<String, Product>,
    product_order: Vec<String>,
    answers: HashMap<String, Vec<Answer>>,
    scores: HashMap<String, ScoreRecord>,
    reports: HashMap<String, ReportRecord>,
}

impl Store {
    pub fn redis(client: RedisClient) -> Self {
        Self {
            backend: Backend::Redis(client),
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(RwLock::new(MemoryState::default()))),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Redis(_) => "redis",
            Backend::Memory(_) => "memory",
        }
    }

    // --- Products ---

    pub async fn insert_product(&self, product: &Product) -> Result<(), CommonError> {
        match &self.backend {
            Backend::Redis(redis) => {
                let json = serde_json::to_string(product)?;
                redis
                    .set_and_push(&product_key(&product.id), &json, &products_key(), &product.id)
                    .await?;
            }
            Backend::Memory(state) => {
                let mut state = state.write().await;
                state.product_order.push(product.id.clone());
                state.products.insert(product.id.clone(), product.clone());
            }
        }
        debug!(product_id = %product.id, "product stored");
        Ok(())
    }

    pub async fn get_product(&self, id: &str) -> Result<Option<Product>, CommonError> {
        match &self.backend {
            Backend::Redis(redis) => get_json(redis, &product_key(id)).await,
            Backend::Memory(state) => Ok(state.read().await.products.get(id).cloned()),
        }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, CommonError> {
        match &self.backend {
            Backend::Redis(redis) => {
                let ids = redis.list(&products_key()).await?;
                let lookups = ids.iter().map(|id| self.get_product(id));
                let products = futures::future::try_join_all(lookups).await?;
                let found = products.len();
                let products: Vec<Product> = products.into_iter().flatten().collect();
                if products.len() != found {
                    warn!(
                        missing = found - products.len(),
                        "product index references missing records"
                    );
                }
                Ok(products)
            }
            Backend::Memory(state) => {
                let state = state.read().await;
                Ok(state
                    .product_order
                    .iter()
                    .filter_map(|id| state.products.get(id).cloned())
                    .collect())
            }
        }
    }

    // --- Answers ---

    pub async fn append_answer(&self, answer: &Answer) -> Result<(), CommonError> {
        match &self.backend {
            Backend::Redis(redis) => {
                let json = serde_json::to_string(answer)?;
                redis.push(&answers_key(&answer.product_id), &json).await?;
            }
            Backend::Memory(state) => {
                state
                    .write()
                    .await
                    .answers
                    .entry(answer.product_id.clone())
                    .or_default()
                    .push(answer.clone());
            }
        }
        Ok(())
    }

    /// Answers for a product, ordered by step then creation time.
    pub async fn answers(&self, product_id: &str) -> Result<Vec<Answer>, CommonError> {
        let mut answers = match &self.backend {
            Backend::Redis(redis) => decode_all(&redis.list(&answers_key(product_id)).await?)?,
            Backend::Memory(state) => state
                .read()
                .await
                .answers
                .get(product_id)
                .cloned()
                .unwrap_or_default(),
        };
        sort_answers(&mut answers);
        Ok(answers)
    }

    /// Remove every answer for a product. Returns how many were removed.
    pub async fn delete_answers(&self, product_id: &str) -> Result<usize, CommonError> {
        match &self.backend {
            Backend::Redis(redis) => {
                Ok(redis.delete_list(&answers_key(product_id)).await?)
            }
            Backend::Memory(state) => Ok(state
                .write()
                .await
                .answers
                .remove(product_id)
                .map(|a| a.len())
                .unwrap_or(0)),
        }
    }

    // --- Scores ---

    pub async fn put_score(&self, record: &ScoreRecord) -> Result<(), CommonError> {
        match &self.backend {
            Backend::Redis(redis) => {
                let json = serde_json::to_string(record)?;
                redis.set(&score_key(&record.product_id), &json).await?;
            }
            Backend::Memory(state) => {
                state
                    .write()
                    .await
                    .scores
                    .insert(record.product_id.clone(), record.clone());
            }
        }
        Ok(())
    }

    pub async fn get_score(&self, product_id: &str) -> Result<Option<ScoreRecord>, CommonError> {
        match &self.backend {
            Backend::Redis(redis) => get_json(redis, &score_key(product_id)).await,
            Backend::Memory(state) => Ok(state.read().await.scores.get(product_id).cloned()),
        }
    }

    // --- Reports ---

    pub async fn put_report(&self, record: &ReportRecord) -> Result<(), CommonError> {
        match &self.backend {
            Backend::Redis(redis) => {
                let json = serde_json::to_string(record)?;
                redis.set(&report_key(&record.product_id), &json).await?;
            }
            Backend::Memory(state) => {
                state
                    .write()
                    .await
                    .reports
                    .insert(record.product_id.clone(), record.clone());
            }
        }
        Ok(())
    }

    pub async fn get_report(&self, product_id: &str) -> Result<Option<ReportRecord>, CommonError> {
        match &self.backend {
            Backend::Redis(redis) => get_json(redis, &report_key(product_id)).await,
            Backend::Memory(state) => Ok(state.read().await.reports.get(product_id).cloned()),
        }
    }
}

async fn get_json<T: DeserializeOwned>(
    redis: &RedisClient,
    key: &str,
) -> Result<Option<T>, CommonError> {
    match redis.get(key).await? {
        Some(json) => decode(&json)
            .inspect_err(|e| warn!(error = %e, key, "stored record is not valid JSON"))
            .map(Some),
        None => Ok(None),
    }
}

fn decode<T: DeserializeOwned>(json: &str) -> Result<T, CommonError> {
    Ok(serde_json::from_str(json)?)
}

/// Decode every entry of a stored list. One bad entry fails the whole read.
fn decode_all<T: DeserializeOwned>(entries: &[String]) -> Result<Vec<T>, CommonError> {
    entries.iter().map(|json| decode(json)).collect()
}

fn product_key(id: &str) -> String {
    format!("{KEY_PREFIX}product:{id}")
}

fn products_key() -> String {
    format!("{KEY_PREFIX}products")
}

fn answers_key(product_id: &str) -> String {
    format!("{KEY_PREFIX}answers:{product_id}")
}

fn score_key(product_id: &str) -> String {
    format!("{KEY_PREFIX}score:{product_id}")
}

fn report_key(product_id: &str) -> String {
    format!("{KEY_PREFIX}report:{product_id}")
}
