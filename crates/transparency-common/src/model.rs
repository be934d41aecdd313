use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

static RECORD_COUNTER: AtomicU64 = AtomicU64::new(0);

static RECORD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{24}$").expect("record id regex is valid"));

/// Product category. Parsing is case-insensitive; serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Cosmetics,
    Electronics,
    Clothing,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Food,
        Category::Cosmetics,
        Category::Electronics,
        Category::Clothing,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Cosmetics => "cosmetics",
            Category::Electronics => "electronics",
            Category::Clothing => "clothing",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}' (expected one of: food, cosmetics, electronics, clothing, other)")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// A product under transparency review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    /// 24-character lowercase hex identifier
    pub id: String,
    pub name: String,
    pub category: Category,
    /// Empty when not provided
    #[serde(default)]
    pub description: String,
    /// Empty when not provided
    #[serde(default)]
    pub manufacturer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        description: Option<String>,
        manufacturer: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(),
            name: name.into(),
            category,
            description: description.unwrap_or_default(),
            manufacturer: manufacturer.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn description(&self) -> Option<&str> {
        Some(self.description.as_str()).filter(|d| !d.is_empty())
    }

    pub fn manufacturer(&self) -> Option<&str> {
        Some(self.manufacturer.as_str()).filter(|m| !m.is_empty())
    }
}

/// One answered transparency question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Answer {
    pub id: String,
    pub product_id: String,
    pub question: String,
    pub answer: String,
    /// 1-based position in the questionnaire
    pub step: u32,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn new(
        product_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        step: u32,
    ) -> Self {
        Self {
            id: new_record_id(),
            product_id: product_id.into(),
            question: question.into(),
            answer: answer.into(),
            step,
            created_at: Utc::now(),
        }
    }
}

/// Order answers by step, then by creation time.
pub fn sort_answers(answers: &mut [Answer]) {
    answers.sort_by(|a, b| a.step.cmp(&b.step).then(a.created_at.cmp(&b.created_at)));
}

/// Generate a new 24-character lowercase hex record id.
pub fn new_record_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0));
    let counter = RECORD_COUNTER.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();

    let mut h = Sha256::new();
    h.update(now.as_nanos().to_le_bytes());
    h.update(pid.to_le_bytes());
    h.update(counter.to_le_bytes());
    let digest = h.finalize();
    hex_lower(&digest[..12])
}

pub fn is_valid_record_id(id: &str) -> bool {
    RECORD_ID_RE.is_match(id)
}

fn hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}
