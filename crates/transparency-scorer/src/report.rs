use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use transparency_common::model::{Answer, Category, Product};

use crate::profile::profile_for;
use crate::score::{Breakdown, Score};

const REPORT_TITLE: &str = "Product Transparency Report";
const DATE_FORMAT: &str = "%Y-%m-%d";
const COMPLIANCE_KEYWORDS: [&str; 3] = ["certified", "approved", "tested"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Rating {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Poor,
}

impl Rating {
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::VeryGood => "Very Good",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::NeedsImprovement => "Needs Improvement",
            Rating::Poor => "Poor",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn rating_for(score: u32) -> Rating {
    match score {
        90.. => Rating::Excellent,
        80..=89 => Rating::VeryGood,
        70..=79 => Rating::Good,
        60..=69 => Rating::Fair,
        50..=59 => Rating::NeedsImprovement,
        _ => Rating::Poor,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub title: String,
    pub generated_date: String,
    pub product_info: ProductInfo,
    pub transparency_score: ScoreSummary,
    pub questions_answered: QuestionsAnswered,
    pub analysis: Analysis,
    pub recommendations: Vec<String>,
    pub compliance: ComplianceSection,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductInfo {
    pub name: String,
    pub category: Category,
    pub description: String,
    pub manufacturer: String,
    pub created_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreSummary {
    pub overall: u32,
    pub breakdown: Breakdown,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionsAnswered {
    pub total: usize,
    pub details: Vec<AnsweredQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnsweredQuestion {
    pub step: u32,
    pub question: String,
    pub answer: String,
    pub answered_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Analysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComplianceSection {
    pub category: Category,
    pub assessed_areas: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    pub overall_assessment: String,
    pub key_findings: Vec<String>,
    pub next_steps: Vec<String>,
}

/// Render the transparency report for a product.
///
/// `answers` are expected in questionnaire order. `generated_at` is the report
/// clock; it only feeds the date strings, so identical inputs give identical
/// reports.
pub fn generate_report(
    product: &Product,
    answers: &[Answer],
    score: &Score,
    generated_at: DateTime<Utc>,
) -> Report {
    let overall = score.transparency_score;
    let generated_date = generated_at.format(DATE_FORMAT).to_string();

    Report {
        title: REPORT_TITLE.to_string(),
        generated_date: generated_date.clone(),
        product_info: ProductInfo {
            name: product.name.clone(),
            category: product.category,
            description: product
                .description()
                .unwrap_or("No description provided")
                .to_string(),
            manufacturer: product.manufacturer().unwrap_or("Not specified").to_string(),
            created_date: product.created_at.format(DATE_FORMAT).to_string(),
        },
        transparency_score: ScoreSummary {
            overall,
            breakdown: score.breakdown.clone(),
            rating: rating_for(overall),
        },
        questions_answered: QuestionsAnswered {
            total: answers.len(),
            details: answers
                .iter()
                .map(|a| AnsweredQuestion {
                    step: a.step,
                    question: a.question.clone(),
                    answer: a.answer.clone(),
                    answered_date: a.created_at.format(DATE_FORMAT).to_string(),
                })
                .collect(),
        },
        analysis: analyze(product.category, answers.len(), overall),
        recommendations: score.recommendations.clone(),
        compliance: compliance_section(product.category, answers),
        summary: summarize(product, overall, answers.len(), &generated_date),
    }
}

fn analyze(category: Category, answer_count: usize, score: u32) -> Analysis {
    let mut analysis = Analysis::default();

    if score >= 80 {
        analysis
            .strengths
            .push("High transparency score demonstrates commitment to openness".to_string());
        analysis
            .strengths
            .push("Comprehensive information provided to consumers".to_string());
    } else if score >= 60 {
        analysis
            .strengths
            .push("Good foundation for transparency established".to_string());
        analysis
            .weaknesses
            .push("Opportunities exist to improve transparency further".to_string());
    } else {
        analysis
            .weaknesses
            .push("Transparency score indicates significant room for improvement".to_string());
        analysis
            .weaknesses
            .push("Limited information available to consumers".to_string());
    }

    if answer_count >= 5 {
        analysis
            .strengths
            .push("Answered comprehensive set of transparency questions".to_string());
    } else if answer_count >= 3 {
        analysis
            .insights
            .push("Moderate engagement with transparency questions".to_string());
    } else {
        analysis
            .weaknesses
            .push("Limited number of transparency questions answered".to_string());
    }

    analysis
        .insights
        .push(profile_for(category).insight.to_string());

    analysis
}

fn compliance_section(category: Category, answers: &[Answer]) -> ComplianceSection {
    let mut recommendations = Vec::new();

    let has_detailed_answer = answers.iter().any(|a| a.answer.chars().count() > 100);
    let mentions_compliance = answers.iter().any(|a| {
        let lowered = a.answer.to_lowercase();
        COMPLIANCE_KEYWORDS.iter().any(|k| lowered.contains(k))
    });

    if !has_detailed_answer {
        recommendations.push("Provide more detailed responses to transparency questions".to_string());
    }
    if !mentions_compliance {
        recommendations
            .push("Include information about certifications and regulatory compliance".to_string());
    }

    ComplianceSection {
        category,
        assessed_areas: profile_for(category)
            .assessed_areas
            .iter()
            .map(|s| s.to_string())
            .collect(),
        recommendations,
    }
}

fn summarize(product: &Product, score: u32, answer_count: usize, generated_date: &str) -> Summary {
    let rating = rating_for(score);

    let next_steps = if answer_count < 5 {
        [
            "Complete additional transparency questions",
            "Provide more detailed product information",
        ]
    } else {
        [
            "Maintain current transparency standards",
            "Regular updates to product information",
        ]
    };

    Summary {
        overall_assessment: format!(
            "{} has achieved a transparency score of {score}% ({rating}), based on {answer_count} answered questions.",
            product.name
        ),
        key_findings: vec![
            format!("Product category: {}", product.category),
            format!("Transparency rating: {rating} ({score}%)"),
            format!("Questions answered: {answer_count}"),
            format!("Report generated: {generated_date}"),
        ],
        next_steps: next_steps.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::score::compute_score;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn product(category: Category) -> Product {
        let mut p = Product::new("Oat Bar", category, None, None);
        p.created_at = at(2024, 3, 1);
        p
    }

    fn answers(n: usize, text: &str) -> Vec<Answer> {
        (0..n)
            .map(|i| {
                let mut a = Answer::new("p", format!("Question {}", i + 1), text, i as u32 + 1);
                a.created_at = at(2024, 3, 2);
                a
            })
            .collect()
    }

    fn score_of(value: u32) -> Score {
        Score {
            transparency_score: value,
            breakdown: Breakdown {
                completeness: 50,
                detail: 50,
                compliance: 50,
            },
            recommendations: vec!["Provide information about ingredient sourcing".to_string()],
        }
    }

    #[test]
    fn test_rating_boundaries() {
        assert_eq!(rating_for(100), Rating::Excellent);
        assert_eq!(rating_for(90), Rating::Excellent);
        assert_eq!(rating_for(89), Rating::VeryGood);
        assert_eq!(rating_for(80), Rating::VeryGood);
        assert_eq!(rating_for(79), Rating::Good);
        assert_eq!(rating_for(70), Rating::Good);
        assert_eq!(rating_for(69), Rating::Fair);
        assert_eq!(rating_for(60), Rating::Fair);
        assert_eq!(rating_for(59), Rating::NeedsImprovement);
        assert_eq!(rating_for(50), Rating::NeedsImprovement);
        assert_eq!(rating_for(49), Rating::Poor);
        assert_eq!(rating_for(0), Rating::Poor);
    }

    #[test]
    fn test_rating_serializes_as_label() {
        let json = serde_json::to_string(&Rating::NeedsImprovement).unwrap();
        assert_eq!(json, "\"Needs Improvement\"");
        assert_eq!(Rating::VeryGood.to_string(), "Very Good");
    }

    #[test]
    fn test_report_sections() {
        let p = product(Category::Food);
        let a = answers(2, "We use oats");
        let report = generate_report(&p, &a, &score_of(72), at(2024, 3, 5));

        assert_eq!(report.title, "Product Transparency Report");
        assert_eq!(report.generated_date, "2024-03-05");
        assert_eq!(report.product_info.description, "No description provided");
        assert_eq!(report.product_info.manufacturer, "Not specified");
        assert_eq!(report.product_info.created_date, "2024-03-01");
        assert_eq!(report.transparency_score.overall, 72);
        assert_eq!(report.transparency_score.rating, Rating::Good);
        assert_eq!(report.questions_answered.total, 2);
        assert_eq!(report.questions_answered.details[1].step, 2);
        assert_eq!(report.questions_answered.details[0].answered_date, "2024-03-02");
        assert_eq!(report.recommendations, score_of(72).recommendations);
    }

    #[test]
    fn test_analysis_by_score_band_and_answer_count() {
        let p = product(Category::Food);

        let high = generate_report(&p, &answers(5, "x"), &score_of(85), at(2024, 3, 5));
        assert_eq!(high.analysis.strengths.len(), 3);
        assert!(high.analysis.weaknesses.is_empty());

        let mid = generate_report(&p, &answers(3, "x"), &score_of(65), at(2024, 3, 5));
        assert_eq!(mid.analysis.strengths.len(), 1);
        assert_eq!(mid.analysis.weaknesses.len(), 1);
        assert_eq!(
            mid.analysis.insights,
            vec![
                "Moderate engagement with transparency questions".to_string(),
                "Food products require transparency about ingredients, sourcing, and safety measures"
                    .to_string(),
            ]
        );

        let low = generate_report(&p, &answers(1, "x"), &score_of(40), at(2024, 3, 5));
        assert!(low.analysis.strengths.is_empty());
        assert_eq!(low.analysis.weaknesses.len(), 3);
    }

    #[test]
    fn test_generic_insight_and_areas_for_other_categories() {
        let report = generate_report(
            &product(Category::Clothing),
            &[],
            &score_of(30),
            at(2024, 3, 5),
        );
        assert_eq!(
            report.analysis.insights,
            vec!["Product transparency builds consumer trust and confidence".to_string()]
        );
        assert_eq!(
            report.compliance.assessed_areas,
            vec!["General product information", "Safety data", "Quality standards"]
        );
        assert_eq!(report.compliance.category, Category::Clothing);
    }

    #[test]
    fn test_compliance_recommendations() {
        let p = product(Category::Cosmetics);

        let sparse = generate_report(&p, &answers(2, "short"), &score_of(40), at(2024, 3, 5));
        assert_eq!(sparse.compliance.recommendations.len(), 2);

        let long_tested = format!("{:.<120}", "Clinically TESTED formula");
        let rich = generate_report(&p, &answers(1, &long_tested), &score_of(40), at(2024, 3, 5));
        assert!(rich.compliance.recommendations.is_empty());
        assert_eq!(rich.compliance.assessed_areas.len(), 4);
    }

    #[test]
    fn test_summary_next_steps_switch_at_five_answers() {
        let p = product(Category::Electronics);

        let four = generate_report(&p, &answers(4, "x"), &score_of(70), at(2024, 3, 5));
        let five = generate_report(&p, &answers(5, "x"), &score_of(70), at(2024, 3, 5));

        assert_eq!(
            four.summary.next_steps,
            vec![
                "Complete additional transparency questions",
                "Provide more detailed product information"
            ]
        );
        assert_eq!(
            five.summary.next_steps,
            vec![
                "Maintain current transparency standards",
                "Regular updates to product information"
            ]
        );
    }

    #[test]
    fn test_summary_text() {
        let report = generate_report(
            &product(Category::Food),
            &answers(3, "x"),
            &score_of(91),
            at(2024, 3, 5),
        );
        assert_eq!(
            report.summary.overall_assessment,
            "Oat Bar has achieved a transparency score of 91% (Excellent), based on 3 answered questions."
        );
        assert_eq!(
            report.summary.key_findings,
            vec![
                "Product category: food",
                "Transparency rating: Excellent (91%)",
                "Questions answered: 3",
                "Report generated: 2024-03-05",
            ]
        );
    }

    #[test]
    fn test_report_is_deterministic_for_fixed_clock() {
        let p = product(Category::Food);
        let a = answers(4, "Certified organic oats sourced from local farms");
        let score = compute_score(&p, &a);
        let when = at(2024, 3, 5);
        assert_eq!(
            generate_report(&p, &a, &score, when),
            generate_report(&p, &a, &score, when)
        );
    }
}
