use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use transparency_common::model::{Answer, Category, Product};

use crate::profile::profile_for;

pub const MAX_RECOMMENDATIONS: usize = 5;

const COMPLETENESS_WEIGHT: f64 = 0.4;
const DETAIL_WEIGHT: f64 = 0.35;
const COMPLIANCE_WEIGHT: f64 = 0.25;
const COMPLIANCE_BASE: u32 = 50;
const SUBSCORE_MAX: u32 = 100;

const ANSWER_MORE: &str = "Answer more questions to improve transparency score";
const MORE_DETAIL: &str = "Provide more detailed answers for better transparency";
const COMPLETE_MORE: &str = "Complete more questions to demonstrate transparency";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Breakdown {
    pub completeness: u32,
    pub detail: u32,
    pub compliance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Score {
    /// Weighted composite, 0-100
    pub transparency_score: u32,
    pub breakdown: Breakdown,
    /// At most [`MAX_RECOMMENDATIONS`], in generation order
    pub recommendations: Vec<String>,
}

/// Score a product from its answers.
///
/// Weights: completeness 40%, detail 35%, compliance 25%. Each sub-score is
/// clamped to 100 before weighting. Recommendations keep generation order
/// (completeness, then per-answer detail, then disclosure checks) and are not
/// de-duplicated.
pub fn compute_score(product: &Product, answers: &[Answer]) -> Score {
    let mut recommendations = Vec::new();

    let completeness = completeness_score(product, answers.len(), &mut recommendations);
    let detail = detail_score(answers, &mut recommendations);
    let compliance = compliance_score(product.category, answers);
    disclosure_recommendations(product.category, answers, &mut recommendations);

    let weighted = f64::from(completeness) * COMPLETENESS_WEIGHT
        + f64::from(detail) * DETAIL_WEIGHT
        + f64::from(compliance) * COMPLIANCE_WEIGHT;
    let transparency_score = (weighted.round() as u32).min(SUBSCORE_MAX);

    recommendations.truncate(MAX_RECOMMENDATIONS);

    debug!(
        product_id = %product.id,
        answers = answers.len(),
        completeness,
        detail,
        compliance,
        transparency_score,
        "transparency score computed"
    );

    Score {
        transparency_score,
        breakdown: Breakdown {
            completeness,
            detail,
            compliance,
        },
        recommendations,
    }
}

fn completeness_score(product: &Product, answer_count: usize, recs: &mut Vec<String>) -> u32 {
    let mut score = 0;

    // category is always present on a typed product
    if !product.name.is_empty() {
        score += 20;
    }
    if product.description().is_some_and(|d| d.chars().count() > 20) {
        score += 15;
    }
    if product.manufacturer().is_some() {
        score += 15;
    }

    score += match answer_count {
        n if n >= 5 => 30,
        n if n >= 3 => 20,
        n if n >= 1 => 10,
        _ => {
            recs.push(ANSWER_MORE.to_string());
            0
        }
    };

    score.min(SUBSCORE_MAX)
}

fn detail_score(answers: &[Answer], recs: &mut Vec<String>) -> u32 {
    let total: u32 = answers
        .iter()
        .map(|a| match a.answer.chars().count() {
            n if n > 100 => 20,
            n if n > 50 => 15,
            n if n > 20 => 10,
            _ => {
                recs.push(MORE_DETAIL.to_string());
                5
            }
        })
        .fold(0, u32::saturating_add);

    total.min(SUBSCORE_MAX)
}

fn compliance_score(category: Category, answers: &[Answer]) -> u32 {
    let rules = profile_for(category).credit_rules;

    let credits = answers
        .iter()
        .map(|a| {
            let lowered = a.answer.to_lowercase();
            rules
                .iter()
                .filter(|rule| rule.matches(&lowered))
                .map(|rule| rule.points)
                .sum::<u32>()
        })
        .fold(0, u32::saturating_add);

    COMPLIANCE_BASE.saturating_add(credits).min(SUBSCORE_MAX)
}

fn disclosure_recommendations(category: Category, answers: &[Answer], recs: &mut Vec<String>) {
    if answers.len() < 3 {
        recs.push(COMPLETE_MORE.to_string());
    }

    let lowered: Vec<String> = answers.iter().map(|a| a.answer.to_lowercase()).collect();
    let mentioned = |keywords: &[&str]| {
        lowered
            .iter()
            .any(|text| keywords.iter().any(|k| text.contains(k)))
    };

    for check in profile_for(category).disclosure_checks {
        if !mentioned(check.keywords) {
            recs.push(check.recommendation.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(category: Category) -> Product {
        Product::new("Oat Bar", category, None, None)
    }

    fn answers(texts: &[&str]) -> Vec<Answer> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Answer::new("p", format!("Question {}", i + 1), *t, i as u32 + 1))
            .collect()
    }

    fn padded(text: &str, len: usize) -> String {
        format!("{text:.<len$}")
    }

    #[test]
    fn test_food_example_from_rich_answers() {
        let text = padded("Our oats are organic and we label every allergen", 120);
        let texts: Vec<&str> = std::iter::repeat(text.as_str()).take(5).collect();
        let score = compute_score(&product(Category::Food), &answers(&texts));

        assert_eq!(score.breakdown.completeness, 50); // name + five answers
        assert_eq!(score.breakdown.detail, 100);
        assert_eq!(score.breakdown.compliance, 100); // 50 + 5 * 18, clamped
        // round(50*0.4 + 100*0.35 + 100*0.25) = 80
        assert_eq!(score.transparency_score, 80);
        assert!(score.recommendations.is_empty());
    }

    #[test]
    fn test_optional_fields_raise_completeness() {
        let mut p = product(Category::Food);
        p.description = "Rolled oats baked with honey and seeds".to_string();
        p.manufacturer = "Acme Foods".to_string();
        let score = compute_score(&p, &answers(&["short"; 5]));
        assert_eq!(score.breakdown.completeness, 80);
    }

    #[test]
    fn test_short_description_earns_nothing() {
        let mut p = product(Category::Food);
        p.description = "exactly twenty chars".to_string();
        assert_eq!(p.description.chars().count(), 20);
        let score = compute_score(&p, &[]);
        assert_eq!(score.breakdown.completeness, 20);
    }

    #[test]
    fn test_electronics_without_answers() {
        let score = compute_score(&product(Category::Electronics), &[]);

        assert_eq!(score.breakdown.completeness, 20);
        assert_eq!(score.breakdown.detail, 0);
        assert_eq!(score.breakdown.compliance, 50);
        // round(20*0.4 + 0 + 50*0.25) = round(20.5) = 21
        assert_eq!(score.transparency_score, 21);
        assert_eq!(
            score.recommendations,
            vec![
                ANSWER_MORE.to_string(),
                COMPLETE_MORE.to_string(),
                "Include warranty and customer support information".to_string(),
                "Add environmental impact and disposal information".to_string(),
            ]
        );
    }

    #[test]
    fn test_answer_count_bonus_tiers() {
        let p = product(Category::Other);
        let tier = |n: usize| {
            let texts = vec!["x"; n];
            compute_score(&p, &answers(&texts)).breakdown.completeness
        };
        assert_eq!(tier(0), 20);
        assert_eq!(tier(1), 30);
        assert_eq!(tier(2), 30);
        assert_eq!(tier(3), 40);
        assert_eq!(tier(4), 40);
        assert_eq!(tier(5), 50);
        assert_eq!(tier(9), 50);
    }

    #[test]
    fn test_detail_length_buckets() {
        let p = product(Category::Other);
        let detail = |len: usize| {
            let text = padded("", len);
            compute_score(&p, &answers(&[text.as_str()])).breakdown.detail
        };
        assert_eq!(detail(20), 5);
        assert_eq!(detail(21), 10);
        assert_eq!(detail(50), 10);
        assert_eq!(detail(51), 15);
        assert_eq!(detail(100), 15);
        assert_eq!(detail(101), 20);
    }

    #[test]
    fn test_detail_counts_characters_not_bytes() {
        // 30 two-byte characters: 60 bytes but only 30 chars
        let text = "é".repeat(30);
        let score = compute_score(&product(Category::Other), &answers(&[text.as_str()]));
        assert_eq!(score.breakdown.detail, 10);
    }

    #[test]
    fn test_each_short_answer_adds_a_recommendation() {
        let score = compute_score(&product(Category::Other), &answers(&["no", "n/a", "yes"]));
        assert_eq!(score.recommendations, vec![MORE_DETAIL.to_string(); 3]);
    }

    #[test]
    fn test_recommendations_capped_in_generation_order() {
        let score = compute_score(&product(Category::Food), &answers(&["no", "no"]));
        // 2 detail + 1 complete-more + 2 food checks = 5
        assert_eq!(score.recommendations.len(), 5);
        assert_eq!(score.recommendations[0], MORE_DETAIL);
        assert_eq!(score.recommendations[2], COMPLETE_MORE);
        assert_eq!(score.recommendations[4], "Include allergen information for consumer safety");

        let many = compute_score(&product(Category::Food), &answers(&["no"; 12]));
        assert_eq!(many.recommendations.len(), MAX_RECOMMENDATIONS);
        assert!(many.recommendations.iter().all(|r| r == MORE_DETAIL));
    }

    #[test]
    fn test_compliance_keywords_are_case_insensitive_and_stack() {
        let score = compute_score(
            &product(Category::Cosmetics),
            &answers(&["DERMATOLOGIST tested, Hypoallergenic and FDA approved"]),
        );
        assert_eq!(score.breakdown.compliance, 50 + 10 + 8 + 8);
    }

    #[test]
    fn test_compliance_rule_counts_once_per_answer() {
        // both keywords of the same rule in one answer earn the rule once
        let score = compute_score(
            &product(Category::Electronics),
            &answers(&["certified for safety"]),
        );
        assert_eq!(score.breakdown.compliance, 60);
    }

    #[test]
    fn test_other_categories_get_base_compliance_only() {
        for category in [Category::Clothing, Category::Other] {
            let score = compute_score(
                &product(category),
                &answers(&["certified organic, tested and approved, full warranty"]),
            );
            assert_eq!(score.breakdown.compliance, 50);
        }
    }

    #[test]
    fn test_disclosure_checks_use_all_answers() {
        let score = compute_score(
            &product(Category::Cosmetics),
            &answers(&["Tested on volunteers", "x", "Active Ingredient list on the box"]),
        );
        assert!(!score
            .recommendations
            .iter()
            .any(|r| r.contains("dermatological") || r.contains("ingredient information")));
    }

    #[test]
    fn test_scores_stay_in_range() {
        let long = padded("certified organic allergen nutritional testing", 400);
        for count in [0usize, 1, 3, 5, 20] {
            for category in Category::ALL {
                let texts = vec![long.as_str(); count];
                let mut p = product(category);
                p.description = padded("desc", 80);
                p.manufacturer = "Acme".to_string();
                let score = compute_score(&p, &answers(&texts));
                assert!(score.transparency_score <= 100);
                assert!(score.breakdown.completeness <= 100);
                assert!(score.breakdown.detail <= 100);
                assert!(score.breakdown.compliance <= 100);
                assert!(score.recommendations.len() <= MAX_RECOMMENDATIONS);
            }
        }
    }

    #[test]
    fn test_compute_score_is_deterministic() {
        let p = product(Category::Food);
        let a = answers(&["We source organic oats from local farms", "no"]);
        assert_eq!(compute_score(&p, &a), compute_score(&p, &a));
    }

    #[test]
    fn test_rich_compliant_answer_never_lowers_subscores() {
        let p = product(Category::Electronics);
        let rich = padded("UL certified with a two year warranty and a recycling program", 150);
        let mut current = answers(&["ok", "It has a battery"]);
        let mut before = compute_score(&p, &current);
        for _ in 0..8 {
            current.push(Answer::new("p", "More?", rich.clone(), 3));
            let after = compute_score(&p, &current);
            assert!(after.breakdown.detail >= before.breakdown.detail);
            assert!(after.breakdown.compliance >= before.breakdown.compliance);
            before = after;
        }
    }
}
