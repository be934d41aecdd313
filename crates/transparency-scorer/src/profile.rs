/// Per-category scoring and reporting tables.
///
/// Every category maps to one immutable [`CategoryProfile`]. Categories without
/// dedicated rules (clothing, other) share the generic profile: no compliance
/// credits, no disclosure checks, a three-item assessed-area list and a generic
/// insight sentence.
use transparency_common::model::Category;

/// Compliance credit: awarded once per answer that mentions any of `keywords`.
#[derive(Debug)]
pub struct CreditRule {
    /// Lowercase substrings
    pub keywords: &'static [&'static str],
    pub points: u32,
}

/// Disclosure check: when no answer mentions any of `keywords`, the
/// recommendation is emitted.
#[derive(Debug)]
pub struct DisclosureCheck {
    /// Lowercase substrings
    pub keywords: &'static [&'static str],
    pub recommendation: &'static str,
}

#[derive(Debug)]
pub struct CategoryProfile {
    pub credit_rules: &'static [CreditRule],
    pub disclosure_checks: &'static [DisclosureCheck],
    pub assessed_areas: &'static [&'static str],
    pub insight: &'static str,
}

impl CreditRule {
    /// `lowered` must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k))
    }
}

static FOOD: CategoryProfile = CategoryProfile {
    credit_rules: &[
        CreditRule {
            keywords: &["organic", "certified"],
            points: 10,
        },
        CreditRule {
            keywords: &["allergen", "gluten"],
            points: 8,
        },
        CreditRule {
            keywords: &["nutritional", "testing"],
            points: 8,
        },
    ],
    disclosure_checks: &[
        DisclosureCheck {
            keywords: &["organic", "source", "origin"],
            recommendation: "Provide information about ingredient sourcing",
        },
        DisclosureCheck {
            keywords: &["allergen", "allergy"],
            recommendation: "Include allergen information for consumer safety",
        },
    ],
    assessed_areas: &[
        "Ingredient disclosure",
        "Allergen information",
        "Nutritional data",
        "Safety testing",
    ],
    insight: "Food products require transparency about ingredients, sourcing, and safety measures",
};

static COSMETICS: CategoryProfile = CategoryProfile {
    credit_rules: &[
        CreditRule {
            keywords: &["dermatologist", "tested"],
            points: 10,
        },
        CreditRule {
            keywords: &["allergen", "hypoallergenic"],
            points: 8,
        },
        CreditRule {
            keywords: &["fda", "approved"],
            points: 8,
        },
    ],
    disclosure_checks: &[
        DisclosureCheck {
            keywords: &["tested", "dermatologist"],
            recommendation: "Mention safety testing and dermatological approval",
        },
        DisclosureCheck {
            keywords: &["ingredient", "active"],
            recommendation: "Provide detailed ingredient information",
        },
    ],
    assessed_areas: &[
        "Ingredient listing",
        "Safety testing",
        "Allergen warnings",
        "Regulatory approval",
    ],
    insight: "Cosmetic products benefit from transparency about ingredients, testing, and safety",
};

static ELECTRONICS: CategoryProfile = CategoryProfile {
    credit_rules: &[
        CreditRule {
            keywords: &["certified", "safety"],
            points: 10,
        },
        CreditRule {
            keywords: &["warranty", "support"],
            points: 8,
        },
        CreditRule {
            keywords: &["recycl", "disposal"],
            points: 8,
        },
    ],
    disclosure_checks: &[
        DisclosureCheck {
            keywords: &["warranty", "support"],
            recommendation: "Include warranty and customer support information",
        },
        DisclosureCheck {
            keywords: &["recycl", "disposal", "environment"],
            recommendation: "Add environmental impact and disposal information",
        },
    ],
    assessed_areas: &[
        "Material composition",
        "Safety certifications",
        "Warranty information",
        "Environmental impact",
    ],
    insight: "Electronic products should provide information about materials, safety, and environmental impact",
};

static GENERIC: CategoryProfile = CategoryProfile {
    credit_rules: &[],
    disclosure_checks: &[],
    assessed_areas: &[
        "General product information",
        "Safety data",
        "Quality standards",
    ],
    insight: "Product transparency builds consumer trust and confidence",
};

pub fn profile_for(category: Category) -> &'static CategoryProfile {
    match category {
        Category::Food => &FOOD,
        Category::Cosmetics => &COSMETICS,
        Category::Electronics => &ELECTRONICS,
        Category::Clothing | Category::Other => &GENERIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedicated_profiles_have_four_areas() {
        for category in [Category::Food, Category::Cosmetics, Category::Electronics] {
            let profile = profile_for(category);
            assert_eq!(profile.assessed_areas.len(), 4, "{category}");
            assert_eq!(profile.credit_rules.len(), 3, "{category}");
            assert_eq!(profile.disclosure_checks.len(), 2, "{category}");
        }
    }

    #[test]
    fn test_generic_profile_for_remaining_categories() {
        for category in [Category::Clothing, Category::Other] {
            let profile = profile_for(category);
            assert!(profile.credit_rules.is_empty());
            assert!(profile.disclosure_checks.is_empty());
            assert_eq!(profile.assessed_areas.len(), 3);
        }
    }

    #[test]
    fn test_keyword_tables_are_lowercase() {
        for category in Category::ALL {
            let profile = profile_for(category);
            let keywords = profile
                .credit_rules
                .iter()
                .flat_map(|r| r.keywords.iter())
                .chain(profile.disclosure_checks.iter().flat_map(|d| d.keywords.iter()));
            for keyword in keywords {
                assert_eq!(*keyword, keyword.to_lowercase());
            }
        }
    }

    #[test]
    fn test_credit_rule_matches_any_keyword() {
        let rule = CreditRule {
            keywords: &["recycl", "disposal"],
            points: 8,
        };
        assert!(rule.matches("we run a recycling program"));
        assert!(rule.matches("safe disposal at end of life"));
        assert!(!rule.matches("two year warranty"));
    }
}
