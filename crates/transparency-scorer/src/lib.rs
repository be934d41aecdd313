//! Rule-based transparency scoring and report generation.
//!
//! Both entry points are pure functions of their inputs: [`compute_score`]
//! derives a [`Score`] from a product and its answers, and [`generate_report`]
//! renders a [`Report`] from the same inputs plus that score.

pub mod profile;
pub mod report;
pub mod score;

pub use profile::{profile_for, CategoryProfile, CreditRule, DisclosureCheck};
pub use report::{generate_report, rating_for, Rating, Report};
pub use score::{compute_score, Breakdown, Score, MAX_RECOMMENDATIONS};
