use shared::{DetectionSummary, Severity};
use std::collections::HashSet;

const MAX_RECOMMENDATIONS: usize = 5;
const MIN_RECOMMENDATIONS: usize = 3;

const CLEAR_FEEDBACK: &str = "Great news! No skin concerns detected. Your skin looks healthy!";

const CLEAR_RECOMMENDATIONS: [&str; 4] = [
    "Maintain your current skincare routine",
    "Continue using sunscreen daily (SPF 30+)",
    "Stay hydrated and get adequate sleep",
    "Cleanse gently twice daily",
];

const BREAKOUT_RECOMMENDATIONS: [&str; 4] = [
    "Use a gentle cleanser with salicylic acid (2%) or benzoyl peroxide (2.5-5%)",
    "Apply spot treatment to active breakouts",
    "Avoid touching or picking at your face",
    "Change pillowcases regularly",
];

const DERMATOLOGIST_RECOMMENDATION: &str =
    "Consider consulting a dermatologist for prescription treatments (this may require professional care)";

const BLACKHEAD_RECOMMENDATIONS: [&str; 3] = [
    "Use a BHA (salicylic acid) exfoliant 2-3 times per week",
    "Try oil cleansing to help dissolve sebum",
    "Consider professional extractions for stubborn blackheads",
];

const WHITEHEAD_RECOMMENDATIONS: [&str; 3] = [
    "Use products with salicylic acid to unclog pores",
    "Avoid heavy, pore-clogging moisturizers",
    "Don't squeeze whiteheads - let them heal naturally",
];

const SCAR_RECOMMENDATIONS: [&str; 4] = [
    "Apply vitamin C serum to help fade scarring",
    "Use products with niacinamide for skin repair",
    "Always wear SPF 30+ to prevent darkening of scars",
    "Consider professional treatments (microneedling, laser) for severe scarring",
];

const MILIUM_RECOMMENDATION: &str =
    "Milia may require professional extraction - avoid trying to remove them yourself";

const GENERAL_RECOMMENDATIONS: [&str; 3] = [
    "Maintain a consistent skincare routine",
    "Avoid harsh scrubbing or over-exfoliation",
    "Keep hair and hands away from your face",
];

const BREAKOUT_CLASSES: [&str; 5] = ["cystic", "purulent", "Acne", "conglobata", "Pimples"];
const SEVERE_BREAKOUT_CLASSES: [&str; 3] = ["cystic", "purulent", "conglobata"];

/// Canonical score-to-severity bucketing, used for response and persisted
/// severity alike.
pub fn severity_from_score(score: i32) -> Severity {
    if score >= 85 {
        Severity::Clear
    } else if score >= 70 {
        Severity::Mild
    } else if score >= 50 {
        Severity::Moderate
    } else {
        Severity::Severe
    }
}

// "acne_scars" -> "Acne Scars", "sebo-crystan-conglo" -> "Sebo-Crystan-Conglo"
fn readable_name(class_name: &str) -> String {
    let mut out = String::with_capacity(class_name.len());
    let mut at_word_start = true;
    for ch in class_name.chars() {
        if ch == '_' {
            out.push(' ');
            at_word_start = true;
        } else if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
                at_word_start = false;
            } else {
                out.extend(ch.to_lowercase());
            }
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

fn contains_any(summary: &DetectionSummary, classes: &[&str]) -> bool {
    classes.iter().any(|class| summary.contains_key(*class))
}

fn push_unique(
    recommendations: &mut Vec<String>,
    seen: &mut HashSet<&'static str>,
    recommendation: &'static str,
) {
    if recommendations.len() < MAX_RECOMMENDATIONS && seen.insert(recommendation) {
        recommendations.push(recommendation.to_string());
    }
}

/// Narrative feedback plus an ordered, de-duplicated recommendation list
/// (at most five entries) for one detector's summary.
pub fn generate_feedback(summary: &DetectionSummary) -> (String, Vec<String>) {
    if summary.is_empty() {
        return (
            CLEAR_FEEDBACK.to_string(),
            CLEAR_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
        );
    }

    let concerns: Vec<String> = summary
        .iter()
        .map(|(class_name, count)| format!("{} {}", count, readable_name(class_name)))
        .collect();
    let feedback = format!("Analysis detected: {}.", concerns.join(", "));

    let mut recommendations = Vec::new();
    let mut seen = HashSet::new();

    if contains_any(summary, &BREAKOUT_CLASSES) {
        for rec in BREAKOUT_RECOMMENDATIONS {
            push_unique(&mut recommendations, &mut seen, rec);
        }
    }

    if contains_any(summary, &SEVERE_BREAKOUT_CLASSES) {
        let severe_count = summary.get("cystic").copied().unwrap_or(0)
            + summary.get("purulent").copied().unwrap_or(0);
        if severe_count > 3 {
            push_unique(&mut recommendations, &mut seen, DERMATOLOGIST_RECOMMENDATION);
        }
    }

    if summary.contains_key("blackhead") {
        for rec in BLACKHEAD_RECOMMENDATIONS {
            push_unique(&mut recommendations, &mut seen, rec);
        }
    }

    if summary.contains_key("whitehead") {
        for rec in WHITEHEAD_RECOMMENDATIONS {
            push_unique(&mut recommendations, &mut seen, rec);
        }
    }

    if summary.contains_key("acne_scars") {
        for rec in SCAR_RECOMMENDATIONS {
            push_unique(&mut recommendations, &mut seen, rec);
        }
    }

    if summary.contains_key("milium") {
        push_unique(&mut recommendations, &mut seen, MILIUM_RECOMMENDATION);
    }

    if recommendations.len() < MIN_RECOMMENDATIONS {
        for rec in GENERAL_RECOMMENDATIONS {
            push_unique(&mut recommendations, &mut seen, rec);
        }
    }

    (feedback, recommendations)
}

/// Fold the secondary detector's findings into the feedback text. Applied
/// only when a secondary detector ran; a summary with no conditions leaves
/// the text untouched.
pub fn merge_feedback(
    feedback: String,
    primary_summary: &DetectionSummary,
    secondary_summary: &DetectionSummary,
    unique_secondary_conditions: &[String],
) -> String {
    let total_concerns: u32 = secondary_summary.values().sum();
    if total_concerns == 0 {
        return feedback;
    }

    if primary_summary.is_empty() {
        let descriptor = if total_concerns <= 5 {
            "mild"
        } else if total_concerns <= 15 {
            "moderate"
        } else {
            "severe"
        };
        return format!(
            "Skin analysis detected {} area(s) of concern. This is considered {}.",
            total_concerns, descriptor
        );
    }

    if unique_secondary_conditions.is_empty() {
        return feedback;
    }

    let base = feedback.strip_suffix('!').unwrap_or(&feedback);
    format!(
        "{} Additional analysis detected: {}.",
        base,
        unique_secondary_conditions.join(", ")
    )
}
