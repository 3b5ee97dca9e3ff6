use shared::{Detection, DetectionSummary};

pub const MIN_SCORE: i32 = 30;
pub const MAX_SCORE: i32 = 95;

const BASE_SCORE: f64 = 95.0;
const MAX_PENALTY: f64 = 70.0;

/// Classes the primary detector reports that count as active acne when
/// reconciling against the secondary detector.
pub const PRIMARY_ACNE_CLASSES: [&str; 6] = [
    "Acne",
    "Pimples",
    "papular",
    "cystic",
    "purulent",
    "conglobata",
];

fn primary_weight(class_name: &str) -> f64 {
    match class_name {
        "cystic" => 8.0,
        "purulent" => 7.0,
        "Acne" => 6.0,
        "conglobata" => 8.0,
        "Pimples" => 5.0,
        "papular" => 5.0,
        "whitehead" => 4.0,
        "blackhead" => 4.0,
        "acne_scars" => 4.0,
        "keloid" => 5.0,
        "folliculitis" => 3.0,
        "milium" => 2.0,
        "crystalline" => 2.0,
        "flat_wart" => 3.0,
        "syringoma" => 2.0,
        "sebo-crystan-conglo" => 5.0,
        _ => 4.0,
    }
}

fn secondary_weight(class_name: &str) -> f64 {
    match class_name {
        "acne" | "Acne" => 6.0,
        "melasma" | "Melasma" => 7.0,
        "rosacea" | "Rosacea" => 8.0,
        _ => 5.0,
    }
}

// Marginal penalties flatten as counts grow; counts of exactly 5 and 10
// belong to the lower tier.
fn primary_penalty(count: u32, weight: f64) -> f64 {
    let c = count as f64;
    if count <= 2 {
        c * weight
    } else if count <= 5 {
        2.0 * weight + (c - 2.0) * weight * 1.2
    } else if count <= 10 {
        2.0 * weight + 3.0 * weight * 1.2 + (c - 5.0) * weight
    } else {
        2.0 * weight + 3.0 * weight * 1.2 + 5.0 * weight + (c - 10.0) * weight * 0.8
    }
}

fn secondary_penalty(count: u32, weight: f64) -> f64 {
    let c = count as f64;
    if count <= 2 {
        c * weight
    } else if count <= 5 {
        2.0 * weight + (c - 2.0) * weight * 1.2
    } else {
        2.0 * weight + 3.0 * weight * 1.2 + (c - 5.0) * weight
    }
}

// Truncation toward zero, not rounding: a raw score of 69.4 stays 69.
fn clamp_score(raw: f64) -> i32 {
    (raw as i32).clamp(MIN_SCORE, MAX_SCORE)
}

pub fn summarize(detections: &[Detection]) -> DetectionSummary {
    let mut summary = DetectionSummary::new();
    for detection in detections {
        *summary.entry(detection.class_name.clone()).or_insert(0) += 1;
    }
    summary
}

pub fn average_confidence(detections: &[Detection]) -> f64 {
    if detections.is_empty() {
        return 0.0;
    }
    detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64
}

/// Score from the primary detector's summary: base 95, per-class tiered
/// penalties, total penalty capped at 70, result clamped to [30, 95].
pub fn score_primary(summary: &DetectionSummary) -> i32 {
    let mut total_penalty = 0.0;
    for (class_name, &count) in summary {
        total_penalty += primary_penalty(count, primary_weight(class_name));
    }
    clamp_score(BASE_SCORE - total_penalty.min(MAX_PENALTY))
}

/// Same mechanism as [`score_primary`] with the secondary weight table and a
/// three-tier curve.
pub fn score_secondary(summary: &DetectionSummary) -> i32 {
    let mut total_penalty = 0.0;
    for (class_name, &count) in summary {
        total_penalty += secondary_penalty(count, secondary_weight(class_name));
    }
    clamp_score(BASE_SCORE - total_penalty.min(MAX_PENALTY))
}

#[derive(Debug, Clone)]
pub struct MergedResult {
    pub primary_score: i32,
    pub secondary_score: i32,
    pub combined_score: i32,
    pub unique_secondary_conditions: Vec<String>,
}

fn is_acne_class(class_name: &str) -> bool {
    class_name.to_lowercase() == "acne" || class_name == "Acne"
}

/// Reconcile the two detectors into one combined score. Acne flagged by both
/// models is penalized once: secondary acne entries are skipped whenever the
/// primary summary already contains an acne-family class.
pub fn combine(
    primary_score: i32,
    primary_summary: &DetectionSummary,
    secondary_score: i32,
    secondary_summary: &DetectionSummary,
) -> MergedResult {
    let has_primary_acne = PRIMARY_ACNE_CLASSES
        .iter()
        .any(|class| primary_summary.contains_key(*class));

    let mut additional_penalty = 0.0;
    let mut unique_secondary_conditions = Vec::new();

    for (class_name, &count) in secondary_summary {
        if is_acne_class(class_name) && has_primary_acne {
            continue;
        }
        additional_penalty += secondary_penalty(count, secondary_weight(class_name));
        unique_secondary_conditions.push(format!("{}x {}", count, class_name));
    }

    let combined_score =
        (primary_score - additional_penalty.round() as i32).clamp(MIN_SCORE, MAX_SCORE);

    MergedResult {
        primary_score,
        secondary_score,
        combined_score,
        unique_secondary_conditions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_name: &str, confidence: f64) -> Detection {
        Detection {
            x: 100.0,
            y: 100.0,
            width: 20.0,
            height: 20.0,
            confidence,
            class_name: class_name.to_string(),
        }
    }

    fn summary_of(entries: &[(&str, u32)]) -> DetectionSummary {
        entries
            .iter()
            .map(|(class, count)| (class.to_string(), *count))
            .collect()
    }

    #[test]
    fn summarize_counts_per_class() {
        let detections = vec![
            detection("blackhead", 0.6),
            detection("cystic", 0.9),
            detection("blackhead", 0.4),
        ];
        let summary = summarize(&detections);
        assert_eq!(summary.get("blackhead"), Some(&2));
        assert_eq!(summary.get("cystic"), Some(&1));
    }

    #[test]
    fn average_confidence_of_empty_list_is_zero() {
        assert_eq!(average_confidence(&[]), 0.0);
    }

    #[test]
    fn average_confidence_is_arithmetic_mean() {
        let detections = vec![detection("Acne", 0.5), detection("Acne", 0.7)];
        assert!((average_confidence(&detections) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_scores_base() {
        assert_eq!(score_primary(&DetectionSummary::new()), 95);
        assert_eq!(score_secondary(&DetectionSummary::new()), 95);
    }

    #[test]
    fn single_cystic_scores_87() {
        // weight 8, count 1 -> penalty 8
        assert_eq!(score_primary(&summary_of(&[("cystic", 1)])), 87);
    }

    #[test]
    fn three_cystic_truncates_to_69() {
        // 2*8 + 1*8*1.2 = 25.6 -> int(95 - 25.6) = 69, not 70
        assert_eq!(score_primary(&summary_of(&[("cystic", 3)])), 69);
    }

    #[test]
    fn three_blackheads_score_82() {
        // weight 4: 2*4 + 1*4*1.2 = 12.8 -> int(95 - 12.8) = 82
        assert_eq!(score_primary(&summary_of(&[("blackhead", 3)])), 82);
    }

    #[test]
    fn unknown_class_uses_default_weight() {
        // default weight 4, count 1 -> 95 - 4
        assert_eq!(score_primary(&summary_of(&[("mystery_condition", 1)])), 91);
    }

    #[test]
    fn counts_of_five_and_ten_fall_in_lower_tier() {
        // c = 5 uses the 1.2 tier for all three marginal counts: 2w + 3w*1.2
        let weight = 4.0;
        let at_five = 2.0 * weight + 3.0 * weight * 1.2;
        assert_eq!(
            score_primary(&summary_of(&[("blackhead", 5)])),
            (95.0 - at_five) as i32
        );
        // c = 10 adds five marginal counts at weight*1.0 on top
        let at_ten = at_five + 5.0 * weight;
        assert_eq!(
            score_primary(&summary_of(&[("blackhead", 10)])),
            (95.0 - at_ten) as i32
        );
        // c = 11 switches the marginal rate to 0.8
        let at_eleven = at_ten + 0.8 * weight;
        assert_eq!(
            score_primary(&summary_of(&[("blackhead", 11)])),
            (95.0 - at_eleven) as i32
        );
    }

    #[test]
    fn penalty_cap_floors_score_at_30() {
        let summary = summary_of(&[("cystic", 50), ("purulent", 50), ("conglobata", 50)]);
        assert_eq!(score_primary(&summary), 30);
    }

    #[test]
    fn score_is_monotonic_in_counts() {
        let mut previous = i32::MAX;
        for count in 0..30 {
            let score = score_primary(&summary_of(&[("Pimples", count)]));
            assert!(score <= previous, "score rose at count {}", count);
            previous = score;
        }
    }

    #[test]
    fn scores_stay_in_bounds_for_arbitrary_summaries() {
        let cases = [
            summary_of(&[]),
            summary_of(&[("cystic", 1)]),
            summary_of(&[("unknown", 1000)]),
            summary_of(&[("melasma", 7), ("rosacea", 2), ("acne", 40)]),
        ];
        for summary in &cases {
            let primary = score_primary(summary);
            let secondary = score_secondary(summary);
            assert!((MIN_SCORE..=MAX_SCORE).contains(&primary));
            assert!((MIN_SCORE..=MAX_SCORE).contains(&secondary));
        }
    }

    #[test]
    fn secondary_curve_has_no_ten_tier() {
        // default weight 5, count 11: 2*5 + 3*5*1.2 + 6*5 = 58 -> 37. A fourth
        // tier would have eased the marginal rate to 0.8 past ten.
        assert_eq!(
            score_secondary(&summary_of(&[("hyperpigmentation", 11)])),
            37
        );
    }

    #[test]
    fn combine_with_empty_secondary_is_identity() {
        let primary_summary = summary_of(&[("Acne", 3)]);
        let merged = combine(80, &primary_summary, 95, &DetectionSummary::new());
        assert_eq!(merged.combined_score, 80);
        assert!(merged.unique_secondary_conditions.is_empty());
    }

    #[test]
    fn combine_skips_acne_seen_by_both_models() {
        let primary_summary = summary_of(&[("Acne", 3)]);
        let secondary_summary = summary_of(&[("acne", 4)]);
        let primary_score = score_primary(&primary_summary);
        let merged = combine(
            primary_score,
            &primary_summary,
            score_secondary(&secondary_summary),
            &secondary_summary,
        );
        assert_eq!(merged.combined_score, primary_score);
        assert!(merged.unique_secondary_conditions.is_empty());
    }

    #[test]
    fn combine_penalizes_acne_when_primary_found_none() {
        let primary_summary = summary_of(&[("blackhead", 2)]);
        let secondary_summary = summary_of(&[("acne", 2)]);
        let merged = combine(87, &primary_summary, 83, &secondary_summary);
        // acne weight 6, count 2 -> 12 extra
        assert_eq!(merged.combined_score, 75);
        assert_eq!(merged.unique_secondary_conditions, vec!["2x acne"]);
    }

    #[test]
    fn combine_subtracts_unique_condition_penalties() {
        let primary_summary = summary_of(&[("Pimples", 1)]);
        let secondary_summary = summary_of(&[("acne", 2), ("melasma", 1)]);
        let merged = combine(90, &primary_summary, 80, &secondary_summary);
        // acne skipped (primary has Pimples); melasma weight 7, count 1 -> 7
        assert_eq!(merged.combined_score, 83);
        assert_eq!(merged.unique_secondary_conditions, vec!["1x melasma"]);
    }

    #[test]
    fn combine_clamps_to_floor() {
        let secondary_summary = summary_of(&[("rosacea", 30), ("melasma", 30)]);
        let merged = combine(40, &DetectionSummary::new(), 30, &secondary_summary);
        assert_eq!(merged.combined_score, 30);
    }
}
