use chrono::Utc;
use shared::{AnalysisResponse, Detection, Severity};

use super::{feedback, scoring};

/// A fully assembled analysis. The response's `severity` follows the primary
/// score; `record_severity` follows the combined score when a secondary
/// detector ran and is what gets persisted. The two can disagree — this
/// mirrors the deployed behavior and is flagged in DESIGN.md.
pub struct AnalysisOutcome {
    pub response: AnalysisResponse,
    pub record_severity: Severity,
}

/// Run the aggregation pipeline over filtered detections and assemble the
/// response DTO. `secondary_detections` is `Some` only when the secondary
/// detector ran successfully (even if it found nothing).
pub fn build_report(
    detections: Vec<Detection>,
    secondary_detections: Option<Vec<Detection>>,
    annotated_image_url: String,
) -> AnalysisOutcome {
    let detection_summary = scoring::summarize(&detections);
    let average_confidence = scoring::average_confidence(&detections);
    let skin_score = scoring::score_primary(&detection_summary);
    let severity = feedback::severity_from_score(skin_score);
    let (mut feedback_text, recommendations) = feedback::generate_feedback(&detection_summary);

    let mut secondary_summary = None;
    let mut secondary_score = None;
    let mut combined_score = None;

    if let Some(secondary) = &secondary_detections {
        let summary = scoring::summarize(secondary);
        let score = scoring::score_secondary(&summary);
        let merged = scoring::combine(skin_score, &detection_summary, score, &summary);
        feedback_text = feedback::merge_feedback(
            feedback_text,
            &detection_summary,
            &summary,
            &merged.unique_secondary_conditions,
        );
        secondary_score = Some(merged.secondary_score);
        combined_score = Some(merged.combined_score);
        secondary_summary = Some(summary);
    }

    let record_severity = feedback::severity_from_score(combined_score.unwrap_or(skin_score));

    AnalysisOutcome {
        response: AnalysisResponse {
            acne_count: detections.len(),
            skin_score,
            average_confidence,
            detections,
            detection_summary,
            feedback: feedback_text,
            severity,
            recommendations,
            secondary_detections,
            secondary_summary,
            secondary_score,
            combined_score,
            timestamp: Utc::now(),
            annotated_image_url,
        },
        record_severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(class_name: &str, confidence: f64) -> Detection {
        Detection {
            x: 50.0,
            y: 50.0,
            width: 10.0,
            height: 10.0,
            confidence,
            class_name: class_name.to_string(),
        }
    }

    #[test]
    fn single_model_report_end_to_end() {
        let detections = vec![
            detection("blackhead", 0.6),
            detection("blackhead", 0.5),
            detection("blackhead", 0.7),
        ];
        let outcome = build_report(detections, None, "/annotated/a.jpg".to_string());
        let response = &outcome.response;

        assert_eq!(response.acne_count, 3);
        // weight 4: 2*4 + 1*4*1.2 = 12.8 -> int(95 - 12.8) = 82 -> mild
        assert_eq!(response.skin_score, 82);
        assert_eq!(response.severity, Severity::Mild);
        assert_eq!(outcome.record_severity, Severity::Mild);
        assert!((response.average_confidence - 0.6).abs() < 1e-9);
        assert_eq!(response.detection_summary.get("blackhead"), Some(&3));
        assert_eq!(response.feedback, "Analysis detected: 3 Blackhead.");
        assert!(response.secondary_summary.is_none());
        assert!(response.combined_score.is_none());
        assert_eq!(response.annotated_image_url, "/annotated/a.jpg");
    }

    #[test]
    fn empty_detections_report_is_clear() {
        let outcome = build_report(Vec::new(), None, "/annotated/b.jpg".to_string());
        assert_eq!(outcome.response.acne_count, 0);
        assert_eq!(outcome.response.skin_score, 95);
        assert_eq!(outcome.response.severity, Severity::Clear);
        assert_eq!(outcome.response.average_confidence, 0.0);
        assert_eq!(outcome.response.recommendations.len(), 4);
    }

    #[test]
    fn secondary_findings_lower_combined_but_not_primary() {
        let detections = vec![detection("blackhead", 0.8)];
        let secondary = vec![
            detection("melasma", 0.7),
            detection("melasma", 0.6),
            detection("melasma", 0.9),
        ];
        let outcome = build_report(detections, Some(secondary), "/annotated/c.jpg".to_string());
        let response = &outcome.response;

        assert_eq!(response.skin_score, 91);
        // melasma weight 7, count 3: 2*7 + 1*7*1.2 = 22.4 -> round 22
        assert_eq!(response.combined_score, Some(91 - 22));
        assert_eq!(response.secondary_score, Some(72));
        assert_eq!(
            response.secondary_summary.as_ref().unwrap().get("melasma"),
            Some(&3)
        );
        assert!(response.feedback.contains("Additional analysis detected: 3x melasma"));
    }

    #[test]
    fn response_and_record_severity_can_diverge() {
        // primary is clear (score 91 -> clear), combined drops to moderate
        let detections = vec![detection("blackhead", 0.8)];
        let secondary = vec![detection("rosacea", 0.9); 4];
        let outcome = build_report(detections, Some(secondary), "/annotated/d.jpg".to_string());

        assert_eq!(outcome.response.severity, Severity::Clear);
        // rosacea weight 8, count 4: 2*8 + 2*8*1.2 = 35.2 -> round 35 -> 91-35=56
        assert_eq!(outcome.response.combined_score, Some(56));
        assert_eq!(outcome.record_severity, Severity::Moderate);
    }

    #[test]
    fn secondary_that_found_nothing_changes_nothing() {
        let detections = vec![detection("Pimples", 0.9)];
        let outcome = build_report(
            detections,
            Some(Vec::new()),
            "/annotated/e.jpg".to_string(),
        );
        assert_eq!(outcome.response.skin_score, 90);
        assert_eq!(outcome.response.combined_score, Some(90));
        assert_eq!(outcome.response.secondary_score, Some(95));
        assert_eq!(outcome.response.feedback, "Analysis detected: 1 Pimples.");
    }
}
