use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{DetectionSummary, HistoryEntry, Severity};
use uuid::Uuid;

use crate::analysis::report::AnalysisOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// One persisted analysis. Severity here follows the combined score when a
/// secondary detector ran, unlike the response's primary-derived severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub acne_count: usize,
    pub severity: Severity,
    pub score: i32,
    pub combined_score: Option<i32>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub detection_summary: DetectionSummary,
    pub feedback: String,
    pub recommendations: Vec<String>,
}

impl AnalysisRecord {
    pub fn from_outcome(user_id: Uuid, outcome: &AnalysisOutcome) -> Self {
        let response = &outcome.response;
        Self {
            id: Uuid::new_v4(),
            user_id,
            acne_count: response.acne_count,
            severity: outcome.record_severity,
            score: response.skin_score,
            combined_score: response.combined_score,
            image_path: Some(response.annotated_image_url.clone()),
            created_at: response.timestamp,
            detection_summary: response.detection_summary.clone(),
            feedback: response.feedback.clone(),
            recommendations: response.recommendations.clone(),
        }
    }
}

impl From<AnalysisRecord> for HistoryEntry {
    fn from(record: AnalysisRecord) -> Self {
        HistoryEntry {
            id: record.id,
            acne_count: record.acne_count,
            severity: record.severity,
            score: record.score,
            combined_score: record.combined_score,
            date: record.created_at,
            image_path: record.image_path,
            detection_summary: record.detection_summary,
            feedback: record.feedback,
            recommendations: record.recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::report::build_report;
    use shared::Detection;

    #[test]
    fn record_uses_combined_severity_not_response_severity() {
        let detections = vec![Detection {
            x: 50.0,
            y: 50.0,
            width: 10.0,
            height: 10.0,
            confidence: 0.8,
            class_name: "blackhead".to_string(),
        }];
        let secondary = vec![
            Detection {
                x: 20.0,
                y: 20.0,
                width: 8.0,
                height: 8.0,
                confidence: 0.9,
                class_name: "rosacea".to_string(),
            };
            4
        ];
        let outcome = build_report(detections, Some(secondary), "/annotated/x.jpg".to_string());
        let user_id = Uuid::new_v4();
        let record = AnalysisRecord::from_outcome(user_id, &outcome);

        assert_eq!(record.user_id, user_id);
        assert_eq!(record.score, outcome.response.skin_score);
        assert_eq!(record.combined_score, outcome.response.combined_score);
        assert_eq!(record.severity, outcome.record_severity);
        assert_ne!(record.severity, outcome.response.severity);
        assert_eq!(
            record.image_path.as_deref(),
            Some("/annotated/x.jpg")
        );
    }
}
