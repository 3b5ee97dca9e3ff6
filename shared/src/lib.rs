use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Per-class detection counts for a single image.
pub type DetectionSummary = BTreeMap<String, u32>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
    pub class_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Clear,
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub acne_count: usize,
    pub skin_score: i32,
    pub average_confidence: f64,
    pub detections: Vec<Detection>,
    pub detection_summary: DetectionSummary,
    pub feedback: String,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_detections: Option<Vec<Detection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_summary: Option<DetectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<i32>,
    pub timestamp: DateTime<Utc>,
    pub annotated_image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub acne_count: usize,
    pub severity: Severity,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<i32>,
    pub date: DateTime<Utc>,
    pub image_path: Option<String>,
    pub detection_summary: DetectionSummary,
    pub feedback: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub username: String,
    pub total_analyses: usize,
    pub history: Vec<HistoryEntry>,
}
