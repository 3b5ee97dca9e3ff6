use reqwest::Client as HttpClient;
use reqwest::multipart;
use serde::Deserialize;
use shared::Detection;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://detect.roboflow.com";
const DEFAULT_CONFIDENCE: u32 = 10;
const DEFAULT_OVERLAP: u32 = 30;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Detection service returned {status}: {body}")]
    Service { status: u16, body: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Secondary detector is not configured")]
    NotConfigured,
}

/// One named detector configuration. Built by the caller (from env in
/// `main`) and handed to [`DetectionClient::new`] — there is no global
/// model identifier.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub base_url: String,
    pub api_key: String,
    pub model_id: String,
    pub model_version: String,
    pub confidence: u32,
    pub overlap: u32,
}

impl DetectorConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model_id: impl Into<String>,
        model_version: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model_id: model_id.into(),
            model_version: model_version.into(),
            confidence: DEFAULT_CONFIDENCE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    confidence: f64,
    #[serde(rename = "class", default = "unknown_class")]
    class_name: String,
}

fn unknown_class() -> String {
    "unknown".to_string()
}

impl From<RawPrediction> for Detection {
    fn from(raw: RawPrediction) -> Self {
        Detection {
            x: raw.x,
            y: raw.y,
            width: raw.width,
            height: raw.height,
            confidence: raw.confidence,
            class_name: raw.class_name,
        }
    }
}

#[derive(Clone)]
pub struct DetectionClient {
    http_client: HttpClient,
    primary: DetectorConfig,
    secondary: Option<DetectorConfig>,
}

impl DetectionClient {
    pub fn new(primary: DetectorConfig, secondary: Option<DetectorConfig>) -> Self {
        Self {
            http_client: HttpClient::new(),
            primary,
            secondary,
        }
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub async fn detect_primary(&self, image_path: &Path) -> Result<Vec<Detection>, DetectionError> {
        self.detect(&self.primary, image_path).await
    }

    pub async fn detect_secondary(
        &self,
        image_path: &Path,
    ) -> Result<Vec<Detection>, DetectionError> {
        let config = self.secondary.as_ref().ok_or(DetectionError::NotConfigured)?;
        self.detect(config, image_path).await
    }

    async fn detect(
        &self,
        config: &DetectorConfig,
        image_path: &Path,
    ) -> Result<Vec<Detection>, DetectionError> {
        let url = format!(
            "{}/{}/{}",
            config.base_url, config.model_id, config.model_version
        );
        log::info!(
            "Calling detection service: {}/{}",
            config.model_id,
            config.model_version
        );

        let image_data = std::fs::read(image_path)?;
        let file_name = image_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(image_data).file_name(file_name));

        let response = self
            .http_client
            .post(&url)
            .query(&[
                ("api_key", config.api_key.clone()),
                ("confidence", config.confidence.to_string()),
                ("overlap", config.overlap.to_string()),
            ])
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DetectionError::Service { status, body });
        }

        let parsed: DetectResponse = response.json().await?;
        log::info!(
            "Detection service {} returned {} predictions",
            config.model_id,
            parsed.predictions.len()
        );

        Ok(parsed.predictions.into_iter().map(Detection::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_carries_service_defaults() {
        let config = DetectorConfig::new(DEFAULT_BASE_URL, "key", "acne-model", "2");
        assert_eq!(config.base_url, "https://detect.roboflow.com");
        assert_eq!(config.confidence, 10);
        assert_eq!(config.overlap, 30);
    }

    #[test]
    fn predictions_without_class_fall_back_to_unknown() {
        let body = r#"{"predictions":[{"x":1.0,"y":2.0,"width":3.0,"height":4.0,"confidence":0.8}]}"#;
        let parsed: DetectResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.predictions[0].class_name, "unknown");
    }

    #[test]
    fn missing_predictions_field_parses_as_empty() {
        let parsed: DetectResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.predictions.is_empty());
    }

    #[test]
    fn client_without_secondary_reports_none() {
        let client = DetectionClient::new(
            DetectorConfig::new(DEFAULT_BASE_URL, "key", "acne-model", "1"),
            None,
        );
        assert!(!client.has_secondary());
    }
}
