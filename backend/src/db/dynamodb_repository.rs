use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::models::{AnalysisRecord, User};
use shared::Severity;

#[derive(Clone)]
pub struct DynamoDbRepository {
    client: Client,
    users_table: String,
    analyses_table: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid data format: {0}")]
    InvalidData(String),
}

impl DynamoDbRepository {
    pub fn new(client: Client, users_table: String, analyses_table: String) -> Self {
        Self {
            client,
            users_table,
            analyses_table,
        }
    }

    pub async fn create_user(&self, user: &User) -> Result<(), RepositoryError> {
        log::info!(
            "🔄 Creating user in DynamoDB table '{}': {}",
            self.users_table,
            user.username
        );

        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S(user.id.to_string()));
        item.insert(
            "username".to_string(),
            AttributeValue::S(user.username.clone()),
        );
        item.insert("email".to_string(), AttributeValue::S(user.email.clone()));
        item.insert(
            "password_hash".to_string(),
            AttributeValue::S(user.password_hash.clone()),
        );
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(user.created_at.to_rfc3339()),
        );

        match self
            .client
            .put_item()
            .table_name(&self.users_table)
            .set_item(Some(item))
            .send()
            .await
        {
            Ok(_) => {
                log::info!("✅ Successfully created user: {}", user.username);
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "DynamoDB put_item failed for user {}: {:?}",
                    user.username,
                    e
                );
                Err(RepositoryError::DynamoDb(e.to_string()))
            }
        }
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError> {
        let mut key = HashMap::new();
        key.insert("id".to_string(), AttributeValue::S(user_id.to_string()));

        let result = self
            .client
            .get_item()
            .table_name(&self.users_table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        if let Some(item) = result.item {
            Ok(Some(self.parse_user_from_item(item)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let result = self
            .client
            .scan()
            .table_name(&self.users_table)
            .filter_expression("username = :username")
            .expression_attribute_values(":username", AttributeValue::S(username.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        if let Some(items) = result.items {
            if let Some(item) = items.into_iter().next() {
                return Ok(Some(self.parse_user_from_item(item)?));
            }
        }
        Ok(None)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let result = self
            .client
            .scan()
            .table_name(&self.users_table)
            .filter_expression("email = :email")
            .expression_attribute_values(":email", AttributeValue::S(email.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        Ok(result.items.map(|items| !items.is_empty()).unwrap_or(false))
    }

    pub async fn create_analysis(&self, record: &AnalysisRecord) -> Result<(), RepositoryError> {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S(record.id.to_string()));
        item.insert(
            "user_id".to_string(),
            AttributeValue::S(record.user_id.to_string()),
        );
        item.insert(
            "acne_count".to_string(),
            AttributeValue::N(record.acne_count.to_string()),
        );
        item.insert(
            "severity".to_string(),
            AttributeValue::S(record.severity.to_string()),
        );
        item.insert(
            "score".to_string(),
            AttributeValue::N(record.score.to_string()),
        );
        if let Some(combined_score) = record.combined_score {
            item.insert(
                "combined_score".to_string(),
                AttributeValue::N(combined_score.to_string()),
            );
        }
        if let Some(image_path) = &record.image_path {
            item.insert(
                "image_path".to_string(),
                AttributeValue::S(image_path.clone()),
            );
        }
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(record.created_at.to_rfc3339()),
        );
        item.insert(
            "detection_summary".to_string(),
            AttributeValue::S(serde_json::to_string(&record.detection_summary)?),
        );
        item.insert(
            "feedback".to_string(),
            AttributeValue::S(record.feedback.clone()),
        );
        item.insert(
            "recommendations".to_string(),
            AttributeValue::S(serde_json::to_string(&record.recommendations)?),
        );

        self.client
            .put_item()
            .table_name(&self.analyses_table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    pub async fn get_user_analyses(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        let result = self
            .client
            .scan()
            .table_name(&self.analyses_table)
            .filter_expression("user_id = :user_id")
            .expression_attribute_values(":user_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        let mut records = Vec::new();
        if let Some(items) = result.items {
            for item in items {
                records.push(self.parse_analysis_from_item(item)?);
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Delete one analysis, but only when it belongs to the caller. Returns
    /// whether anything was deleted.
    pub async fn delete_analysis(
        &self,
        user_id: Uuid,
        analysis_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let mut key = HashMap::new();
        key.insert("id".to_string(), AttributeValue::S(analysis_id.to_string()));

        let result = self
            .client
            .get_item()
            .table_name(&self.analyses_table)
            .set_key(Some(key.clone()))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        let Some(item) = result.item else {
            return Ok(false);
        };
        let record = self.parse_analysis_from_item(item)?;
        if record.user_id != user_id {
            return Ok(false);
        }

        self.client
            .delete_item()
            .table_name(&self.analyses_table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        log::info!("✅ Deleted analysis {} for user {}", analysis_id, user_id);
        Ok(true)
    }

    fn parse_user_from_item(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> Result<User, RepositoryError> {
        let id = item
            .get("id")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid user id".to_string()))?;

        let username = item
            .get("username")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid username".to_string()))?
            .clone();

        let email = item
            .get("email")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid email".to_string()))?
            .clone();

        let password_hash = item
            .get("password_hash")
            .and_then(|v| v.as_s().ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid password_hash".to_string()))?
            .clone();

        let created_at = item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| RepositoryError::InvalidData("Invalid created_at".to_string()))?;

        Ok(User {
            id,
            username,
            email,
            password_hash,
            created_at,
        })
    }

    fn parse_analysis_from_item(
        &self,
        item: HashMap<String, AttributeValue>,
    ) -> Result<AnalysisRecord, RepositoryError> {
        let id = item
            .get("id")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid id".to_string()))?;

        let user_id = item
            .get("user_id")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid user_id".to_string()))?;

        let acne_count = item
            .get("acne_count")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid acne_count".to_string()))?;

        let severity = item
            .get("severity")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| Severity::from_str(s).ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid severity".to_string()))?;

        let score = item
            .get("score")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse::<i32>().ok())
            .ok_or_else(|| RepositoryError::InvalidData("Invalid score".to_string()))?;

        let combined_score = item
            .get("combined_score")
            .and_then(|v| v.as_n().ok())
            .and_then(|s| s.parse::<i32>().ok());

        let image_path = item.get("image_path").and_then(|v| v.as_s().ok()).cloned();

        let created_at = item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| RepositoryError::InvalidData("Invalid created_at".to_string()))?;

        let detection_summary = item
            .get("detection_summary")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();

        let feedback = item
            .get("feedback")
            .and_then(|v| v.as_s().ok())
            .cloned()
            .unwrap_or_default();

        let recommendations = item
            .get("recommendations")
            .and_then(|v| v.as_s().ok())
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default();

        Ok(AnalysisRecord {
            id,
            user_id,
            acne_count,
            severity,
            score,
            combined_score,
            image_path,
            created_at,
            detection_summary,
            feedback,
            recommendations,
        })
    }
}
