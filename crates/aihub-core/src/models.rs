//! Model listing and credential check

use std::sync::Arc;

use serde_json::Value;

use crate::http::{ErrorKind, HttpClient};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ModelsService {
    client: Arc<HttpClient>,
}

impl ModelsService {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Ids of the models available to the API key
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self.client.get("models", None).await?;
        let ids = response
            .get("data")
            .and_then(Value::as_array)
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| model.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    /// `Ok(false)` when the API rejects the key; other failures propagate
    pub async fn check_connection(&self) -> Result<bool> {
        match self.client.get("models", None).await {
            Ok(_) => Ok(true),
            Err(Error::Api(error)) if error.kind == ErrorKind::Authentication => Ok(false),
            Err(error) => Err(error),
        }
    }
}
