//! Raw GET/POST command handlers

use crate::cli::{GetArgs, PostArgs};
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use aihub_core::http::QueryParams;
use aihub_core::HttpClient;
use serde_json::Value;
use tracing::instrument;

/// Handle the get command
#[instrument(skip(client, output), fields(endpoint = %args.endpoint))]
pub async fn handle_get(args: GetArgs, client: &HttpClient, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("get", &args.endpoint);
    let params = args.params.as_deref().map(parse_params).transpose()?;

    let response = client.get(&args.endpoint, params).await?;
    output.data(&response)
}

/// Handle the post command
#[instrument(skip(client, output), fields(endpoint = %args.endpoint))]
pub async fn handle_post(args: PostArgs, client: &HttpClient, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("post", &args.endpoint);
    let body = args.data.as_deref().map(parse_body).transpose()?;

    let response = client.post(&args.endpoint, body).await?;
    output.data(&response)
}

/// Parse `--params` (a JSON object) into query parameters
fn parse_params(raw: &str) -> Result<QueryParams> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| Error::invalid_args(format!("--params must be a JSON object: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::invalid_args("--params must be a JSON object"))?;

    Ok(object
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect())
}

/// Parse `--data`; any JSON value is sent verbatim, `{}` included
fn parse_body(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).map_err(|e| Error::invalid_args(format!("--data must be valid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_params() {
        let params = parse_params(r#"{"limit": 5, "order": "desc", "verbose": true}"#).unwrap();
        assert_eq!(params.get("limit").map(String::as_str), Some("5"));
        assert_eq!(params.get("order").map(String::as_str), Some("desc"));
        assert_eq!(params.get("verbose").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_parse_params_rejects_non_objects() {
        assert!(matches!(parse_params("[1, 2]"), Err(Error::InvalidArgs(_))));
        assert!(matches!(parse_params("limit=5"), Err(Error::InvalidArgs(_))));
    }

    #[test]
    fn test_parse_body_keeps_empty_object() {
        assert_eq!(parse_body("{}").unwrap(), json!({}));
        assert_eq!(parse_body(r#"{"a": [1]}"#).unwrap(), json!({"a": [1]}));
        assert!(parse_body("{").is_err());
    }
}
