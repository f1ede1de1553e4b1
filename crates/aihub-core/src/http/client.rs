//! Request executor
//!
//! [`HttpClient`] ties the pipeline together: every logical call waits for a
//! rate-limiter token, runs through the transport, and on failure is
//! classified and handed to the retry policy. Exactly one metrics record is
//! written per logical call, when it finally succeeds or finally fails.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::ClientConfig;
use crate::http::auth::BearerAuth;
use crate::http::error::{classify_response, classify_transport_error};
use crate::http::metrics::{MetricsCollector, StatusRecord, UsageSnapshot};
use crate::http::observer::{RequestEvent, RequestObserver, TracingObserver};
use crate::http::rate_limit::RateLimiter;
use crate::http::retry::{AttemptOutcome, RetryDecision, RetryPolicy};
use crate::http::transport::{HttpMethod, QueryParams, ReqwestTransport, Transport, TransportRequest};
use crate::{Error, Result};

/// Message carried by the payload returned for a 2xx body that is not JSON
pub const NON_JSON_SUCCESS_MESSAGE: &str = "Request succeeded but the response is not JSON";

/// Authenticated, rate-limited, retrying API client
///
/// One instance owns its token bucket and its usage counters; neither is
/// shared with other instances.
pub struct HttpClient {
    config: ClientConfig,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    metrics: MetricsCollector,
    observer: Arc<dyn RequestObserver>,
}

impl HttpClient {
    /// Create a client backed by `reqwest`
    ///
    /// Fails if the configuration is invalid; no request is ever attempted
    /// with an empty API key.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let auth = BearerAuth::new(config.api_key.clone())?;
        let transport = ReqwestTransport::new(auth.headers()?, config.timeout)?;
        Ok(Self::assemble(config, Arc::new(transport)))
    }

    /// Create a client on top of a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    fn assemble(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            policy: config.retry_policy(),
            limiter: RateLimiter::new(config.max_requests_per_second),
            metrics: MetricsCollector::new(),
            observer: Arc::new(TracingObserver),
            transport,
            config,
        }
    }

    /// Replace the default `tracing` observer
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Copy of the usage counters
    pub fn metrics(&self) -> UsageSnapshot {
        self.metrics.snapshot()
    }

    /// GET `{base_url}/{endpoint}` with optional query parameters
    pub async fn get(&self, endpoint: &str, params: Option<QueryParams>) -> Result<Value> {
        self.get_with_cancel(endpoint, params, &CancellationToken::new()).await
    }

    /// POST a JSON body to `{base_url}/{endpoint}`
    ///
    /// `None` sends no payload at all; `Some(json!({}))` sends `{}`.
    pub async fn post(&self, endpoint: &str, body: Option<Value>) -> Result<Value> {
        self.post_with_cancel(endpoint, body, &CancellationToken::new()).await
    }

    #[instrument(skip(self, params, cancel), fields(method = "GET"))]
    pub async fn get_with_cancel(
        &self,
        endpoint: &str,
        params: Option<QueryParams>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        self.execute(HttpMethod::Get, endpoint, params, None, cancel).await
    }

    #[instrument(skip(self, body, cancel), fields(method = "POST"))]
    pub async fn post_with_cancel(
        &self,
        endpoint: &str,
        body: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        self.execute(HttpMethod::Post, endpoint, None, body, cancel).await
    }

    async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        query: Option<QueryParams>,
        body: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let url = self.config.endpoint_url(endpoint);
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;
        let mut last_elapsed = Duration::ZERO;

        loop {
            let wait = match self.limiter.acquire_with_cancel(cancel).await {
                Ok(wait) => wait,
                Err(_) => return Err(self.cancelled(attempt, last_elapsed)),
            };
            if !wait.is_zero() {
                self.emit(RequestEvent::RateLimited { wait });
            }

            let request = TransportRequest {
                method,
                url: url.clone(),
                query: query.clone(),
                body: body.clone(),
                timeout: self.config.timeout,
            };

            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.cancelled(attempt + 1, started.elapsed()));
                }
                result = self.transport.send(request) => result,
            };
            let elapsed = started.elapsed();
            last_elapsed = elapsed;

            let error = match result {
                Ok(response) if response.is_success() => {
                    let value = parse_success_body(&response.body);
                    self.metrics.record_success(elapsed, response.status);
                    self.emit(RequestEvent::Succeeded {
                        attempts: attempt + 1,
                        status: response.status,
                        elapsed,
                    });
                    return Ok(value);
                }
                Ok(response) => classify_response(&response),
                Err(transport_error) => classify_transport_error(&transport_error, &url),
            };

            self.emit(RequestEvent::AttemptFailed {
                outcome: AttemptOutcome {
                    attempt,
                    status: error.status_code,
                    error: Some(error.clone()),
                    elapsed,
                },
                max_attempts,
            });

            match self.policy.decide(attempt, error.kind) {
                RetryDecision::Retry { delay } => {
                    self.emit(RequestEvent::BackoffScheduled { attempt, delay });
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(self.cancelled(attempt + 1, elapsed));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                decision => {
                    self.metrics.record_failure(elapsed, StatusRecord::for_error(&error));
                    let terminal = self.policy.terminal_error(decision, error, &url);
                    self.emit(RequestEvent::Failed {
                        attempts: attempt + 1,
                        kind: terminal.kind,
                    });
                    return Err(Error::Api(terminal));
                }
            }
        }
    }

    fn cancelled(&self, attempts: u32, elapsed: Duration) -> Error {
        self.metrics.record_failure(elapsed, StatusRecord::Cancelled);
        self.emit(RequestEvent::Cancelled { attempts });
        Error::Cancelled
    }

    fn emit(&self, event: RequestEvent) {
        self.observer.on_event(&event);
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

/// Parse a 2xx body, wrapping anything that is not JSON in a marker object
fn parse_success_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| {
        json!({
            "message": NON_JSON_SUCCESS_MESSAGE,
            "raw_response": body,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::ErrorKind;
    use crate::http::observer::RecordingObserver;
    use crate::http::transport::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Scripted = std::result::Result<TransportResponse, TransportError>;

    /// Replays a fixed list of responses and records every request
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<TransportRequest>>,
        latency: Duration,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                ..Default::default()
            })
        }

        fn with_latency(script: Vec<Scripted>, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                latency,
                ..Default::default()
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn requests(&self) -> Vec<TransportRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: TransportRequest) -> Scripted {
            self.requests.lock().unwrap().push(request);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Other("script exhausted".to_string())))
        }
    }

    fn ok(body: &str) -> Scripted {
        Ok(TransportResponse::new(200, body))
    }

    fn status(code: u16, body: &str) -> Scripted {
        Ok(TransportResponse::new(code, body))
    }

    fn config(max_retries: u32) -> ClientConfig {
        ClientConfig::new("sk-test")
            .with_base_url("https://api.example.com/v1")
            .with_max_retries(max_retries)
            .with_backoff_factor(Duration::from_millis(100))
            .with_max_requests_per_second(1000.0)
    }

    fn client(max_retries: u32, transport: Arc<ScriptedTransport>) -> (HttpClient, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let client = HttpClient::with_transport(config(max_retries), transport)
            .unwrap()
            .with_observer(observer.clone());
        (client, observer)
    }

    fn api_error(result: Result<Value>) -> crate::http::error::ClassifiedError {
        match result {
            Err(Error::Api(error)) => error,
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let transport = ScriptedTransport::new(vec![]);
        let result = HttpClient::with_transport(ClientConfig::default(), transport);
        assert!(matches!(result, Err(Error::Configuration { .. })));
        assert!(HttpClient::new(ClientConfig::default()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_success() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"data": [{"id": "gpt-4"}]}"#)]);
        let (client, _) = client(2, transport.clone());

        let mut params = QueryParams::new();
        params.insert("limit".to_string(), "5".to_string());
        let value = client.get("models", Some(params.clone())).await.unwrap();

        assert_eq!(value["data"][0]["id"], "gpt-4");
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].url, "https://api.example.com/v1/models");
        assert_eq!(requests[0].query, Some(params));
        assert_eq!(requests[0].body, None);

        let metrics = client.metrics();
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.successful_requests, 1);
        assert_eq!(metrics.status_history, vec![StatusRecord::Http(200)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_post_body_passed_verbatim() {
        let transport = ScriptedTransport::new(vec![ok("{}"), ok("{}")]);
        let (client, _) = client(0, transport.clone());

        client.post("chat/completions", Some(json!({}))).await.unwrap();
        client.post("chat/completions", None).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].body, Some(json!({})));
        assert_eq!(requests[1].body, None);
        assert_eq!(requests[0].method, HttpMethod::Post);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_then_success() {
        let transport = ScriptedTransport::new(vec![status(500, ""), ok(r#"{"id": "abc"}"#)]);
        let (client, observer) = client(2, transport.clone());

        let value = client.post("chat/completions", Some(json!({"model": "m"}))).await.unwrap();

        assert_eq!(value["id"], "abc");
        assert_eq!(transport.calls(), 2);
        assert_eq!(observer.backoff_delays(), vec![Duration::from_millis(100)]);
        assert_eq!(observer.failed_attempts(), 1);

        let metrics = client.metrics();
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.successful_requests, 1);
        assert_eq!(metrics.failed_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_never_retried() {
        let transport = ScriptedTransport::new(vec![status(
            404,
            r#"{"error": {"message": "Recurso não encontrado"}}"#,
        )]);
        let (client, observer) = client(3, transport.clone());

        let error = api_error(client.get("nope", None).await);

        assert_eq!(error.kind, ErrorKind::NotFound);
        assert!(error.message.contains("Recurso não encontrado"));
        assert_eq!(transport.calls(), 1);
        assert!(observer.backoff_delays().is_empty());

        let metrics = client.metrics();
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.status_history, vec![StatusRecord::Http(404)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_input_errors_raised_immediately() {
        for (code, kind) in [
            (400, ErrorKind::BadRequest),
            (401, ErrorKind::Authentication),
            (403, ErrorKind::Authentication),
        ] {
            let transport = ScriptedTransport::new(vec![status(code, "")]);
            let (client, _) = client(3, transport.clone());
            let error = api_error(client.get("models", None).await);
            assert_eq!(error.kind, kind);
            assert_eq!(transport.calls(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_wraps_last_error() {
        let transport = ScriptedTransport::new(vec![status(503, ""), status(502, ""), status(500, "")]);
        let (client, observer) = client(2, transport.clone());

        let error = api_error(client.get("models", None).await);

        assert_eq!(transport.calls(), 3);
        assert_eq!(error.kind, ErrorKind::RetryExhausted);
        assert!(error.message.contains("2"));
        assert!(error.message.contains("https://api.example.com/v1/models"));
        let original = error.original().unwrap();
        assert_eq!(original.kind, ErrorKind::ServerError);
        assert_eq!(original.status_code, Some(500));
        assert_eq!(
            observer.backoff_delays(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );

        let metrics = client.metrics();
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.status_history, vec![StatusRecord::Http(500)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_raises_raw_error() {
        let cases: Vec<(Scripted, ErrorKind, StatusRecord)> = vec![
            (Err(TransportError::Timeout("t".into())), ErrorKind::Timeout, StatusRecord::Timeout),
            (
                Err(TransportError::Connect("c".into())),
                ErrorKind::ConnectionFailure,
                StatusRecord::Connection,
            ),
            (
                Err(TransportError::Other("o".into())),
                ErrorKind::GenericClient,
                StatusRecord::Exception,
            ),
            (status(429, ""), ErrorKind::RateLimit, StatusRecord::Http(429)),
            (status(500, ""), ErrorKind::ServerError, StatusRecord::Http(500)),
        ];

        for (scripted, kind, record) in cases {
            let transport = ScriptedTransport::new(vec![scripted]);
            let (client, _) = client(0, transport.clone());
            let error = api_error(client.get("models", None).await);
            assert_eq!(error.kind, kind);
            assert!(error.original().is_none());
            assert_eq!(transport.calls(), 1);
            assert_eq!(client.metrics().status_history, vec![record]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmapped_status_retried_then_raised_raw() {
        let transport = ScriptedTransport::new(vec![status(418, ""), status(418, "")]);
        let (client, observer) = client(1, transport.clone());

        let error = api_error(client.get("teapot", None).await);

        assert_eq!(transport.calls(), 2);
        assert_eq!(error.kind, ErrorKind::GenericApi);
        assert_eq!(error.status_code, Some(418));
        assert_eq!(observer.backoff_delays(), vec![Duration::from_millis(100)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sleeps_exact_delays() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Connect("refused".into())),
            Err(TransportError::Connect("refused".into())),
            Err(TransportError::Connect("refused".into())),
            ok("{}"),
        ]);
        let (client, _) = client(3, transport.clone());

        let start = Instant::now();
        client.get("models", None).await.unwrap();

        assert_eq!(transport.calls(), 4);
        assert_eq!(start.elapsed(), Duration::from_millis(100 + 200 + 400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_json_success_body() {
        let transport = ScriptedTransport::new(vec![ok("plain text")]);
        let (client, _) = client(0, transport);

        let value = client.get("health", None).await.unwrap();

        assert_eq!(value["message"], NON_JSON_SUCCESS_MESSAGE);
        assert_eq!(value["raw_response"], "plain text");
        assert_eq!(client.metrics().successful_requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_use_last_attempt_elapsed() {
        let transport = ScriptedTransport::with_latency(
            vec![status(500, ""), ok("{}")],
            Duration::from_millis(50),
        );
        let (client, _) = client(1, transport);

        client.get("models", None).await.unwrap();

        assert_eq!(client.metrics().total_elapsed, Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = ScriptedTransport::new(vec![status(500, ""), ok("{}")]);
        let (client, observer) = client(2, transport.clone());
        let client = Arc::new(client);
        let cancel = CancellationToken::new();

        let task = {
            let client = client.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { client.get_with_cancel("models", None, &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let result = task.await.unwrap();

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(transport.calls(), 1);
        assert_eq!(client.metrics().status_history, vec![StatusRecord::Cancelled]);
        assert!(observer
            .events()
            .iter()
            .any(|event| matches!(event, RequestEvent::Cancelled { attempts: 1 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_token_sends_nothing() {
        let transport = ScriptedTransport::new(vec![ok("{}")]);
        let (client, _) = client(0, transport.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.post_with_cancel("completions", None, &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(transport.calls(), 0);
        assert_eq!(client.metrics().failed_requests, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_event_emitted() {
        let transport = ScriptedTransport::new(vec![ok("{}"), ok("{}")]);
        let observer = Arc::new(RecordingObserver::new());
        let client = HttpClient::with_transport(config(0).with_max_requests_per_second(1.0), transport)
            .unwrap()
            .with_observer(observer.clone());

        client.get("a", None).await.unwrap();
        client.get("b", None).await.unwrap();

        assert!(observer
            .events()
            .iter()
            .any(|event| matches!(event, RequestEvent::RateLimited { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_zero_rate_waits_without_sending() {
        let transport = ScriptedTransport::new(vec![ok("{}")]);
        let config = config(0).with_max_requests_per_second(1e-20);
        assert!(config.validate().is_ok());
        let client = HttpClient::with_transport(config, transport.clone()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), client.get("models", None)).await;
        assert!(result.is_err());
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_debug_hides_key() {
        let transport = ScriptedTransport::new(vec![]);
        let config = config(0);
        let client = HttpClient::with_transport(ClientConfig { api_key: "sk-abcdefghijkl".into(), ..config }, transport)
            .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("abcdefghijkl"));
        assert_eq!(client.config().max_retries, 0);
    }
}
