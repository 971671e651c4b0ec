use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use genai_adapter::prelude::*;
use genai_adapter::providers::gemini::{gemini_backoff_executor, retry_decision_for_error};
use genai_adapter::retry::RetryPolicy;

/// Fails with the given error until `fail_until` attempts have been made.
#[derive(Debug)]
struct TestModel {
    attempts: AtomicU32,
    fail_until: u32,
    failure: LlmError,
}

impl TestModel {
    fn new(fail_until: u32, failure: LlmError) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_until,
            failure,
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelApi for TestModel {
    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        _input: &[ChatMessage],
        _tools: &[ToolInfo],
        _tool_choice: Option<&ToolChoice>,
        _config: &GenerateConfig,
    ) -> Result<ModelOutput, LlmError> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.fail_until {
            return Err(self.failure.clone());
        }
        Ok(ModelOutput {
            model: "mock-model".into(),
            choices: vec![CompletionChoice {
                index: 0,
                content: "success".into(),
                reasoning: None,
                stop_reason: StopReason::Stop,
                tool_calls: None,
            }],
            usage: None,
            response_id: None,
        })
    }

    fn retry_decision(&self, error: &LlmError) -> RetryDecision {
        retry_decision_for_error(error)
    }
}

fn fast_policy(attempts: u32) -> RetryOptions {
    RetryOptions::with_policy(
        RetryPolicy::new()
            .with_max_attempts(attempts)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false),
    )
}

async fn run(model: &TestModel, options: Option<RetryOptions>) -> Result<ModelOutput, LlmError> {
    let input = [ChatMessage::user("hi")];
    let config = GenerateConfig::default();
    maybe_retry(
        options,
        || model.generate(&input, &[], None, &config),
        |err| model.retry_decision(err),
    )
    .await
}

#[tokio::test]
async fn retries_and_succeeds_on_second_attempt() {
    let model = TestModel::new(1, LlmError::api_error(500, "forced failure"));
    let output = run(&model, Some(fast_policy(3))).await.expect("should succeed");
    assert_eq!(output.completion(), "success");
    assert_eq!(model.attempts(), 2);
}

#[tokio::test]
async fn respects_max_attempts_and_fails() {
    let model = TestModel::new(u32::MAX, LlmError::api_error(503, "unavailable"));
    let err = run(&model, Some(fast_policy(2))).await.expect_err("should fail");
    match err {
        LlmError::ApiError { code, .. } => assert_eq!(code, 503),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(model.attempts(), 2);
}

#[tokio::test]
async fn configuration_errors_propagate_unchanged() {
    let model = TestModel::new(
        u32::MAX,
        LlmError::ConfigurationError("unknown safety category 'violence'".into()),
    );
    let err = run(&model, Some(fast_policy(5))).await.expect_err("should fail");
    assert!(matches!(err, LlmError::ConfigurationError(ref m) if m.contains("violence")));
    assert_eq!(model.attempts(), 1);
}

#[tokio::test]
async fn no_options_means_single_attempt() {
    let model = TestModel::new(1, LlmError::api_error(500, "forced failure"));
    assert!(run(&model, None).await.is_err());
    assert_eq!(model.attempts(), 1);
}

fn quota_error(delay: &str) -> LlmError {
    let details = serde_json::json!({
        "error": {
            "code": 429,
            "message": "quota",
            "status": "RESOURCE_EXHAUSTED",
            "details": [
                {"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": delay}
            ]
        }
    });
    LlmError::api_error_with_details(429, "quota", details)
}

#[tokio::test(start_paused = true)]
async fn suggested_delay_drives_the_wait() {
    let model = TestModel::new(1, quota_error("42s"));
    let started = tokio::time::Instant::now();

    let output = run(&model, Some(fast_policy(3))).await.expect("should succeed");

    assert_eq!(output.completion(), "success");
    assert!(started.elapsed() >= Duration::from_secs(42));
}

#[tokio::test]
async fn backoff_backend_honors_classifier() {
    let model = TestModel::new(2, LlmError::TimeoutError("slow".into()));
    let executor = genai_adapter::retry::BackoffRetryExecutor::with_backoff(
        backoff::ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(1))
            .with_max_elapsed_time(Some(Duration::from_secs(5)))
            .build(),
    );
    let output = run(&model, Some(RetryOptions::backoff().with_backoff_executor(executor)))
        .await
        .expect("should succeed");
    assert_eq!(output.completion(), "success");
    assert_eq!(model.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn gemini_backoff_gives_up_on_persistent_quota_errors() {
    let model = TestModel::new(u32::MAX, quota_error("42s"));
    let started = tokio::time::Instant::now();

    let result = tokio::time::timeout(
        Duration::from_secs(24 * 60 * 60),
        run(
            &model,
            Some(RetryOptions::backoff().with_backoff_executor(gemini_backoff_executor())),
        ),
    )
    .await
    .expect("retry loop should stop within its elapsed budget");

    assert!(matches!(result, Err(LlmError::ApiError { code: 429, .. })));
    // Attempts at 0, 42, ..., 294 s; the next wait would pass the 300 s budget
    assert_eq!(model.attempts(), 8);
    assert!(started.elapsed() <= Duration::from_secs(300));
}
