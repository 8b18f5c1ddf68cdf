use classbox::{ErrorKind, ExecutionRequest, ExecutionService, RateLimitConfig, Response};

use super::{scratch_entries, test_config};

fn error_kind(response: &Response) -> Option<ErrorKind> {
    match response {
        Response::Error { error_kind, .. } => Some(*error_kind),
        Response::Success { .. } => None,
    }
}

#[tokio::test]
async fn over_budget_client_gets_rate_limited() {
    let (mut config, _scratch) = test_config();
    config.rate_limits.insert(
        "run".to_owned(),
        RateLimitConfig {
            max_requests: 3,
            window_seconds: 60,
        },
    );
    let service = ExecutionService::new(config);

    let mut kinds = Vec::new();
    for _ in 0..4 {
        let response = service
            .handle(ExecutionRequest::new("print('ok')", "it-limited"))
            .await;
        kinds.push(error_kind(&response));
    }

    assert_eq!(kinds[..3], [None, None, None]);
    assert_eq!(kinds[3], Some(ErrorKind::RateLimitError));
}

#[tokio::test]
async fn rate_limited_response_carries_retry_after() {
    let (mut config, _scratch) = test_config();
    config.rate_limits.insert(
        "run".to_owned(),
        RateLimitConfig {
            max_requests: 1,
            window_seconds: 45,
        },
    );
    let service = ExecutionService::new(config);

    let _ = service
        .handle(ExecutionRequest::new("print('ok')", "it-retry"))
        .await;
    let denied = service
        .handle(ExecutionRequest::new("print('ok')", "it-retry"))
        .await;

    let Response::Error {
        error_kind,
        retry_after_seconds,
        ..
    } = denied
    else {
        panic!("expected an error response");
    };
    assert_eq!(error_kind, ErrorKind::RateLimitError);
    assert_eq!(retry_after_seconds, Some(45));
}

#[tokio::test]
async fn second_endpoint_is_not_falsely_rejected() {
    let (mut config, _scratch) = test_config();
    config.rate_limits.insert(
        "run".to_owned(),
        RateLimitConfig {
            max_requests: 2,
            window_seconds: 60,
        },
    );
    config.rate_limits.insert(
        "check".to_owned(),
        RateLimitConfig {
            max_requests: 2,
            window_seconds: 60,
        },
    );
    let service = ExecutionService::new(config);

    // Exhaust "run" for this client.
    for _ in 0..2 {
        let response = service
            .handle(ExecutionRequest::new("print('ok')", "it-split"))
            .await;
        assert_eq!(error_kind(&response), None);
    }
    // "check" still has its own budget.
    for _ in 0..2 {
        let response = service
            .handle(
                ExecutionRequest::new("print('ok')", "it-split").with_endpoint("check"),
            )
            .await;
        assert_eq!(error_kind(&response), None);
    }
}

#[tokio::test]
async fn kill_switch_disables_execution_entirely() {
    let (mut config, scratch) = test_config();
    config.execution_enabled = false;
    let service = ExecutionService::new(config);

    let response = service
        .handle(ExecutionRequest::new("print('ok')", "it-disabled"))
        .await;

    assert_eq!(error_kind(&response), Some(ErrorKind::SystemError));
    assert_eq!(scratch_entries(&scratch), 0);
}

#[tokio::test]
async fn rejected_submissions_never_reach_the_sandbox() {
    let (mut config, scratch) = test_config();
    config.max_source_length = 20;
    let service = ExecutionService::new(config);

    // Oversized
    let response = service
        .handle(ExecutionRequest::new(
            "print('this source is much too long')",
            "it-rejects",
        ))
        .await;
    assert_eq!(error_kind(&response), Some(ErrorKind::InputError));

    // Deny-listed
    let response = service
        .handle(ExecutionRequest::new("eval('1')", "it-rejects"))
        .await;
    assert_eq!(error_kind(&response), Some(ErrorKind::SecurityError));

    assert_eq!(scratch_entries(&scratch), 0);
}
