use classbox::{ErrorKind, ExecutionRequest, ExecutionService, Response, TRUNCATION_MARKER};

use super::{scratch_entries, test_config};

#[tokio::test]
async fn infinite_loop_hits_the_wall_clock_deadline() {
    let (config, scratch) = test_config();
    let grace = config
        .default_limits
        .cpu_extra_time
        .unwrap_or(1.0);
    let service = ExecutionService::new(config);

    let request = ExecutionRequest::new("while True: pass", "it-timeout").with_timeout(1.0);
    let response = service.handle(request).await;

    let Response::Error {
        error_kind,
        elapsed_seconds,
        ..
    } = response
    else {
        panic!("expected an error, got {response:?}");
    };
    assert_eq!(error_kind, ErrorKind::TimeoutError);
    assert!(elapsed_seconds >= 1.0, "elapsed was {elapsed_seconds}");
    // Kill and reap overhead stays well inside the grace period.
    assert!(
        elapsed_seconds <= 1.0 + grace + 1.0,
        "elapsed was {elapsed_seconds}"
    );
    assert_eq!(scratch_entries(&scratch), 0);
}

#[tokio::test]
async fn long_output_is_truncated_to_the_exact_ceiling() {
    let (mut config, _scratch) = test_config();
    config.max_output_length = 100;
    let service = ExecutionService::new(config);

    let response = service
        .handle(ExecutionRequest::new(
            "print('x' * 5000)",
            "it-truncation",
        ))
        .await;

    let Response::Success { output, .. } = response else {
        panic!("expected success, got {response:?}");
    };
    assert!(output.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        output.chars().count(),
        100 + TRUNCATION_MARKER.chars().count()
    );
    assert_eq!(output.matches("[output truncated]").count(), 1);
    assert!(output.starts_with("xxx"));
}

#[tokio::test]
async fn short_output_is_not_truncated() {
    let (mut config, _scratch) = test_config();
    config.max_output_length = 100;
    let service = ExecutionService::new(config);

    let response = service
        .handle(ExecutionRequest::new("print('tidy')", "it-no-trunc"))
        .await;

    let Response::Success { output, .. } = response else {
        panic!("expected success, got {response:?}");
    };
    assert_eq!(output, "tidy\n");
}

#[tokio::test]
async fn stderr_is_truncated_independently() {
    let (mut config, _scratch) = test_config();
    config.max_output_length = 80;
    let service = ExecutionService::new(config);

    let source = r#"
import sys
sys.stderr.write('e' * 4000)
sys.exit(1)
"#;
    let response = service
        .handle(ExecutionRequest::new(source, "it-stderr-trunc"))
        .await;

    let Response::Error {
        raw_error_output, ..
    } = response
    else {
        panic!("expected an error, got {response:?}");
    };
    assert!(raw_error_output.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        raw_error_output.chars().count(),
        80 + TRUNCATION_MARKER.chars().count()
    );
}

#[tokio::test]
async fn scratch_root_is_clean_after_every_outcome() {
    let (config, scratch) = test_config();
    let service = ExecutionService::new(config);

    // Success
    let _ = service
        .handle(ExecutionRequest::new("print('ok')", "it-clean"))
        .await;
    assert_eq!(scratch_entries(&scratch), 0);

    // Runtime failure
    let _ = service
        .handle(ExecutionRequest::new("print(1 / 0)", "it-clean"))
        .await;
    assert_eq!(scratch_entries(&scratch), 0);

    // Timeout
    let request = ExecutionRequest::new("while True: pass", "it-clean").with_timeout(1.0);
    let _ = service.handle(request).await;
    assert_eq!(scratch_entries(&scratch), 0);
}
