use classbox::{ExecutionRequest, ExecutionService, Response};

use super::{scratch_entries, test_config};

#[tokio::test]
async fn hello_world_succeeds() {
    let (config, scratch) = test_config();
    let service = ExecutionService::new(config);

    let response = service
        .handle(ExecutionRequest::new("print('Hello, World!')", "it-hello"))
        .await;

    let Response::Success {
        output,
        elapsed_seconds,
        simulated_input_echo,
    } = response
    else {
        panic!("expected success, got {response:?}");
    };
    assert!(output.contains("Hello, World!"));
    assert!(elapsed_seconds > 0.0);
    assert!(simulated_input_echo.is_none());
    assert_eq!(scratch_entries(&scratch), 0);
}

#[tokio::test]
async fn greeting_consumes_simulated_input() {
    let (config, scratch) = test_config();
    let service = ExecutionService::new(config);

    let source = r#"
name = input("What is your name? ")
print(f"Hello, {name}!")
"#;
    let request = ExecutionRequest::new(source, "it-greeting").with_inputs(["Alice"]);
    let response = service.handle(request).await;

    let Response::Success {
        output,
        simulated_input_echo,
        ..
    } = response
    else {
        panic!("expected success, got {response:?}");
    };
    assert!(output.contains("Alice"));
    assert_eq!(simulated_input_echo, Some(vec!["Alice".to_owned()]));
    assert_eq!(scratch_entries(&scratch), 0);
}

#[tokio::test]
async fn multiple_inputs_are_consumed_in_order() {
    let (config, _scratch) = test_config();
    let service = ExecutionService::new(config);

    let source = r#"
first = input()
second = input()
print(f"{first} then {second}")
"#;
    let request = ExecutionRequest::new(source, "it-inputs").with_inputs(["one", "two"]);
    let response = service.handle(request).await;

    let Response::Success { output, .. } = response else {
        panic!("expected success, got {response:?}");
    };
    assert!(output.contains("one then two"));
}

#[tokio::test]
async fn reading_past_supplied_input_fails_as_runtime_error() {
    let (config, scratch) = test_config();
    let service = ExecutionService::new(config);

    // No inputs supplied: the read hits EOF and raises.
    let response = service
        .handle(ExecutionRequest::new("name = input()", "it-eof"))
        .await;

    let Response::Error {
        raw_error_output, ..
    } = response
    else {
        panic!("expected an error, got {response:?}");
    };
    assert!(raw_error_output.to_lowercase().contains("eoferror"));
    assert_eq!(scratch_entries(&scratch), 0);
}

#[tokio::test]
async fn partial_output_is_preserved_on_failure() {
    let (config, _scratch) = test_config();
    let service = ExecutionService::new(config);

    let source = r#"
print("before the crash")
raise ValueError("boom")
"#;
    let response = service
        .handle(ExecutionRequest::new(source, "it-partial"))
        .await;

    let Response::Error {
        partial_output, ..
    } = response
    else {
        panic!("expected an error, got {response:?}");
    };
    assert!(partial_output.unwrap().contains("before the crash"));
}
