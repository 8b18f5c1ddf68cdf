use classbox::{ErrorKind, ExecutionRequest, ExecutionService, Response};

use super::test_config;

fn expect_error(response: Response) -> (ErrorKind, String, Option<u32>, String) {
    match response {
        Response::Error {
            error_kind,
            suggestion,
            line_number,
            raw_error_output,
            ..
        } => (error_kind, suggestion, line_number, raw_error_output),
        Response::Success { .. } => panic!("expected an error response"),
    }
}

#[tokio::test]
async fn unbalanced_parentheses_report_syntax_error_with_line() {
    let (config, _scratch) = test_config();
    let service = ExecutionService::new(config);

    let source = "print('first')\nprint('hello'\n";
    let response = service
        .handle(ExecutionRequest::new(source, "it-syntax"))
        .await;

    let (kind, _, line_number, raw) = expect_error(response);
    assert_eq!(kind, ErrorKind::SyntaxError);
    // The interpreter reports the unclosed call on line 2.
    assert_eq!(line_number, Some(2));
    assert!(raw.to_lowercase().contains("syntaxerror"));
}

#[tokio::test]
async fn undefined_identifier_reports_name_error_with_identifier() {
    let (config, _scratch) = test_config();
    let service = ExecutionService::new(config);

    let response = service
        .handle(ExecutionRequest::new("print(foo)", "it-name"))
        .await;

    let (kind, suggestion, line_number, _) = expect_error(response);
    assert_eq!(kind, ErrorKind::NameError);
    assert!(suggestion.contains("foo"));
    assert_eq!(line_number, Some(1));
}

#[tokio::test]
async fn division_by_zero_is_classified() {
    let (config, _scratch) = test_config();
    let service = ExecutionService::new(config);

    let response = service
        .handle(ExecutionRequest::new("print(1 / 0)", "it-zero"))
        .await;

    let (kind, _, line_number, _) = expect_error(response);
    assert_eq!(kind, ErrorKind::ZeroDivisionError);
    assert_eq!(line_number, Some(1));
}

#[tokio::test]
async fn raw_traceback_is_preserved_for_debugging() {
    let (config, _scratch) = test_config();
    let service = ExecutionService::new(config);

    let response = service
        .handle(ExecutionRequest::new("print(foo)", "it-trace"))
        .await;

    let (_, _, _, raw) = expect_error(response);
    assert!(raw.contains("Traceback"));
    assert!(raw.contains("NameError"));
}

#[tokio::test]
async fn inner_frame_line_wins_in_nested_traceback() {
    let (config, _scratch) = test_config();
    let service = ExecutionService::new(config);

    let source = r#"def inner():
    return undefined_var

inner()
"#;
    let response = service
        .handle(ExecutionRequest::new(source, "it-frames"))
        .await;

    let (kind, _, line_number, _) = expect_error(response);
    assert_eq!(kind, ErrorKind::NameError);
    assert_eq!(line_number, Some(2));
}
