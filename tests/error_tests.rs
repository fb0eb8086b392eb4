//! Tests for error classification and messages.

use pretty_assertions::assert_eq;

use chainstream::error::{ChainstreamError, ErrorCategory};

#[test]
fn executor_failures_are_upstream() {
    let err = ChainstreamError::executor("model quota exceeded");

    assert_eq!(err.category(), ErrorCategory::Upstream);
    assert!(err.is_upstream());
    assert_eq!(err.to_string(), "Executor error: model quota exceeded");
}

#[test]
fn missing_final_output_is_protocol_error() {
    let err = ChainstreamError::missing_final_output("qa-agent");

    assert_eq!(err.category(), ErrorCategory::Protocol);
    assert!(!err.is_upstream());
    assert_eq!(
        err.to_string(),
        "Agent 'qa-agent' finished without a final output"
    );
}

#[test]
fn conversions_keep_their_category() {
    let io: ChainstreamError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert_eq!(io.category(), ErrorCategory::Io);

    let json: ChainstreamError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
    assert_eq!(json.category(), ErrorCategory::Serialization);

    assert_eq!(
        ChainstreamError::Store("unreachable".into()).category(),
        ErrorCategory::Store
    );
    assert!(ChainstreamError::Store("unreachable".into()).is_upstream());
    assert_eq!(
        ChainstreamError::InvalidArgument("window".into()).category(),
        ErrorCategory::Configuration
    );
}

#[test]
fn categories_serialize_as_snake_case() {
    assert_eq!(
        serde_json::to_value(ErrorCategory::TraceSink).unwrap(),
        serde_json::json!("trace_sink")
    );
}
