//! Unit tests for JSON-RPC envelope parsing, validation, and serialization.

use serde_json::Value;

use gemini_bridge::rpc::envelope::{
    parse_request, ParseFailure, RequestId, Response, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR,
};

#[test]
fn parses_request_with_number_id() {
    let request = parse_request(r#"{"version":"2.0","id":1,"method":"rawPrompt","params":{"prompt":"hi"}}"#)
        .expect("well-formed request must parse");

    assert_eq!(request.id, RequestId::Number(1));
    assert_eq!(request.method, "rawPrompt");
    assert!(request.params.is_some());
}

#[test]
fn parses_request_with_string_id() {
    let request = parse_request(r#"{"version":"2.0","id":"req-7","method":"config.get"}"#)
        .expect("string ids are valid");

    assert_eq!(request.id, RequestId::String("req-7".to_owned()));
    assert!(request.params.is_none());
}

#[test]
fn id_type_is_preserved_not_reinterpreted() {
    // "1" (string) and 1 (number) are distinct identifiers.
    let as_string = parse_request(r#"{"version":"2.0","id":"1","method":"rawPrompt"}"#)
        .expect("must parse");
    let as_number = parse_request(r#"{"version":"2.0","id":1,"method":"rawPrompt"}"#)
        .expect("must parse");

    assert_eq!(as_string.id, RequestId::String("1".to_owned()));
    assert_eq!(as_number.id, RequestId::Number(1));
    assert_ne!(as_string.id, as_number.id);
}

#[test]
fn malformed_json_is_a_parse_failure() {
    let result = parse_request("not json {{{");
    assert!(
        matches!(result, Err(ParseFailure::Malformed(_))),
        "malformed text must be Malformed, got: {result:?}"
    );
}

#[test]
fn wrong_version_is_invalid_and_recovers_id() {
    let result = parse_request(r#"{"version":"1.0","id":42,"method":"rawPrompt"}"#);

    match result {
        Err(ParseFailure::Invalid { id, reason }) => {
            assert_eq!(id, Some(RequestId::Number(42)), "id must be recovered");
            assert!(reason.contains("version"), "reason must name the field: {reason}");
        }
        other => panic!("expected Invalid, got: {other:?}"),
    }
}

#[test]
fn missing_method_is_invalid() {
    let result = parse_request(r#"{"version":"2.0","id":1}"#);
    match result {
        Err(ParseFailure::Invalid { reason, .. }) => {
            assert!(reason.contains("method"), "reason must name the field: {reason}");
        }
        other => panic!("expected Invalid, got: {other:?}"),
    }
}

#[test]
fn float_id_is_invalid() {
    let result = parse_request(r#"{"version":"2.0","id":1.5,"method":"rawPrompt"}"#);
    match result {
        Err(ParseFailure::Invalid { id, reason }) => {
            assert!(id.is_none(), "a float id must not be recovered");
            assert!(reason.contains("id"), "reason must name the field: {reason}");
        }
        other => panic!("expected Invalid, got: {other:?}"),
    }
}

#[test]
fn numeric_id_beyond_i64_is_invalid() {
    // 2^63, one past i64::MAX.
    let result = parse_request(r#"{"version":"2.0","id":9223372036854775808,"method":"rawPrompt"}"#);
    match result {
        Err(ParseFailure::Invalid { id, reason }) => {
            assert!(id.is_none(), "an out-of-range id must not be recovered");
            assert!(reason.contains("id"), "reason must name the field: {reason}");
        }
        other => panic!("expected Invalid, got: {other:?}"),
    }
}

#[test]
fn non_object_request_is_invalid() {
    let result = parse_request("[1,2,3]");
    assert!(matches!(result, Err(ParseFailure::Invalid { id: None, .. })));
}

#[test]
fn success_response_carries_result_only() {
    let response = Response::success(RequestId::Number(5), serde_json::json!({"ok": true}));
    let value: Value = serde_json::from_str(&response.to_json()).expect("must serialize as JSON");

    assert_eq!(value["version"], "2.0");
    assert_eq!(value["id"], 5);
    assert!(value.get("result").is_some(), "result must be present");
    assert!(value.get("error").is_none(), "error must be absent");
}

#[test]
fn parse_error_response_has_null_id_and_code() {
    let response = Response::parse_error("bad input");
    let value: Value = serde_json::from_str(&response.to_json()).expect("must serialize as JSON");

    assert!(value["id"].is_null(), "no id is recoverable for a parse error");
    assert_eq!(value["error"]["code"], PARSE_ERROR);
    assert!(value.get("result").is_none(), "result must be absent");
}

#[test]
fn invalid_request_response_preserves_recovered_id() {
    let response = Response::invalid_request(Some(RequestId::String("x".to_owned())), "no method");
    let value: Value = serde_json::from_str(&response.to_json()).expect("must serialize as JSON");

    assert_eq!(value["id"], "x");
    assert_eq!(value["error"]["code"], INVALID_REQUEST);
}

#[test]
fn method_not_found_names_the_method() {
    let response = Response::method_not_found(RequestId::Number(9), "bogusMethod");
    let value: Value = serde_json::from_str(&response.to_json()).expect("must serialize as JSON");

    assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
    assert!(
        value["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("bogusMethod")),
        "message must name the unknown method"
    );
}

#[test]
fn serialized_response_is_a_single_line() {
    let response = Response::success(
        RequestId::Number(1),
        serde_json::json!({"ok": true, "output": "line one"}),
    );
    assert!(
        !response.to_json().contains('\n'),
        "response must fit one transport line"
    );
}
