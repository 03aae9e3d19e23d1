//! JSON-RPC 2.0 envelope types, parsing, and serialization.
//!
//! A request line decodes in two stages: malformed JSON is a parse error
//! (`-32700`, no identifier recoverable), while well-formed JSON with an
//! invalid envelope shape is an invalid request (`-32600`, identifier
//! preserved when one could be recovered). No partial request is ever
//! produced on failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version literal every envelope must carry.
pub const PROTOCOL_VERSION: &str = "2.0";

/// JSON-RPC error code for malformed request text.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC error code for a structurally invalid envelope.
pub const INVALID_REQUEST: i64 = -32600;
/// JSON-RPC error code for an unknown method name.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC error code for undecodable method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC error code for an unexpected dispatch failure.
pub const INTERNAL_ERROR: i64 = -32603;

/// Caller-supplied request identifier, echoed back verbatim in type.
///
/// Numeric identifiers are bounded to `i64`; values outside that range are
/// rejected as invalid requests rather than silently truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer identifier.
    Number(i64),
    /// String identifier.
    String(String),
}

impl RequestId {
    /// Extract an identifier from a JSON value, accepting only the two
    /// wire types the protocol allows. Floats and other types yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A validated inbound request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Protocol version tag; always [`PROTOCOL_VERSION`].
    pub version: String,
    /// Caller-supplied identifier.
    pub id: RequestId,
    /// Method name to dispatch.
    pub method: String,
    /// Method-specific parameters, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Why a request line failed to decode into a [`Request`].
#[derive(Debug)]
pub enum ParseFailure {
    /// The text is not well-formed JSON.
    Malformed(String),
    /// The JSON decoded but the envelope shape is invalid.
    Invalid {
        /// Identifier recovered from the broken envelope, when possible.
        id: Option<RequestId>,
        /// Which envelope field failed validation.
        reason: String,
    },
}

/// Protocol-level error payload inside a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric code from the fixed error enumeration.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// An outbound response envelope carrying exactly one of result or error.
///
/// Construct only through the associated functions; they uphold the
/// one-of-{result, error} invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Protocol version tag; always [`PROTOCOL_VERSION`].
    pub version: String,
    /// Identifier of the originating request; `null` only when no
    /// identifier could be recovered from a broken request.
    pub id: Option<RequestId>,
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    /// Build a success response echoing the request identifier.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_owned(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    fn error_response(id: Option<RequestId>, code: i64, message: String) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_owned(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Build a `-32700` response for request text that was not valid JSON.
    /// The identifier is always `null`: none could be recovered.
    #[must_use]
    pub fn parse_error(detail: &str) -> Self {
        Self::error_response(None, PARSE_ERROR, format!("Parse error: {detail}"))
    }

    /// Build a `-32600` response for a structurally invalid envelope,
    /// preserving the identifier when one was recovered.
    #[must_use]
    pub fn invalid_request(id: Option<RequestId>, reason: &str) -> Self {
        Self::error_response(id, INVALID_REQUEST, format!("Invalid Request: {reason}"))
    }

    /// Build a `-32601` response naming the unknown method.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::error_response(
            Some(id),
            METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
        )
    }

    /// Build a `-32602` response for params that could not be decoded
    /// into the method's parameter shape.
    #[must_use]
    pub fn invalid_params(id: RequestId, detail: &str) -> Self {
        Self::error_response(Some(id), INVALID_PARAMS, format!("Invalid params: {detail}"))
    }

    /// Build a `-32603` response for an unexpected dispatch failure.
    #[must_use]
    pub fn internal_error(id: RequestId, detail: &str) -> Self {
        Self::error_response(Some(id), INTERNAL_ERROR, format!("Internal error: {detail}"))
    }

    /// Serialize the response to a single JSON line.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            // The envelope contains only JSON-representable types; reaching
            // this branch would mean a serde_json regression.
            r#"{"version":"2.0","id":null,"error":{"code":-32603,"message":"Internal error: serialization failed"}}"#.to_owned()
        })
    }
}

/// Decode request text into a validated [`Request`].
///
/// # Errors
///
/// Returns [`ParseFailure::Malformed`] when the text is not JSON, and
/// [`ParseFailure::Invalid`] when the envelope is missing the version
/// literal, a string method name, or a string/integer identifier.
pub fn parse_request(text: &str) -> std::result::Result<Request, ParseFailure> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ParseFailure::Malformed(err.to_string()))?;

    let Value::Object(map) = value else {
        return Err(ParseFailure::Invalid {
            id: None,
            reason: "request must be a JSON object".to_owned(),
        });
    };

    // Recover the identifier first so later failures can still echo it.
    let id = map.get("id").and_then(RequestId::from_value);

    match map.get("version").and_then(Value::as_str) {
        Some(PROTOCOL_VERSION) => {}
        _ => {
            return Err(ParseFailure::Invalid {
                id,
                reason: format!("version must be the literal \"{PROTOCOL_VERSION}\""),
            });
        }
    }

    let Some(method) = map.get("method").and_then(Value::as_str) else {
        return Err(ParseFailure::Invalid {
            id,
            reason: "method must be a string".to_owned(),
        });
    };

    let Some(id) = id else {
        return Err(ParseFailure::Invalid {
            id: None,
            reason: "id must be a string or an integer".to_owned(),
        });
    };

    Ok(Request {
        version: PROTOCOL_VERSION.to_owned(),
        id,
        method: method.to_owned(),
        params: map.get("params").cloned(),
    })
}
