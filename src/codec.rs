//! Wire text codec
//!
//! Pure functions between [`DataRef`] values and the line-oriented wire text
//! format, plus command phase encoding and reply-sentinel parsing. Decoding is
//! all-or-nothing: no function here ever returns a partially populated value.
//!
//! Wire grammar:
//! - get request: `get:<name>`
//! - set request: `set:<name>;<type-int>;<value>`
//! - dataref reply: `<name>;<type-int>;<value>` or `{invalid_dataref}`
//! - command request: `cmd:<name>:<phase>[;cmd:<name2>:<phase2>...]`
//! - command reply: `;`-joined sentinels, positionally correlated

use crate::dataref::{DataRef, DataRefType, DataRefValue};
use std::fmt;
use thiserror::Error;

/// Reply sentinel for a successful operation.
pub const SENTINEL_OK: &str = "{ok}";
/// Reply sentinel for a get on a dataref the simulator does not know.
pub const SENTINEL_INVALID_DATAREF: &str = "{invalid_dataref}";
/// Reply sentinel for a command name the simulator does not know.
pub const SENTINEL_INVALID_COMMAND: &str = "{invalid_command}";
/// Reply sentinel for a hold request that arrived without a duration.
pub const SENTINEL_MISSING_HOLD_DURATION: &str = "{missing_hold_duration}";

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed dataref message: expected {expected} segments, got {got}")]
    MalformedMessage { expected: usize, got: usize },

    #[error("unsupported dataref type discriminant {0:?}")]
    UnsupportedType(String),

    #[error("dataref name mismatch: requested {requested:?}, reply carries {replied:?}")]
    NameMismatch { requested: String, replied: String },

    #[error("failed to parse {kind} value from {raw:?}")]
    ValueParse { kind: &'static str, raw: String },

    #[error("batched reply carries {got} results for {expected} commands")]
    BatchArityMismatch { expected: usize, got: usize },
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Lifecycle phase of a simulator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    Begin,
    End,
    Once,
    Hold { duration_ms: u32 },
}

impl fmt::Display for CommandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "begin"),
            Self::End => write!(f, "end"),
            Self::Once => write!(f, "once"),
            Self::Hold { duration_ms } => write!(f, "hold:{}", duration_ms),
        }
    }
}

/// Outcome sentinel for one position of a batched command reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Ok,
    InvalidCommand,
    MissingHoldDuration,
    /// Any token outside the known sentinel set, kept verbatim for logging.
    Other(String),
}

/// Encode a dataref as its wire triple `<name>;<type-int>;<value>`.
pub fn encode_dataref(dataref: &DataRef) -> String {
    format!(
        "{};{};{}",
        dataref.name(),
        dataref.data_type() as i32,
        dataref.value()
    )
}

/// Encode a get request for one dataref.
pub fn encode_get(name: &str) -> String {
    format!("get:{}", name)
}

/// Encode a set request carrying the full dataref triple.
pub fn encode_set(dataref: &DataRef) -> String {
    format!("set:{}", encode_dataref(dataref))
}

/// Encode a batched command request, one `cmd:<name>:<phase>` per name.
pub fn encode_command_batch(names: &[&str], phase: CommandPhase) -> String {
    let requests: Vec<String> = names
        .iter()
        .map(|name| format!("cmd:{}:{}", name, phase))
        .collect();
    requests.join(";")
}

/// Decode a dataref reply line against the name that was requested.
///
/// The name check guards against a desynchronized reply stream: the transport
/// is a single shared request/response line, and a stray or delayed reply
/// would otherwise be attributed to the wrong request.
pub fn decode_dataref(expected_name: &str, raw: &str) -> CodecResult<DataRef> {
    let segments: Vec<&str> = raw.splitn(3, ';').collect();
    if segments.len() != 3 {
        return Err(CodecError::MalformedMessage {
            expected: 3,
            got: segments.len(),
        });
    }

    let (name, type_segment, value_segment) = (segments[0], segments[1], segments[2]);

    let data_type = type_segment
        .parse::<i32>()
        .ok()
        .and_then(|id| DataRefType::try_from(id).ok())
        .ok_or_else(|| CodecError::UnsupportedType(type_segment.to_string()))?;

    if name != expected_name {
        return Err(CodecError::NameMismatch {
            requested: expected_name.to_string(),
            replied: name.to_string(),
        });
    }

    let value = parse_wire_value(data_type, value_segment)?;
    Ok(DataRef::new(expected_name, value))
}

/// Parse a wire value segment according to its discriminant.
pub fn parse_wire_value(data_type: DataRefType, raw: &str) -> CodecResult<DataRefValue> {
    match data_type {
        DataRefType::Int => raw
            .parse::<i32>()
            .map(DataRefValue::Int)
            .map_err(|_| value_error("int", raw)),
        DataRefType::Float => raw
            .parse::<f32>()
            .map(DataRefValue::Float)
            .map_err(|_| value_error("float", raw)),
        DataRefType::Double => raw
            .parse::<f64>()
            .map(DataRefValue::Double)
            .map_err(|_| value_error("double", raw)),
        DataRefType::FloatArray => raw
            .split(',')
            .map(|elem| elem.parse::<f32>())
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map(DataRefValue::FloatArray)
            .map_err(|_| value_error("float array", raw)),
        DataRefType::IntArray => raw
            .split(',')
            .map(|elem| elem.parse::<i32>())
            .collect::<std::result::Result<Vec<i32>, _>>()
            .map(DataRefValue::IntArray)
            .map_err(|_| value_error("int array", raw)),
        DataRefType::Data => Ok(DataRefValue::Data(raw.to_string())),
    }
}

fn value_error(kind: &'static str, raw: &str) -> CodecError {
    CodecError::ValueParse {
        kind,
        raw: raw.to_string(),
    }
}

/// Parse one sentinel token of a command reply.
pub fn parse_command_reply(token: &str) -> CommandReply {
    match token {
        SENTINEL_OK => CommandReply::Ok,
        SENTINEL_INVALID_COMMAND => CommandReply::InvalidCommand,
        SENTINEL_MISSING_HOLD_DURATION => CommandReply::MissingHoldDuration,
        other => CommandReply::Other(other.to_string()),
    }
}

/// Split a batched command reply into per-position sentinels.
///
/// Position `i` of the reply answers position `i` of the request; names are
/// not echoed back, so the token count must match the request count exactly
/// or the correlation is lost.
pub fn split_batch_reply(reply: &str, expected: usize) -> CodecResult<Vec<CommandReply>> {
    let tokens: Vec<&str> = reply.split(';').collect();
    if tokens.len() != expected {
        return Err(CodecError::BatchArityMismatch {
            expected,
            got: tokens.len(),
        });
    }
    Ok(tokens.into_iter().map(parse_command_reply).collect())
}
