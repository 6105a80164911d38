//! ASCII-safe JSON codec
//!
//! Every serialised envelope escapes non-ASCII codepoints as `\uXXXX`
//! (surrogate pairs above the BMP), so the bytes on the wire are identical
//! no matter which side produced them. `serde_json` decodes those escapes
//! natively on the parse path.

use super::envelope::{error_code, ErrorObject, Response};
use crate::port::transport::{TransportError, TransportReply};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;

struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// Serialise `value` as compact JSON containing only ASCII bytes.
pub fn to_ascii_string<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    value.serialize(&mut ser)?;
    // Only ASCII bytes were written
    Ok(String::from_utf8(out).unwrap_or_default())
}

/// Parse JSON text produced by [`to_ascii_string`] (or any JSON encoder).
pub fn from_str<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    serde_json::from_str(text)
}

/// Turn whatever the transport produced into a response payload.
///
/// The payload is left untyped because a batch reply is an array of
/// envelopes; failures are mapped to a single error envelope addressed to
/// `request_id`.
pub fn parse_response(request_id: &Value, reply: Result<TransportReply, TransportError>) -> Value {
    let failure = |err: ErrorObject| {
        serde_json::to_value(Response::error(request_id.clone(), err)).unwrap_or(Value::Null)
    };

    match reply {
        Err(TransportError::Aborted(msg)) => failure(ErrorObject::new(
            error_code::REQUEST_ABORTED,
            format!("Request aborted: {}", msg),
        )),
        Err(err) => failure(ErrorObject::new(error_code::SERVER_ERROR, err.to_string())),
        Ok(TransportReply::Parsed(Value::Null)) | Ok(TransportReply::Empty) => failure(
            ErrorObject::new(error_code::INTERNAL_ERROR, "Null response body received from server"),
        ),
        Ok(TransportReply::Parsed(value)) => value,
        Ok(TransportReply::Raw(text)) => match from_str::<Value>(&text) {
            Ok(value) => value,
            Err(_) => failure(ErrorObject::new(
                error_code::PARSE_ERROR,
                format!("Unable to parse response JSON: {}", text),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Request;
    use serde_json::json;

    #[test]
    fn test_escapes_non_ascii() {
        let req = Request::new("id1", "Echo.say", vec![json!("h\u{e9}llo \u{2603} \u{1f389}")]);
        let text = to_ascii_string(&req).unwrap();
        assert!(text.is_ascii());
        assert!(text.contains(r"h\u00e9llo \u2603 \ud83c\udf89"));
    }

    #[test]
    fn test_round_trip_preserves_envelope() {
        let req = Request::new("id2", "Echo.say", vec![json!({"name": "Zo\u{eb}", "n": 3})]);
        let text = to_ascii_string(&req).unwrap();
        let back: Request = from_str(&text).unwrap();
        assert_eq!(back, req);
        // Re-serialising yields the same bytes
        assert_eq!(to_ascii_string(&back).unwrap(), text);
    }

    #[test]
    fn test_control_characters_still_escaped() {
        let text = to_ascii_string(&json!("a\"b\n")).unwrap();
        assert_eq!(text, r#""a\"b\n""#);
    }

    #[test]
    fn test_parse_response_raw_garbage() {
        let v = parse_response(&json!("r1"), Ok(TransportReply::Raw("<html>".into())));
        assert_eq!(v["error"]["code"], json!(error_code::PARSE_ERROR));
        assert_eq!(v["id"], json!("r1"));
    }

    #[test]
    fn test_parse_response_transport_failures() {
        let v = parse_response(&json!("r1"), Err(TransportError::Failed("refused".into())));
        assert_eq!(v["error"]["code"], json!(error_code::SERVER_ERROR));

        let v = parse_response(&json!("r1"), Err(TransportError::Aborted("closed".into())));
        assert_eq!(v["error"]["code"], json!(error_code::REQUEST_ABORTED));

        let v = parse_response(&json!("r1"), Ok(TransportReply::Empty));
        assert_eq!(v["error"]["code"], json!(error_code::INTERNAL_ERROR));
    }
}
