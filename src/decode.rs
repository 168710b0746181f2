//! Search response decoder.
//!
//! The search endpoint answers with a MessagePack body whose layout is not
//! pinned down by the service. Shapes seen in practice:
//!
//! ```text
//! {"results": [hit, ...]}        envelope
//! [hit, ...]                     bare sequence
//!
//! hit = {"id": "7", "score": 0.9}        mapping (id | label, score | distance)
//!     | [0.12, 7, ...]                   positional: score, id, ignored...
//! ```
//!
//! Each step is total. A body that is not exactly one MessagePack value, or
//! that fits neither top-level shape, is a [`EndeeError::Decode`]; a single hit without a usable id becomes
//! [`DecodedHit::Unparsed`] so the caller can still show it.

use rmpv::Value;

use crate::error::EndeeError;
use crate::models::SearchHit;

const RESERVED_MARKER: u8 = 0xc1;

/// One element of the hit sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedHit {
    Resolved(SearchHit),
    /// The raw element, kept for display.
    Unparsed(Value),
}

/// Decode a raw search response body into hits, in server order.
pub fn decode_response(body: &[u8]) -> Result<Vec<DecodedHit>, EndeeError> {
    let decode_error = |reason: String| EndeeError::Decode {
        payload_len: body.len(),
        reason,
    };

    // 0xc1 is a reserved marker that rmpv reads back as nil.
    if body.first() == Some(&RESERVED_MARKER) {
        return Err(decode_error("reserved MessagePack marker 0xc1".to_string()));
    }

    let mut reader = body;
    let value = rmpv::decode::read_value(&mut reader)
        .map_err(|e| decode_error(format!("invalid MessagePack: {}", e)))?;
    if !reader.is_empty() {
        return Err(decode_error(format!(
            "{} trailing bytes after the first value",
            reader.len()
        )));
    }

    let hits = hit_sequence(value).map_err(decode_error)?;
    Ok(hits.into_iter().map(decode_hit).collect())
}

/// Pick the hit sequence out of the top-level value.
fn hit_sequence(value: Value) -> Result<Vec<Value>, String> {
    match value {
        Value::Map(entries) => {
            let results = entries
                .into_iter()
                .find(|(key, _)| key.as_str() == Some("results"))
                .map(|(_, v)| v);
            match results {
                Some(Value::Array(hits)) => Ok(hits),
                Some(Value::Nil) => Ok(Vec::new()),
                Some(other) => Err(format!("'results' is not a sequence: {}", other)),
                None => Err("mapping without a 'results' key".to_string()),
            }
        }
        Value::Array(hits) => Ok(hits),
        Value::Nil => Ok(Vec::new()),
        other => Err(format!("unexpected top-level value: {}", other)),
    }
}

/// Resolve one hit, trying the mapping form before the positional form.
pub fn decode_hit(value: Value) -> DecodedHit {
    let resolved = match &value {
        Value::Map(entries) => hit_from_map(entries),
        Value::Array(items) => hit_from_positional(items),
        _ => None,
    };

    match resolved {
        Some(hit) => {
            tracing::debug!(id = %hit.id, score = ?hit.score, raw = %value, "decoded search hit");
            DecodedHit::Resolved(hit)
        }
        None => {
            tracing::warn!(raw = %value, "unrecognized search hit shape");
            DecodedHit::Unparsed(value)
        }
    }
}

fn hit_from_map(entries: &[(Value, Value)]) -> Option<SearchHit> {
    let field = |name: &str| {
        entries
            .iter()
            .find(|(key, _)| key.as_str() == Some(name))
            .map(|(_, v)| v)
    };

    let id = field("id")
        .and_then(id_string)
        .or_else(|| field("label").and_then(id_string))?;
    let score = field("score")
        .and_then(Value::as_f64)
        .or_else(|| field("distance").and_then(Value::as_f64));

    Some(SearchHit { id, score })
}

fn hit_from_positional(items: &[Value]) -> Option<SearchHit> {
    let id = items.get(1).and_then(id_string)?;
    let score = items.first().and_then(Value::as_f64);
    Some(SearchHit { id, score })
}

/// Render an identifier value as the string key used by the id map.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => s.as_str().map(str::to_string).filter(|s| !s.is_empty()),
        Value::Integer(n) => Some(n.to_string()),
        Value::Binary(bytes) => std::str::from_utf8(bytes)
            .ok()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Value::F32(_) | Value::F64(_) => {
            let f = value.as_f64()?;
            (f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64).then(|| (f as u64).to_string())
        }
        _ => None,
    }
}
