use serde_json::Value;

use super::ProxyError;

/// Return the payload stored under `field`.
///
/// The article and event APIs serialize their payload into a JSON string; a
/// string is parsed once more, an object is returned as-is, anything else is
/// an upstream format error.
pub fn unwrap_double_encoded(mut upstream: Value, field: &str) -> Result<Value, ProxyError> {
    match upstream.get_mut(field).map(Value::take) {
        Some(Value::String(raw)) => serde_json::from_str(&raw).map_err(|e| {
            ProxyError::UpstreamParse(format!(
                "Failed to parse {field} data from upstream API: {e}"
            ))
        }),
        Some(inner @ Value::Object(_)) => Ok(inner),
        _ => Err(ProxyError::UpstreamParse(
            "Unexpected data format received from upstream API".into(),
        )),
    }
}
