//! JSON helpers for message bodies.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RuntimeResult;

/// Subject on which services answer health checks.
pub const HEALTH_SUBJECT: &str = "__telestion__.health";

/// Body of a health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Number of errors the service has encountered.
    pub errors: u32,
    /// Name of the responding service.
    pub name: String,
}

impl HealthReport {
    /// A report for a healthy service.
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            errors: 0,
            name: name.into(),
        }
    }
}

/// Encodes a message body as JSON bytes.
pub fn json_encode<T: Serialize + ?Sized>(msg: &T) -> RuntimeResult<Vec<u8>> {
    Ok(serde_json::to_vec(msg)?)
}

/// Decodes a JSON message body.
pub fn json_decode<T: DeserializeOwned>(msg: impl AsRef<[u8]>) -> RuntimeResult<T> {
    Ok(serde_json::from_slice(msg.as_ref())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;

    #[test]
    fn test_health_report_wire_format() {
        let bytes = json_encode(&HealthReport::healthy("svc")).unwrap();
        assert_eq!(bytes, br#"{"errors":0,"name":"svc"}"#);

        let report: HealthReport = json_decode(&bytes).unwrap();
        assert_eq!(report.name, "svc");
    }

    #[test]
    fn test_decode_invalid_json() {
        let result: RuntimeResult<HealthReport> = json_decode("not json");
        assert!(matches!(result, Err(RuntimeError::Codec(_))));
    }
}
