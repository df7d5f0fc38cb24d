//! Stage result types
//!
//! A stage reports its outputs as ordered key/value pairs. They are written
//! by the workload into a plain-text result file and published onto the pod
//! as a single JSON annotation.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One stage output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Encodes results into the annotation value format
pub fn encode_results(values: &[KeyValue]) -> serde_json::Result<String> {
    serde_json::to_string(values)
}

/// Decodes an annotation value back into results
pub fn decode_results(raw: &str) -> serde_json::Result<Vec<KeyValue>> {
    serde_json::from_str(raw)
}

/// Parses a result file written by a workload container.
///
/// Each line holds one `key:value` pair. Blank lines are ignored and
/// malformed lines are skipped with a warning.
pub fn parse_results(text: &str) -> Vec<KeyValue> {
    let mut values = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            warn!("Skipping malformed result line {}: '{}'", idx + 1, line);
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            warn!("Skipping result line {} with empty key", idx + 1);
            continue;
        }

        merge_results(&mut values, vec![KeyValue::new(key, value.trim())]);
    }

    values
}

/// Merges `incoming` into `values`.
///
/// A key already present keeps its position and takes the new value; new
/// keys are appended in order.
pub fn merge_results(values: &mut Vec<KeyValue>, incoming: Vec<KeyValue>) {
    for kv in incoming {
        match values.iter_mut().find(|existing| existing.key == kv.key) {
            Some(existing) => existing.value = kv.value,
            None => values.push(kv),
        }
    }
}
