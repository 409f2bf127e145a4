//! Label/code mapping for categorical columns.
//!
//! The order labels were first seen during `fit` defines the code space, so a
//! fitted encoder is fully described by its label list and round-trips through
//! serde unchanged. The pipeline keeps two independent instances: one for
//! event types (saved alongside the models) and one for compass directions
//! (internal to training).

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Maps category labels to dense integer codes in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    labels: Vec<String>,
}

impl CategoryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the vocabulary from a label sequence. Repeated calls refit from
    /// scratch; duplicates keep their first position.
    pub fn fit<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.labels.clear();
        for label in labels {
            let label = label.as_ref();
            if !self.labels.iter().any(|known| known == label) {
                self.labels.push(label.to_string());
            }
        }
    }

    /// Code for a label seen during fit.
    pub fn encode(&self, label: &str) -> Result<usize, ModelError> {
        self.labels
            .iter()
            .position(|known| known == label)
            .ok_or_else(|| ModelError::UnknownCategory(label.to_string()))
    }

    /// Label for a code produced by `encode`.
    pub fn decode(&self, code: usize) -> Result<&str, ModelError> {
        self.labels
            .get(code)
            .map(String::as_str)
            .ok_or(ModelError::CodeOutOfRange {
                code,
                len: self.labels.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Known labels in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_first_seen_order() {
        let mut enc = CategoryEncoder::new();
        enc.fit(["Hail", "Tornado", "Hail", "Flood", "Tornado"]);

        assert_eq!(enc.len(), 3);
        assert_eq!(enc.encode("Hail").unwrap(), 0);
        assert_eq!(enc.encode("Tornado").unwrap(), 1);
        assert_eq!(enc.encode("Flood").unwrap(), 2);
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut enc = CategoryEncoder::new();
        enc.fit(["Thunderstorm Wind", "Hail"]);

        for label in ["Thunderstorm Wind", "Hail"] {
            let code = enc.encode(label).unwrap();
            assert_eq!(enc.decode(code).unwrap(), label);
        }
    }

    #[test]
    fn unknown_label_is_an_error() {
        let mut enc = CategoryEncoder::new();
        enc.fit(["Hail"]);

        match enc.encode("Blizzard") {
            Err(ModelError::UnknownCategory(label)) => assert_eq!(label, "Blizzard"),
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_code_is_an_error() {
        let mut enc = CategoryEncoder::new();
        enc.fit(["Hail", "Flood"]);

        match enc.decode(5) {
            Err(ModelError::CodeOutOfRange { code, len }) => {
                assert_eq!(code, 5);
                assert_eq!(len, 2);
            }
            other => panic!("expected CodeOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn serde_round_trip_preserves_vocabulary() {
        let mut enc = CategoryEncoder::new();
        enc.fit(["Flash Flood", "Lightning", "Hail"]);

        let json = serde_json::to_string(&enc).unwrap();
        let back: CategoryEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, enc);
        assert_eq!(back.encode("Lightning").unwrap(), 1);
    }
}
