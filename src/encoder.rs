//! Categorical label encoding.
//!
//! The codes below were frozen when the model was trained and must never be
//! renumbered. Each table is listed in the order a front-end shows its options,
//! which is not always code order.

use crate::error::{PredictError, Result};
use serde::Deserialize;
use tracing::warn;

/// Code used for a label that is not in its table.
pub const SENTINEL_CODE: i32 = -1;

/// Town labels and codes (26).
pub const TOWNS: [(&str, i32); 26] = [
    ("ANG MO KIO", 0),
    ("BEDOK", 1),
    ("BISHAN", 2),
    ("BUKIT BATOK", 3),
    ("BUKIT MERAH", 4),
    ("BUKIT PANJANG", 5),
    ("BUKIT TIMAH", 6),
    ("CENTRAL AREA", 7),
    ("CHOA CHU KANG", 8),
    ("CLEMENTI", 9),
    ("GEYLANG", 10),
    ("HOUGANG", 11),
    ("JURONG EAST", 12),
    ("JURONG WEST", 13),
    ("KALLANG/WHAMPOA", 14),
    ("MARINE PARADE", 15),
    ("PASIR RIS", 16),
    ("PUNGGOL", 17),
    ("QUEENSTOWN", 18),
    ("SEMBAWANG", 19),
    ("SENGKANG", 20),
    ("SERANGOON", 21),
    ("TAMPINES", 22),
    ("TOA PAYOH", 23),
    ("WOODLANDS", 24),
    ("YISHUN", 25),
];

/// Flat type labels and codes (7).
pub const FLAT_TYPES: [(&str, i32); 7] = [
    ("3 ROOM", 2),
    ("4 ROOM", 3),
    ("5 ROOM", 4),
    ("2 ROOM", 1),
    ("EXECUTIVE", 5),
    ("1 ROOM", 0),
    ("MULTI-GENERATION", 6),
];

/// Flat model labels and codes (21).
pub const FLAT_MODELS: [(&str, i32); 21] = [
    ("Improved", 5),
    ("New Generation", 12),
    ("Model A", 8),
    ("Standard", 17),
    ("Simplified", 16),
    ("Premium Apartment", 13),
    ("Maisonette", 7),
    ("Apartment", 3),
    ("Model A2", 10),
    ("Type S1", 19),
    ("Type S2", 20),
    ("Adjoined flat", 2),
    ("Terrace", 18),
    ("DBSS", 4),
    ("Model A-Maisonette", 9),
    ("Premium Maisonette", 15),
    ("Multi Generation", 11),
    ("Premium Apartment Loft", 14),
    ("Improved-Maisonette", 6),
    ("2-room", 0),
    ("3Gen", 1),
];

/// The three categorical request fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalField {
    Town,
    FlatType,
    FlatModel,
}

impl CategoricalField {
    /// Request field name
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Town => "town",
            CategoricalField::FlatType => "flat_type",
            CategoricalField::FlatModel => "flat_model",
        }
    }

    /// Lookup table for this field
    pub fn table(&self) -> &'static [(&'static str, i32)] {
        match self {
            CategoricalField::Town => &TOWNS,
            CategoricalField::FlatType => &FLAT_TYPES,
            CategoricalField::FlatModel => &FLAT_MODELS,
        }
    }

    /// Look up a label. Matching is exact: no case folding, no trimming.
    pub fn code(&self, label: &str) -> Result<i32> {
        self.table()
            .iter()
            .find(|(known, _)| *known == label)
            .map(|&(_, code)| code)
            .ok_or_else(|| PredictError::UnknownLabel {
                field: self.name(),
                label: label.to_string(),
            })
    }

    /// Labels in display order
    pub fn labels(&self) -> Vec<&'static str> {
        self.table().iter().map(|&(label, _)| label).collect()
    }
}

/// Encode a town label.
pub fn town_code(label: &str) -> Result<i32> {
    CategoricalField::Town.code(label)
}

/// Encode a flat type label.
pub fn flat_type_code(label: &str) -> Result<i32> {
    CategoricalField::FlatType.code(label)
}

/// Encode a flat model label.
pub fn flat_model_code(label: &str) -> Result<i32> {
    CategoricalField::FlatModel.code(label)
}

/// Collapse a lookup result to the sentinel convention: known code or `-1`.
pub fn encode_or_sentinel(result: Result<i32>) -> i32 {
    result.unwrap_or(SENTINEL_CODE)
}

/// What to do with a label that has no code.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownLabelPolicy {
    /// Encode as `-1` and keep going. The model never saw `-1` during
    /// training, so the resulting price is unreliable.
    #[default]
    Sentinel,
    /// Fail the request with [`PredictError::UnknownLabel`].
    Reject,
}

/// Applies an [`UnknownLabelPolicy`] to categorical lookups.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryEncoder {
    policy: UnknownLabelPolicy,
}

impl CategoryEncoder {
    /// Create an encoder with the given unknown-label policy.
    pub fn new(policy: UnknownLabelPolicy) -> Self {
        Self { policy }
    }

    /// The active policy
    pub fn policy(&self) -> UnknownLabelPolicy {
        self.policy
    }

    /// Encode a label for `field` under the active policy.
    pub fn encode(&self, field: CategoricalField, label: &str) -> Result<i32> {
        match (field.code(label), self.policy) {
            (Ok(code), _) => Ok(code),
            (Err(_), UnknownLabelPolicy::Sentinel) => {
                warn!(
                    field = field.name(),
                    label = %label,
                    "Unknown label, encoding as sentinel"
                );
                Ok(SENTINEL_CODE)
            }
            (Err(e), UnknownLabelPolicy::Reject) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_town_codes_follow_table_order() {
        for (i, (label, code)) in TOWNS.iter().enumerate() {
            assert_eq!(*code, i as i32);
            assert_eq!(town_code(label), Ok(*code));
        }
        assert_eq!(town_code("BISHAN"), Ok(2));
        assert_eq!(town_code("KALLANG/WHAMPOA"), Ok(14));
    }

    #[test]
    fn test_flat_type_codes() {
        assert_eq!(flat_type_code("1 ROOM"), Ok(0));
        assert_eq!(flat_type_code("2 ROOM"), Ok(1));
        assert_eq!(flat_type_code("3 ROOM"), Ok(2));
        assert_eq!(flat_type_code("4 ROOM"), Ok(3));
        assert_eq!(flat_type_code("5 ROOM"), Ok(4));
        assert_eq!(flat_type_code("EXECUTIVE"), Ok(5));
        assert_eq!(flat_type_code("MULTI-GENERATION"), Ok(6));
    }

    #[test]
    fn test_flat_model_codes() {
        let expected = [
            ("2-room", 0),
            ("3Gen", 1),
            ("Adjoined flat", 2),
            ("Apartment", 3),
            ("DBSS", 4),
            ("Improved", 5),
            ("Improved-Maisonette", 6),
            ("Maisonette", 7),
            ("Model A", 8),
            ("Model A-Maisonette", 9),
            ("Model A2", 10),
            ("Multi Generation", 11),
            ("New Generation", 12),
            ("Premium Apartment", 13),
            ("Premium Apartment Loft", 14),
            ("Premium Maisonette", 15),
            ("Simplified", 16),
            ("Standard", 17),
            ("Terrace", 18),
            ("Type S1", 19),
            ("Type S2", 20),
        ];
        for (label, code) in expected {
            assert_eq!(flat_model_code(label), Ok(code), "{label}");
        }
    }

    #[test]
    fn test_codes_are_unique_per_table() {
        for field in [
            CategoricalField::Town,
            CategoricalField::FlatType,
            CategoricalField::FlatModel,
        ] {
            let mut codes: Vec<i32> = field.table().iter().map(|&(_, c)| c).collect();
            codes.sort();
            let expected: Vec<i32> = (0..field.table().len() as i32).collect();
            assert_eq!(codes, expected, "{}", field.name());
        }
    }

    #[test]
    fn test_unknown_labels() {
        assert!(matches!(
            town_code("ATLANTIS"),
            Err(PredictError::UnknownLabel { field: "town", .. })
        ));
        // exact match only
        assert!(town_code("bishan").is_err());
        assert!(town_code(" BISHAN").is_err());
        assert!(flat_type_code("4-ROOM").is_err());
        assert!(flat_model_code("model a").is_err());
        assert!(flat_model_code("").is_err());

        assert_eq!(encode_or_sentinel(town_code("ATLANTIS")), SENTINEL_CODE);
        assert_eq!(encode_or_sentinel(flat_type_code("9 ROOM")), -1);
        assert_eq!(encode_or_sentinel(flat_model_code("Model A")), 8);
    }

    #[test]
    fn test_sentinel_policy() {
        let encoder = CategoryEncoder::default();
        assert_eq!(encoder.policy(), UnknownLabelPolicy::Sentinel);
        assert_eq!(encoder.encode(CategoricalField::Town, "BEDOK"), Ok(1));
        assert_eq!(encoder.encode(CategoricalField::Town, "NOWHERE"), Ok(-1));
    }

    #[test]
    fn test_reject_policy() {
        let encoder = CategoryEncoder::new(UnknownLabelPolicy::Reject);
        assert_eq!(encoder.encode(CategoricalField::FlatModel, "DBSS"), Ok(4));
        assert_eq!(
            encoder.encode(CategoricalField::FlatModel, "Igloo"),
            Err(PredictError::UnknownLabel {
                field: "flat_model",
                label: "Igloo".to_string(),
            })
        );
    }

    #[test]
    fn test_labels_in_display_order() {
        let flat_types = CategoricalField::FlatType.labels();
        assert_eq!(flat_types.len(), 7);
        assert_eq!(flat_types[0], "3 ROOM");
        assert_eq!(CategoricalField::Town.labels().len(), 26);
        assert_eq!(CategoricalField::FlatModel.labels().len(), 21);
    }
}
