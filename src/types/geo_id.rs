use std::{collections::HashSet, fmt, sync::Arc};

use ahash::RandomState;
use serde::{Serialize, Serializer};

use super::geo_type::GeographyScale;

/// Set of requested identifiers; empty means "match all".
pub type IdSet = HashSet<NormalizedId, RandomState>;

/// Canonical digit-only identifier of a geographic unit.
/// Keeps the zero-padded text but avoids repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedId(Arc<str>); // e.g., "20601110101" for an SA1, "206011101" for a DZN

impl NormalizedId {
    /// Strip every non-digit character from `raw` and apply the scale's
    /// canonical padding. Inputs without any digit produce the empty id,
    /// which callers treat as unmatched.
    pub fn normalize(raw: &str, scale: GeographyScale) -> Self {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

        let id = match scale.id_width() {
            Some(width) if !digits.is_empty() && digits.len() < width => format!("{digits:0>width$}"),
            _ => digits,
        };

        Self(Arc::from(id))
    }

    /// Get the identifier text.
    #[inline] pub fn as_str(&self) -> &str { &self.0 }

    /// True when the raw input had no digits; never a valid join key.
    #[inline] pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Display for NormalizedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for NormalizedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{GeographyScale, NormalizedId};

    #[test]
    fn sa1_pads_to_eleven_digits() {
        let id = NormalizedId::normalize("2060111", GeographyScale::Sa1);
        assert_eq!(id.as_str(), "00002060111");
        assert_eq!(id.as_str().len(), 11);
    }

    #[test]
    fn sa1_normalization_is_idempotent() {
        for raw in ["20601110101", "SA1 206-011-101", "7", " 2 0 6 "] {
            let once = NormalizedId::normalize(raw, GeographyScale::Sa1);
            let twice = NormalizedId::normalize(once.as_str(), GeographyScale::Sa1);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn other_scales_keep_extracted_digits() {
        assert_eq!(NormalizedId::normalize("DZN 2060-1", GeographyScale::DestinationZone).as_str(), "20601");
        assert_eq!(NormalizedId::normalize("20601110000.0", GeographyScale::MeshBlock).as_str(), "206011100000");
    }

    #[test]
    fn no_digits_is_unmatched() {
        for scale in GeographyScale::detection_order() {
            assert!(NormalizedId::normalize("n/a", scale).is_empty());
            assert!(NormalizedId::normalize("", scale).is_empty());
        }
    }

    #[test]
    fn longer_sa1_ids_are_not_truncated() {
        assert_eq!(NormalizedId::normalize("123456789012", GeographyScale::Sa1).as_str(), "123456789012");
    }
}
