//! Header-based detection of geography scale and identifier columns.

use crate::types::GeographyScale;

/// Infer the geography scale of a table from its column names.
///
/// Candidates are compared case-insensitively, destination zones first, then
/// mesh blocks, then SA1. Returns `None` when no header is recognised. The
/// result is advisory; it never overrides an explicitly requested scale.
pub fn detect_scale<S: AsRef<str>>(columns: &[S]) -> Option<GeographyScale> {
    let lowered = columns.iter()
        .map(|c| c.as_ref().trim().to_ascii_lowercase())
        .collect::<Vec<_>>();

    GeographyScale::detection_order().into_iter()
        .find(|scale| scale.header_candidates().iter()
            .any(|candidate| lowered.iter().any(|c| c == candidate)))
}

/// Find the identifier column for `scale` in a table header.
///
/// Exact candidate names are tried in priority order, then any column whose
/// lower-cased name contains the scale's hint (`sa1`, `mb_code`, `dzn`).
pub fn detect_id_column<S: AsRef<str>>(columns: &[S], scale: GeographyScale) -> Option<usize> {
    scale.table_id_candidates().iter()
        .find_map(|candidate| columns.iter().position(|c| c.as_ref().trim() == *candidate))
        .or_else(|| columns.iter()
            .position(|c| c.as_ref().to_ascii_lowercase().contains(scale.field_hint())))
}

/// Find the identifier field for `scale` among a boundary dataset's declared fields.
pub fn detect_key_field<S: AsRef<str>>(fields: &[S], scale: GeographyScale) -> Option<String> {
    scale.boundary_key_candidates().iter()
        .find(|candidate| fields.iter().any(|f| f.as_ref() == **candidate))
        .map(|candidate| candidate.to_string())
        .or_else(|| fields.iter()
            .map(AsRef::as_ref)
            .find(|f| f.to_ascii_lowercase().contains(scale.field_hint()))
            .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_zone_wins_over_other_scales() {
        let header = ["SA1_CODE21", "DZN_21", "Mining"];
        assert_eq!(detect_scale(&header), Some(GeographyScale::DestinationZone));
    }

    #[test]
    fn detection_is_case_insensitive() {
        assert_eq!(detect_scale(&["mb_code21", "Persons"]), Some(GeographyScale::MeshBlock));
        assert_eq!(detect_scale(&["Sa1 (UR)", "Persons"]), Some(GeographyScale::Sa1));
    }

    #[test]
    fn unknown_header_is_undetermined() {
        assert_eq!(detect_scale(&["LGA_CODE", "Persons"]), None);
        assert_eq!(detect_scale::<&str>(&[]), None);
    }

    #[test]
    fn id_column_prefers_exact_candidates() {
        let header = ["sa1_other", "SA1 (UR)", "Persons"];
        assert_eq!(detect_id_column(&header, GeographyScale::Sa1), Some(1));
    }

    #[test]
    fn id_column_falls_back_to_substring() {
        assert_eq!(detect_id_column(&["Zone", "my_dzn_id"], GeographyScale::DestinationZone), Some(1));
        assert_eq!(detect_id_column(&["DZN_21", "Mining"], GeographyScale::Sa1), None);
    }

    #[test]
    fn key_field_candidates_then_hint() {
        let fields = ["OBJECTID", "DZN_CODE21", "DZN_21"];
        assert_eq!(detect_key_field(&fields, GeographyScale::DestinationZone).as_deref(), Some("DZN_21"));
        assert_eq!(detect_key_field(&["OBJECTID", "dzn_code11"], GeographyScale::DestinationZone).as_deref(), Some("dzn_code11"));
        assert_eq!(detect_key_field(&["OBJECTID", "NAME"], GeographyScale::MeshBlock), None);
    }
}
