use crate::model::RunIdentity;

pub const BUILD_ID_PREFIX: &str = "build:(id:";
pub const BUILD_ID_SUFFIX: &str = ")";
pub const ITEM_ID_PREFIX: &str = "id:";
pub const ITEM_ID_SUFFIX: &str = ",";

/// Decodes a composite occurrence id such as `id:1044,build:(id:90321)`.
///
/// Returns `None` when either marker pair is missing or its payload is not
/// a valid integer. Callers skip such occurrences.
pub fn decode(raw: &str) -> Option<RunIdentity> {
    let container_id = extract_id_prefixed(raw, BUILD_ID_PREFIX, BUILD_ID_SUFFIX)?;
    let item_id = extract_id_prefixed(raw, ITEM_ID_PREFIX, ITEM_ID_SUFFIX)?;

    Some(RunIdentity::new(container_id, item_id))
}

/// Parses the integer between the first `prefix` and the first `suffix`
/// that follows it.
pub fn extract_id_prefixed(raw: &str, prefix: &str, suffix: &str) -> Option<i32> {
    let start = raw.find(prefix)? + prefix.len();
    let rest = &raw[start..];
    let end = rest.find(suffix)?;

    rest[..end].parse().ok()
}
