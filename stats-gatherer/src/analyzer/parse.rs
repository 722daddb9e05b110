//! Lenient parsing of registry values. Missing or blank text is a legitimate "zero" or
//! "off"; anything unparsable degrades the same way with a warning.

pub(crate) const DEFAULT_LOAD_LEVEL: i64 = 1;

pub(crate) fn parse_counter(path: &str, raw: Option<&str>) -> i64 {
    parse_number(path, raw).unwrap_or(0)
}

/// Load weight of one shard. Negative weights are malformed since load only ever grows.
pub(crate) fn parse_load_level(path: &str, raw: Option<&str>) -> i64 {
    match parse_number(path, raw) {
        Some(value) if value < 0 => {
            warn!(path, value, "negative load level in registry");
            DEFAULT_LOAD_LEVEL
        }
        Some(value) => value,
        None => DEFAULT_LOAD_LEVEL,
    }
}

fn parse_number(path: &str, raw: Option<&str>) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty())?;
    match raw.parse::<i64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path, value = raw, %e, "malformed number in registry");
            None
        }
    }
}

pub(crate) fn parse_enabled(path: &str, raw: Option<&str>) -> bool {
    match raw.map(str::trim) {
        None | Some("") => false,
        Some(value) if value.eq_ignore_ascii_case("true") => true,
        Some(value) if value.eq_ignore_ascii_case("false") => false,
        Some(value) => {
            warn!(path, value, "malformed boolean in registry");
            false
        }
    }
}

/// Number of shard items in a comma separated sharding value such as `0,1,5`.
///
/// Every token counts except trailing empty ones, so `,0` is two items and `0,1,` is two.
pub(crate) fn count_shards(sharding: &str) -> i64 {
    let sharding = sharding.trim_end_matches(',');
    if sharding.is_empty() {
        0
    } else {
        sharding.split(',').count() as i64
    }
}
