//! Coordinate extraction from free text

use regex::Regex;
use std::sync::LazyLock;

static COORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+),\s*(\d+\.\d+)").unwrap());

/// Last `lon,lat` pair in `text`, normalized to `"lon,lat"`
pub fn last_coordinate(text: &str) -> Option<String> {
    COORD_RE
        .captures_iter(text)
        .last()
        .map(|caps| format!("{},{}", &caps[1], &caps[2]))
}
