//! Text splitting rules shared by both page templates.

use yadz_core::trim_page_text;

/// Split a heading like `"Herzl 12"` into street and house number.
///
/// The last space-separated token is the house number; the rest, joined back
/// with single spaces, is the street.
pub(crate) fn split_street_line(text: &str) -> (String, String) {
    let mut parts: Vec<&str> = trim_page_text(text).split(' ').collect();
    let house_num = parts.pop().unwrap_or_default().to_string();
    (parts.join(" "), house_num)
}

/// Take the city from a line like `"Tel Aviv District, Tel Aviv"`.
pub(crate) fn city_from_line(text: &str) -> String {
    trim_page_text(text).rsplit(", ").next().unwrap_or_default().to_string()
}
