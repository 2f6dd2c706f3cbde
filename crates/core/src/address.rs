//! Postal address model and address hashing.
//!
//! The address hash doubles as the cache key and the id of the annotation
//! node rendered next to the address on the page, so it must stay identical
//! to the one produced by the browser overlay: a 32-bit rolling hash over the
//! UTF-16 code units of the normalized address, base-36 encoded.

use serde::{Deserialize, Serialize};

/// Prefix shared by storage keys and annotation node ids.
pub const KEY_PREFIX: &str = "addr_info_";

/// A postal address scraped from a listing page.
///
/// Serializes to the lookup request body (`{"city","street","houseNum"}`).
/// `==` is exact; use [`Address::same_place`] for cache equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub street: String,
    #[serde(rename = "houseNum")]
    pub house_num: String,
}

impl Address {
    pub fn new(city: impl Into<String>, street: impl Into<String>, house_num: impl Into<String>) -> Self {
        Self { city: city.into(), street: street.into(), house_num: house_num.into() }
    }

    /// All three components are present.
    pub fn is_complete(&self) -> bool {
        !self.city.is_empty() && !self.street.is_empty() && !self.house_num.is_empty()
    }

    /// Compare two addresses the way the cache does: case-folded and trimmed.
    pub fn same_place(&self, other: &Address) -> bool {
        normalized_key(self) == normalized_key(other)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}, {}", self.street, self.house_num, self.city)
    }
}

/// Whitespace as browsers trim it: Unicode `White_Space` without U+0085, plus
/// the byte order mark U+FEFF.
pub fn is_page_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

/// Trim `text` the way page scripts do, see [`is_page_whitespace`].
pub fn trim_page_text(text: &str) -> &str {
    text.trim_matches(is_page_whitespace)
}

fn normalize(component: &str) -> String {
    trim_page_text(&component.to_lowercase()).to_string()
}

fn normalized_key(address: &Address) -> String {
    format!(
        "{}_{}_{}",
        normalize(&address.street),
        normalize(&address.house_num),
        normalize(&address.city)
    )
}

/// Compute the address hash.
///
/// `h = ((h << 5) - h) + unit` per UTF-16 code unit with 32-bit wraparound at
/// every step, then `|h|` in base 36. Collisions are accepted.
pub fn address_hash(address: &Address) -> String {
    let mut hash: i32 = 0;
    for unit in normalized_key(address).encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    to_base36(hash.unsigned_abs())
}

/// Storage key and DOM id for an address hash.
pub fn storage_key(hash: &str) -> String {
    format!("{KEY_PREFIX}{hash}")
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_known_values() {
        assert_eq!(address_hash(&Address::new("", "a", "")), "229t");
        assert_eq!(address_hash(&Address::new("Tel Aviv", "Herzl", "12")), "ehng0j");
        assert_eq!(address_hash(&Address::new("Tel Aviv", "Dizengoff", "50")), "4xvthu");
    }

    #[test]
    fn test_hash_non_latin_wraps() {
        assert_eq!(address_hash(&Address::new("תל אביב", "הרצל", "12")), "2ica2m");
    }

    #[test]
    fn test_hash_ignores_case_and_whitespace() {
        let plain = Address::new("Tel Aviv", "Herzl", "12");
        let noisy = Address::new(" tel aviv", "  HERZL ", "12 ");
        assert_eq!(address_hash(&plain), address_hash(&noisy));
        assert!(plain.same_place(&noisy));
    }

    #[test]
    fn test_hash_trims_byte_order_mark() {
        let address = Address::new("Tel Aviv", "\u{feff}herzl", "12");
        assert_eq!(address_hash(&address), "ehng0j");
    }

    #[test]
    fn test_hash_keeps_next_line_char() {
        let address = Address::new("Tel Aviv", "\u{85}Herzl", "12");
        assert_ne!(address_hash(&address), "ehng0j");
    }

    #[test]
    fn test_trim_page_text() {
        assert_eq!(trim_page_text("\u{feff}\u{a0} Herzl\u{3000}\n"), "Herzl");
        assert_eq!(trim_page_text("\u{85}Herzl"), "\u{85}Herzl");
    }

    #[test]
    fn test_hash_stability() {
        let address = Address::new("Haifa", "Herzl", "3");
        assert_eq!(address_hash(&address), address_hash(&address.clone()));
    }

    #[test]
    fn test_hash_distinguishes_fields() {
        let a = Address::new("Haifa", "Herzl", "3");
        let b = Address::new("Haifa", "Herzl", "4");
        assert_ne!(address_hash(&a), address_hash(&b));
        assert!(!a.same_place(&b));
    }

    #[test]
    fn test_hash_format() {
        let hash = address_hash(&Address::new("Tel Aviv", "Ben Yehuda", "101"));
        assert!(!hash.is_empty());
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_base36_edges() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(i32::MIN.unsigned_abs()), "zik0zk");
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("ehng0j"), "addr_info_ehng0j");
    }

    #[test]
    fn test_is_complete() {
        assert!(Address::new("Haifa", "Herzl", "3").is_complete());
        assert!(!Address::new("", "Herzl", "3").is_complete());
        assert!(!Address::new("Haifa", "Herzl", "").is_complete());
    }

    #[test]
    fn test_request_body_shape() {
        let json = serde_json::to_value(Address::new("Tel Aviv", "Herzl", "12")).unwrap();
        assert_eq!(json, serde_json::json!({"city": "Tel Aviv", "street": "Herzl", "houseNum": "12"}));
    }
}
