//! Page annotation.
//!
//! Each address gets one `<div id="addr_info_<hash>">` inserted directly after
//! its anchor. The div first shows a loading placeholder and is rewritten in
//! place once a lookup result is available. Because the id is derived from the
//! address hash, repeated scans find and reuse the same node.

use dom_query::{Document, NodeId, Selection};
use yadz_core::{Address, LookupResult, address_hash, storage_key};

/// Placeholder shown while the lookup is in flight.
pub const LOADING_TEXT: &str = "Loading information...";

const WALKING: &str = "🚶";
const BIKING: &str = "🚴";
const FIBER_AVAILABLE: &str = "🛜";
const FIBER_UNAVAILABLE: &str = "📵";

const STYLE: &str = "margin-top: 5px; font-size: 14px; font-weight: normal; color: #333; \
                     background: #f8f8f8; padding: 5px; border-radius: 4px;";

/// Render the loading state for `address` unless it is already annotated.
///
/// Returns whether a new node was created.
pub fn show_loading(document: &Document, anchor: NodeId, address: &Address) -> bool {
    let id = storage_key(&address_hash(address));
    if find_annotation(document, &id).is_some() {
        return false;
    }

    let Some(node_id) = insert_annotation(document, anchor, &id) else {
        return false;
    };
    if let Some(node) = document.tree.get(&node_id) {
        node.set_text(LOADING_TEXT);
    }
    true
}

/// Render `result` for `address`, creating the node if needed and replacing
/// whatever it showed before.
pub fn show_result(document: &Document, anchor: NodeId, address: &Address, result: &LookupResult) {
    let id = storage_key(&address_hash(address));
    let node_id = match find_annotation(document, &id) {
        Some(existing) => existing,
        None => match insert_annotation(document, anchor, &id) {
            Some(created) => created,
            None => return,
        },
    };

    if let Some(node) = document.tree.get(&node_id) {
        Selection::from(node).set_html(render(result));
    }
}

/// Render `result` into the existing node for `address`.
///
/// Returns false when the page no longer holds that node, e.g. after the
/// document was replaced while the lookup was in flight.
pub fn update_annotation(document: &Document, address: &Address, result: &LookupResult) -> bool {
    let id = storage_key(&address_hash(address));
    let Some(node) = find_annotation(document, &id).and_then(|node_id| document.tree.get(&node_id)) else {
        return false;
    };
    Selection::from(node).set_html(render(result));
    true
}

/// Inner markup for a lookup result.
///
/// A line per available travel duration, then a fiber glyph when the FTTH
/// lookup succeeded and reported a status.
pub fn render(result: &LookupResult) -> String {
    let mut parts = Vec::new();

    if let Some(duration) = result.walking_duration() {
        parts.push(format!("{WALKING} {}<br>", escape_html(&duration)));
    }
    if let Some(duration) = result.biking_duration() {
        parts.push(format!("{BIKING} {}<br>", escape_html(&duration)));
    }
    if let Some(available) = result.ftth_available() {
        parts.push(if available { FIBER_AVAILABLE } else { FIBER_UNAVAILABLE }.to_string());
    }

    parts.concat()
}

fn find_annotation(document: &Document, id: &str) -> Option<NodeId> {
    document.select(&format!("#{id}")).nodes().first().map(|node| node.id)
}

fn insert_annotation(document: &Document, anchor: NodeId, id: &str) -> Option<NodeId> {
    let anchor = document.tree.get(&anchor)?;
    let div = document.tree.new_element("div");
    div.set_attr("id", id);
    div.set_attr("style", STYLE);
    anchor.insert_after(&div);
    Some(div.id)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HTML: &str = r#"<div class="item"><h1 class="heading_heading_a">Herzl 12</h1><p>details</p></div>"#;

    fn setup() -> (Document, NodeId, Address) {
        let doc = Document::from(HTML);
        let anchor = doc.select("h1").nodes()[0].id;
        (doc, anchor, Address::new("Tel Aviv", "Herzl", "12"))
    }

    fn full_result() -> LookupResult {
        LookupResult::new(json!({
            "travel_times": {"walking": {"duration": "25 mins"}, "biking": {"duration": "9 mins"}},
            "ftth": {"IsSuccessful": true, "Status": "available"}
        }))
    }

    #[test]
    fn test_loading_node_inserted_after_anchor() {
        let (doc, anchor, address) = setup();
        assert!(show_loading(&doc, anchor, &address));

        let next = doc.tree.get(&anchor).unwrap().next_sibling().unwrap();
        assert_eq!(next.attr("id").as_deref(), Some("addr_info_ehng0j"));
        assert_eq!(&*next.text(), LOADING_TEXT);
    }

    #[test]
    fn test_loading_is_idempotent() {
        let (doc, anchor, address) = setup();
        assert!(show_loading(&doc, anchor, &address));
        assert!(!show_loading(&doc, anchor, &address));
        assert_eq!(doc.select("#addr_info_ehng0j").length(), 1);
    }

    #[test]
    fn test_result_replaces_loading() {
        let (doc, anchor, address) = setup();
        show_loading(&doc, anchor, &address);
        show_result(&doc, anchor, &address, &full_result());

        let node = doc.select("#addr_info_ehng0j");
        assert_eq!(node.length(), 1);
        let text = node.text();
        assert!(text.contains("🚶 25 mins"));
        assert!(text.contains("🚴 9 mins"));
        assert!(text.contains("🛜"));
        assert!(!text.contains(LOADING_TEXT));
    }

    #[test]
    fn test_result_twice_keeps_one_node() {
        let (doc, anchor, address) = setup();
        show_result(&doc, anchor, &address, &full_result());
        show_result(&doc, anchor, &address, &full_result());

        assert_eq!(doc.select("div[id^='addr_info_']").length(), 1);
        assert_eq!(doc.select("#addr_info_ehng0j br").length(), 2);
    }

    #[test]
    fn test_loading_after_result_keeps_result() {
        let (doc, anchor, address) = setup();
        show_result(&doc, anchor, &address, &full_result());
        assert!(!show_loading(&doc, anchor, &address));

        assert!(doc.select("#addr_info_ehng0j").text().contains("25 mins"));
    }

    #[test]
    fn test_update_rewrites_loading_node() {
        let (doc, anchor, address) = setup();
        show_loading(&doc, anchor, &address);
        assert!(update_annotation(&doc, &address, &full_result()));

        let text = doc.select("#addr_info_ehng0j").text();
        assert!(text.contains("🚴 9 mins"));
        assert!(!text.contains(LOADING_TEXT));
    }

    #[test]
    fn test_update_without_node_is_noop() {
        let (doc, _, address) = setup();
        assert!(!update_annotation(&doc, &address, &full_result()));
        assert_eq!(doc.select("div[id^='addr_info_']").length(), 0);
    }

    #[test]
    fn test_equivalent_addresses_share_node() {
        let (doc, anchor, address) = setup();
        show_loading(&doc, anchor, &address);
        let noisy = Address::new(" TEL AVIV ", "herzl", "12");
        show_result(&doc, anchor, &noisy, &full_result());

        assert_eq!(doc.select("div[id^='addr_info_']").length(), 1);
    }

    #[test]
    fn test_render_unavailable_fiber() {
        let result = LookupResult::new(json!({"ftth": {"IsSuccessful": true, "Status": "unavailable"}}));
        assert_eq!(render(&result), FIBER_UNAVAILABLE);
    }

    #[test]
    fn test_render_partial_result() {
        let result = LookupResult::new(json!({
            "travel_times": {"walking": {"duration": "12 mins"}},
            "ftth": {"IsSuccessful": false, "Status": "available"}
        }));
        assert_eq!(render(&result), "🚶 12 mins<br>");
    }

    #[test]
    fn test_render_escapes_remote_text() {
        let result = LookupResult::new(json!({"travel_times": {"walking": {"duration": "<b>5</b>"}}}));
        assert_eq!(render(&result), "🚶 &lt;b&gt;5&lt;/b&gt;<br>");
    }

    #[test]
    fn test_node_carries_style() {
        let (doc, anchor, address) = setup();
        show_loading(&doc, anchor, &address);
        let style = doc.select("#addr_info_ehng0j").attr("style").unwrap();
        assert!(style.contains("border-radius: 4px"));
    }
}
