//! Regex scan over raw markup.
//!
//! Only `button`, `input`, `textarea` and `select` tags are recognised. Nested
//! and unusual tag shapes are missed; this path is a fallback for callers
//! without a live page, not a parser.

use std::sync::LazyLock;

use regex::Regex;
use sigcache_core::ElementDescriptor;

static BUTTON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<button\b([^>]*)>(.*?)</button\s*>").expect("button pattern compiles"));

static CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(input|textarea|select)\b([^>]*)>").expect("control pattern compiles"));

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/=`]+)))?"#)
        .expect("attribute pattern compiles")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern compiles"));

/// Extract control descriptors from markup in document order.
pub fn extract_from_markup(html: &str) -> Vec<ElementDescriptor> {
    let mut found: Vec<(usize, ElementDescriptor)> = Vec::new();

    for caps in BUTTON_RE.captures_iter(html) {
        let (Some(whole), Some(attrs)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let text = caps.get(2).map(|m| TAG_RE.replace_all(m.as_str(), " ")).unwrap_or_default();
        let el = with_attributes(ElementDescriptor::new("button"), attrs.as_str()).with_text(&text);
        found.push((whole.start(), el));
    }

    for caps in CONTROL_RE.captures_iter(html) {
        let (Some(whole), Some(tag), Some(attrs)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        found.push((whole.start(), with_attributes(ElementDescriptor::new(tag.as_str()), attrs.as_str())));
    }

    found.sort_by_key(|(offset, _)| *offset);
    found
        .into_iter()
        .enumerate()
        .map(|(i, (_, el))| el.with_position(u32::try_from(i).unwrap_or(u32::MAX)))
        .collect()
}

fn with_attributes(mut el: ElementDescriptor, raw: &str) -> ElementDescriptor {
    for caps in ATTR_RE.captures_iter(raw) {
        let Some(name) = caps.get(1).map(|m| m.as_str().to_ascii_lowercase()) else {
            continue;
        };
        if name == "onclick" {
            el = el.with_clickable(true);
            continue;
        }
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or_default();
        el = el.with_attr(&name, value);
    }
    el
}
