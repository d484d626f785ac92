//! Element descriptors and tier classification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Attributes kept on a descriptor; everything else is dropped at extraction time.
pub const ATTRIBUTE_WHITELIST: [&str; 6] = ["id", "class", "type", "name", "role", "data-testid"];

/// Maximum number of characters of text content kept per descriptor.
pub const MAX_TEXT_LEN: usize = 100;

const CRITICAL_TAGS: [&str; 5] = ["button", "input", "textarea", "select", "form"];
const CRITICAL_CLASS_HINTS: [&str; 2] = ["btn", "button"];

const IMPORTANT_TAGS: [&str; 6] = ["a", "nav", "header", "footer", "aside", "section"];
const IMPORTANT_ROLES: [&str; 2] = ["navigation", "main"];
const IMPORTANT_CLASS_HINTS: [&str; 5] = ["nav", "navbar", "menu", "container", "content"];

const CONTEXT_TAGS: [&str; 8] = ["h1", "h2", "h3", "h4", "h5", "h6", "main", "article"];
const CONTEXT_CLASS_HINTS: [&str; 3] = ["title", "heading", "page-title"];

/// A single element observed on a page.
///
/// Descriptors are produced fresh per extraction and are never persisted on
/// their own; only the hashes derived from them are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    /// Lowercase tag name.
    pub tag: String,
    /// Whitelisted attributes only.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Whitespace-collapsed text, at most [`MAX_TEXT_LEN`] characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// Document-order index assigned by the extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Set when the element carries an inline click handler.
    #[serde(default)]
    pub clickable: bool,
}

/// Importance tier of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Interactive controls.
    Critical,
    /// Structural navigation.
    Important,
    /// Headings and content landmarks.
    Context,
}

impl ElementDescriptor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into().to_ascii_lowercase(), ..Default::default() }
    }

    /// Add an attribute, ignoring names outside the whitelist.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        if ATTRIBUTE_WHITELIST.contains(&name.as_str()) {
            self.attributes.insert(name, value.into());
        }
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text_content = clean_text(text);
        self
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_clickable(mut self, clickable: bool) -> Self {
        self.clickable = clickable;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Re-apply the descriptor limits to a value that came from outside the process.
    ///
    /// Descriptors returned by in-page evaluation are untrusted: tags may be
    /// uppercase, attributes may exceed the whitelist and text may be long.
    pub fn sanitized(self) -> Self {
        let attributes = self
            .attributes
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .filter(|(k, _)| ATTRIBUTE_WHITELIST.contains(&k.as_str()))
            .collect();
        Self {
            tag: self.tag.trim().to_ascii_lowercase(),
            attributes,
            text_content: self.text_content.as_deref().and_then(clean_text),
            position: self.position,
            clickable: self.clickable,
        }
    }

    /// Tier this element belongs to, tested in critical, important, context order.
    ///
    /// Returns `None` for elements that carry no structural signal.
    pub fn tier(&self) -> Option<Tier> {
        let tag = self.tag.as_str();
        let role = self.attr("role").unwrap_or_default().to_ascii_lowercase();
        let class = self.attr("class").unwrap_or_default().to_ascii_lowercase();
        let class_has = |hints: &[&str]| hints.iter().any(|hint| class.contains(hint));

        if CRITICAL_TAGS.contains(&tag)
            || role == "button"
            || self.clickable
            || self.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("submit"))
            || class_has(&CRITICAL_CLASS_HINTS)
        {
            return Some(Tier::Critical);
        }

        if IMPORTANT_TAGS.contains(&tag) || IMPORTANT_ROLES.contains(&role.as_str()) || class_has(&IMPORTANT_CLASS_HINTS)
        {
            return Some(Tier::Important);
        }

        if CONTEXT_TAGS.contains(&tag) || role == "heading" || class_has(&CONTEXT_CLASS_HINTS) {
            return Some(Tier::Context);
        }

        None
    }
}

/// Collapse whitespace and cap at [`MAX_TEXT_LEN`] characters; blank text becomes `None`.
fn clean_text(text: &str) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.chars().take(MAX_TEXT_LEN).collect())
}
