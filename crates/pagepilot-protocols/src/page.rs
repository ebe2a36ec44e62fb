//! Page snapshot types supplied by the page-observation component.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Category of an interactive element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementCategory {
    Input,
    Button,
    Link,
}

impl ElementCategory {
    /// All categories in bucket order.
    pub const ALL: [ElementCategory; 3] = [Self::Input, Self::Button, Self::Link];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Button => "button",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interactive element observed on a page.
///
/// Immutable once captured. `index` is unique within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageElement {
    pub index: u32,

    #[serde(rename = "type")]
    pub category: ElementCategory,

    #[serde(default, deserialize_with = "nullable_string")]
    pub text: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub placeholder: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub aria_label: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub href: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub value: String,

    #[serde(default, deserialize_with = "nullable_string")]
    pub selector: String,

    /// Set by the executor from prior actions.
    #[serde(default)]
    pub already_clicked: bool,
}

impl PageElement {
    pub fn new(index: u32, category: ElementCategory) -> Self {
        Self {
            index,
            category,
            text: String::new(),
            placeholder: String::new(),
            aria_label: String::new(),
            href: String::new(),
            value: String::new(),
            selector: String::new(),
            already_clicked: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_aria_label(mut self, aria_label: impl Into<String>) -> Self {
        self.aria_label = aria_label.into();
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = href.into();
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn clicked(mut self) -> Self {
        self.already_clicked = true;
        self
    }

    /// Last path segment of `href`, empty when there is none.
    pub fn href_tail(&self) -> &str {
        self.href.rsplit('/').next().unwrap_or("")
    }
}

/// Everything the planner needs to know about the current page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub goal: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub page_title: String,

    #[serde(default)]
    pub elements: Vec<PageElement>,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde() {
        let json = serde_json::to_string(&ElementCategory::Button).unwrap();
        assert_eq!(json, "\"button\"");
        let cat: ElementCategory = serde_json::from_str("\"link\"").unwrap();
        assert_eq!(cat, ElementCategory::Link);
        assert!(serde_json::from_str::<ElementCategory>("\"div\"").is_err());
    }

    #[test]
    fn test_element_deserialize_minimal() {
        let el: PageElement = serde_json::from_str(r#"{"index": 3, "type": "input"}"#).unwrap();
        assert_eq!(el.index, 3);
        assert_eq!(el.category, ElementCategory::Input);
        assert!(el.text.is_empty());
        assert!(!el.already_clicked);
    }

    #[test]
    fn test_element_deserialize_nulls() {
        let el: PageElement = serde_json::from_str(
            r#"{"index": 1, "type": "link", "text": null, "href": "/shop/hats", "aria_label": null}"#,
        )
        .unwrap();
        assert_eq!(el.text, "");
        assert_eq!(el.aria_label, "");
        assert_eq!(el.href, "/shop/hats");
    }

    #[test]
    fn test_element_serializes_type_field() {
        let el = PageElement::new(0, ElementCategory::Button).with_text("Buy");
        let value = serde_json::to_value(&el).unwrap();
        assert_eq!(value["type"], "button");
        assert_eq!(value["text"], "Buy");
    }

    #[test]
    fn test_href_tail() {
        let el = PageElement::new(0, ElementCategory::Link).with_href("https://shop.test/collections/hats");
        assert_eq!(el.href_tail(), "hats");
        let el = PageElement::new(1, ElementCategory::Link).with_href("https://shop.test/");
        assert_eq!(el.href_tail(), "");
        let el = PageElement::new(2, ElementCategory::Link);
        assert_eq!(el.href_tail(), "");
    }

    #[test]
    fn test_snapshot_defaults() {
        let snap: PageSnapshot = serde_json::from_str(r#"{"goal": "buy hats"}"#).unwrap();
        assert_eq!(snap.goal, "buy hats");
        assert!(snap.url.is_empty());
        assert!(snap.elements.is_empty());
    }
}
