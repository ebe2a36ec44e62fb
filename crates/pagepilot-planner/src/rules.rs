//! Keyword heuristics applied on top of embedding similarity.
//!
//! Each rule multiplies the score of matching elements. Rules stack and are
//! applied in table order; the default table is:
//!
//! | # | rule       | categories   | multiplier | skipped for pagination |
//! |---|------------|--------------|------------|------------------------|
//! | 1 | pagination | link         | 0.2        | -                      |
//! | 2 | category   | link         | 1.5        | yes                    |
//! | 3 | product    | link         | 2.5        | yes                    |
//! | 4 | action     | button, link | 2.0        | no                     |
//! | 5 | menu       | button       | 0.1        | no                     |

use pagepilot_protocols::{ElementCategory, PageElement};

pub const PAGINATION_KEYWORDS: &[&str] =
    &["next", "previous", "prev", "page ", " page", "pagination"];

pub const CATEGORY_KEYWORDS: &[&str] = &[
    "men", "women", "woman", "mens", "womens", "shop", "category", "collection", "apparel",
    "clothing", "accessories", "jewelry", "shoes", "dress", "skirt", "pant", "shirt", "top",
    "bottom",
];

pub const PRODUCT_KEYWORDS: &[&str] = &[
    "product", "item", "$", "price", "shop", "quick view", "quick add", "trouser", "pant",
    "skirt", "dress", "shirt", "shoe", "jacket",
];

pub const ACTION_KEYWORDS: &[&str] = &[
    "add to cart", "add to bag", "buy now", "purchase", "checkout", "add", "submit",
    "continue", "proceed", "confirm", "place order",
];

pub const MENU_KEYWORDS: &[&str] = &["menu", "navigation", "nav", "hamburger", "close", "open menu"];

/// One `(keywords, categories, multiplier)` entry.
#[derive(Debug, Clone)]
pub struct HeuristicRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub categories: Vec<ElementCategory>,
    pub multiplier: f32,
    /// Do not fire on elements that look like pagination controls.
    pub skip_pagination: bool,
}

impl HeuristicRule {
    pub fn new(
        name: impl Into<String>,
        keywords: &[&str],
        categories: &[ElementCategory],
        multiplier: f32,
    ) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            categories: categories.to_vec(),
            multiplier,
            skip_pagination: false,
        }
    }

    pub fn skipping_pagination(mut self) -> Self {
        self.skip_pagination = true;
        self
    }

    fn matches(&self, category: ElementCategory, text: &str, paginated: bool) -> bool {
        if self.skip_pagination && paginated {
            return false;
        }
        self.categories.contains(&category) && contains_any(text, &self.keywords)
    }
}

/// Ordered rule table.
#[derive(Debug, Clone)]
pub struct HeuristicRules {
    pagination_keywords: Vec<String>,
    rules: Vec<HeuristicRule>,
}

impl HeuristicRules {
    /// A table with no rules; scores pass through unchanged.
    pub fn empty() -> Self {
        Self {
            pagination_keywords: PAGINATION_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            rules: Vec::new(),
        }
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: HeuristicRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[HeuristicRule] {
        &self.rules
    }

    pub fn is_pagination(&self, text: &str) -> bool {
        contains_any(text, &self.pagination_keywords)
    }

    /// Apply every matching rule to `score`.
    pub fn apply(&self, element: &PageElement, score: f32) -> f32 {
        let text = keyword_text(element);
        let paginated = self.is_pagination(&text);

        self.rules
            .iter()
            .filter(|rule| rule.matches(element.category, &text, paginated))
            .fold(score, |acc, rule| acc * rule.multiplier)
    }

    /// Names of the rules that fire for `element`.
    pub fn matching(&self, element: &PageElement) -> Vec<&str> {
        let text = keyword_text(element);
        let paginated = self.is_pagination(&text);

        self.rules
            .iter()
            .filter(|rule| rule.matches(element.category, &text, paginated))
            .map(|rule| rule.name.as_str())
            .collect()
    }
}

impl Default for HeuristicRules {
    fn default() -> Self {
        use ElementCategory::{Button, Link};

        Self::empty()
            .with_rule(HeuristicRule::new("pagination", PAGINATION_KEYWORDS, &[Link], 0.2))
            .with_rule(
                HeuristicRule::new("category", CATEGORY_KEYWORDS, &[Link], 1.5).skipping_pagination(),
            )
            .with_rule(
                HeuristicRule::new("product", PRODUCT_KEYWORDS, &[Link], 2.5).skipping_pagination(),
            )
            .with_rule(HeuristicRule::new("action", ACTION_KEYWORDS, &[Button, Link], 2.0))
            .with_rule(HeuristicRule::new("menu", MENU_KEYWORDS, &[Button], 0.1))
    }
}

/// Lowercased text, aria-label and href the keywords are matched against.
pub fn keyword_text(element: &PageElement) -> String {
    format!("{} {} {}", element.text, element.aria_label, element.href).to_lowercase()
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(text: &str) -> PageElement {
        PageElement::new(0, ElementCategory::Link).with_text(text)
    }

    fn button(text: &str) -> PageElement {
        PageElement::new(0, ElementCategory::Button).with_text(text)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_default_table_order() {
        let rules = HeuristicRules::default();
        let names: Vec<&str> = rules.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["pagination", "category", "product", "action", "menu"]);
    }

    #[test]
    fn test_pagination_link_penalised() {
        let rules = HeuristicRules::default();
        assert!(approx(rules.apply(&link("Next"), 0.5), 0.1));
        assert_eq!(rules.matching(&link("Next")), vec!["pagination"]);
    }

    #[test]
    fn test_pagination_suppresses_category_and_product() {
        let rules = HeuristicRules::default();
        // "shop" is both a category and product keyword
        let el = link("Next page of shop");
        assert_eq!(rules.matching(&el), vec!["pagination"]);
    }

    #[test]
    fn test_category_and_product_stack() {
        let rules = HeuristicRules::default();
        let el = link("Shop dresses");
        assert_eq!(rules.matching(&el), vec!["category", "product"]);
        assert!(approx(rules.apply(&el, 0.4), 0.4 * 1.5 * 2.5));
    }

    #[test]
    fn test_action_applies_to_buttons_and_links() {
        let rules = HeuristicRules::default();
        assert!(approx(rules.apply(&button("Add to cart"), 0.3), 0.6));
        let el = link("Checkout");
        assert!(rules.matching(&el).contains(&"action"));
    }

    #[test]
    fn test_menu_button_penalised() {
        let rules = HeuristicRules::default();
        assert!(approx(rules.apply(&button("Open menu"), 0.5), 0.05));
    }

    #[test]
    fn test_menu_rule_ignores_links() {
        let rules = HeuristicRules::default();
        assert!(!rules.matching(&link("Menu")).contains(&"menu"));
    }

    #[test]
    fn test_inputs_untouched() {
        let rules = HeuristicRules::default();
        let el = PageElement::new(0, ElementCategory::Input)
            .with_text("Next shop product")
            .with_placeholder("Search");
        assert!(approx(rules.apply(&el, 0.7), 0.7));
    }

    #[test]
    fn test_keywords_match_href_and_aria_label() {
        let rules = HeuristicRules::default();
        let el = PageElement::new(0, ElementCategory::Link).with_href("/collections/hats?direction=next");
        assert!(rules.is_pagination(&keyword_text(&el)));

        let el = PageElement::new(0, ElementCategory::Button).with_aria_label("Navigation");
        assert_eq!(rules.matching(&el), vec!["menu"]);
    }

    #[test]
    fn test_custom_rule_extends_table() {
        let rules = HeuristicRules::default().with_rule(HeuristicRule::new(
            "sale",
            &["sale"],
            &[ElementCategory::Link],
            3.0,
        ));
        assert!(approx(rules.apply(&link("Winter sale"), 0.2), 0.6));
    }

    #[test]
    fn test_empty_table_is_identity() {
        let rules = HeuristicRules::empty();
        assert!(approx(rules.apply(&link("Next"), 0.5), 0.5));
    }
}
