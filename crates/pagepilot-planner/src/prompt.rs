//! Planner prompt rendering.
//!
//! Output is a pure function of the inputs so prompts can be asserted on
//! directly in tests.

use serde::Serialize;

use pagepilot_protocols::{ElementCategory, PageElement};

/// Maximum elements embedded in one prompt.
pub const DEFAULT_PROMPT_ELEMENT_LIMIT: usize = 20;

const PREAMBLE: &str = "You are a precise web automation planner.";

const RULES: &str = r#"CRITICAL RULES:
- FIRST: Check if the current URL and PAGE_TITLE indicate the goal is already achieved or very close
  - If URL contains keywords matching the goal (e.g., goal is "women's clothing" and URL has "/collections/apparel" or "/woman"), the task may be COMPLETE
  - If we're already on the target page, use DONE action immediately - do NOT click navigation links again
  - Example: Goal "go to women's clothing" + URL "leifshop.com/collections/apparel" = Already there, use DONE
- ALREADY CLICKED ELEMENTS: Some elements have "already_clicked": true
  - STRONGLY PREFER elements where already_clicked is false or missing
  - Only click already_clicked elements if there are NO OTHER viable options
  - If you must click an already_clicked element, verify it's truly necessary for the goal
  - This helps avoid infinite loops while still allowing necessary repeated clicks
- Use ONLY elements from ELEMENTS_JSON. Do NOT invent buttons/fields that aren't listed.
- Do NOT output a generic "search the web" plan unless the GOAL explicitly asks to search.
- If the current URL is unrelated to the goal (wrong site/tab), your first steps MUST be MANUAL (cannot be highlighted):
  - Use action=WAIT with expected_page_change=true and describe exactly what the user should do:
    1) Open a new tab
    2) Click the address bar
    3) Type the correct URL and press Enter
  - When you tell the user to go to a URL, you MUST include the full URL on its own line, so the user can copy and paste the link to use, or press on it to get to the correct site.
- Never propose creating/signing into accounts for unrelated services just because you're currently on their page (e.g., Google Account).
- When you reach the correct site, use ELEMENTS_JSON to decide what to do:
  - If elements suggest the user is already logged in (e.g. "Log out", "Settings", profile/account links), plan steps to log out first.
  - Otherwise plan steps to create a new account (sign up).
- Each step must be one atomic action: CLICK, TYPE, SCROLL, WAIT, DONE.
- AVOID LOOPS: If a single action would complete the goal (e.g., clicking one navigation link), generate ONLY that action followed by DONE
  - Never generate multiple identical or redundant steps
  - After clicking a navigation link, the next plan should recognize the URL changed and either continue or finish
  - PAGINATION WARNING: NEVER repeatedly click "next", "previous", or page number links without a specific reason
  - If you need to find items, use category navigation (e.g., Women > Skirts) or search instead of pagination
  - Clicking "next" should only be a last resort if the specific item/category is not found on the current page
- NAVIGATION STRATEGY: When looking for specific items (e.g., "buy skirts", "find jewelry"):
  - PREFER: Category navigation links (Women > Skirts, Shop > Accessories)
  - SECOND CHOICE: Search functionality (type query, then click search)
  - LAST RESORT: Pagination (clicking "next" to browse pages)
- SEARCH HANDLING: When the goal involves searching (e.g., "buy hats", "find jewelry"):
  - DO NOT repeatedly click search links/buttons without typing first
  - Look for INPUT elements with type="input" and placeholder/aria_label containing "search"
  - First: TYPE action targeting the search input field with the search query
  - Then: CLICK action on the search button or press enter
  - Never skip the TYPE step when a search is needed
- Every CLICK/TYPE step MUST include target_hints with:
  - type (input/button/link)
  - AND at least one anchor: text_contains OR placeholder_contains OR selector_pattern.
- In target_hints, text_contains and placeholder_contains MUST be JSON arrays (use [] if none). Never use null.
- TYPE steps MUST include text_input.
  - If the goal requires unknown personal info (email/phone/password), use placeholders like "<EMAIL>", "<PASSWORD>" and say so in the description.
  - For search queries, extract the search term from the goal (e.g., "hats" from "buy hats")
- End the plan with a DONE step."#;

const OUTPUT_CONTRACT: &str = r#"OUTPUT:
Return JSON only, exactly:
{
  "steps": [
    {
      "step_number": 1,
      "action": "CLICK|TYPE|SCROLL|WAIT|DONE",
      "description": "...",
      "target_hints": {
        "type": "input|button|link",
        "text_contains": ["..."],
        "placeholder_contains": ["..."],
        "selector_pattern": null,
        "role": null
      },
      "text_input": null,
      "expected_page_change": false
    }
  ]
}"#;

/// Element as shown to the model.
#[derive(Serialize)]
struct PromptElement<'a> {
    index: u32,
    #[serde(rename = "type")]
    category: ElementCategory,
    text: &'a str,
    placeholder: &'a str,
    aria_label: &'a str,
    href: &'a str,
    selector: &'a str,
    already_clicked: bool,
}

impl<'a> From<&'a PageElement> for PromptElement<'a> {
    fn from(element: &'a PageElement) -> Self {
        Self {
            index: element.index,
            category: element.category,
            text: &element.text,
            placeholder: &element.placeholder,
            aria_label: &element.aria_label,
            href: &element.href,
            selector: &element.selector,
            already_clicked: element.already_clicked,
        }
    }
}

/// Renders the planner prompt.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    element_limit: usize,
}

impl PromptBuilder {
    pub fn new(element_limit: usize) -> Self {
        Self { element_limit }
    }

    pub fn element_limit(&self) -> usize {
        self.element_limit
    }

    /// Build the prompt from the first `element_limit` elements, in the
    /// order given.
    pub fn build<'a>(
        &self,
        goal: &str,
        elements: impl IntoIterator<Item = &'a PageElement>,
        url: &str,
        page_title: &str,
    ) -> String {
        let shown: Vec<PromptElement<'_>> = elements
            .into_iter()
            .take(self.element_limit)
            .map(PromptElement::from)
            .collect();
        let elements_json = serde_json::to_string(&shown).unwrap_or_else(|_| "[]".to_string());

        format!(
            "{PREAMBLE}\n\nGOAL: {goal}\nPAGE_TITLE: {page_title}\nURL: {url}\nELEMENTS_JSON: {elements_json}\n\n{RULES}\n\n{OUTPUT_CONTRACT}"
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_ELEMENT_LIMIT)
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
