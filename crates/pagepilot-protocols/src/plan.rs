//! Planned step types consumed by the action executor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::page::ElementCategory;

/// One atomic browser action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepAction {
    Click,
    Type,
    Scroll,
    Wait,
    Done,
}

impl StepAction {
    /// CLICK and TYPE act on a concrete element and need target hints.
    pub fn requires_target(&self) -> bool {
        matches!(self, Self::Click | Self::Type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "CLICK",
            Self::Type => "TYPE",
            Self::Scroll => "SCROLL",
            Self::Wait => "WAIT",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the executor should locate the element a step acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetHints {
    #[serde(rename = "type")]
    pub element_type: ElementCategory,

    #[serde(default)]
    pub text_contains: Vec<String>,

    #[serde(default)]
    pub placeholder_contains: Vec<String>,

    #[serde(default)]
    pub selector_pattern: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
}

impl TargetHints {
    pub fn new(element_type: ElementCategory) -> Self {
        Self {
            element_type,
            text_contains: Vec::new(),
            placeholder_contains: Vec::new(),
            selector_pattern: None,
            role: None,
        }
    }

    /// At least one of text, placeholder or selector anchors the target.
    pub fn has_anchor(&self) -> bool {
        !self.text_contains.is_empty()
            || !self.placeholder_contains.is_empty()
            || self
                .selector_pattern
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
    }
}

/// One step of a plan. `step_number` is the authoritative order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub step_number: u32,
    pub action: StepAction,
    pub description: String,

    #[serde(default)]
    pub target_hints: Option<TargetHints>,

    #[serde(default)]
    pub text_input: Option<String>,

    #[serde(default)]
    pub expected_page_change: bool,
}

impl PlannedStep {
    pub fn is_terminal(&self) -> bool {
        self.action == StepAction::Done
    }
}
