//! Planning request orchestration.
//!
//! `rank -> prompt -> generate (primary, then fallback) -> parse`. Ranking
//! cannot fail the request; generation falls over at most once; parse
//! failures end the request.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use pagepilot_protocols::{
    GenerationContext, GenerationError, GenerationProvider, PageElement, PageSnapshot,
    PlannedStep, PlanningError,
};

use crate::gate::CallGate;
use crate::parser::parse_plan;
use crate::prompt::{PromptBuilder, DEFAULT_PROMPT_ELEMENT_LIMIT};
use crate::ranker::{RankedElement, RankedElements, RelevanceRanker};

/// Limits applied around ranking.
#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Elements beyond this many are dropped before ranking.
    pub max_input_elements: usize,
    /// Elements embedded in the prompt.
    pub prompt_element_limit: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            max_input_elements: 110,
            prompt_element_limit: DEFAULT_PROMPT_ELEMENT_LIMIT,
        }
    }
}

/// One planning request.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub goal: String,
    pub url: String,
    pub page_title: String,
    pub elements: Vec<PageElement>,
    pub user_id: Option<String>,
}

impl PlanRequest {
    pub fn new(goal: impl Into<String>, elements: Vec<PageElement>) -> Self {
        Self {
            goal: goal.into(),
            url: String::new(),
            page_title: String::new(),
            elements,
            user_id: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_page_title(mut self, page_title: impl Into<String>) -> Self {
        self.page_title = page_title.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn context(&self) -> GenerationContext {
        GenerationContext {
            goal: self.goal.clone(),
            url: self.url.clone(),
            page_title: self.page_title.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

impl From<PageSnapshot> for PlanRequest {
    fn from(snapshot: PageSnapshot) -> Self {
        Self {
            goal: snapshot.goal,
            url: snapshot.url,
            page_title: snapshot.page_title,
            elements: snapshot.elements,
            user_id: None,
        }
    }
}

/// Per-provider call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
}

/// Ordered provider attempts: primary first, then fallback.
pub struct ProviderChain {
    attempts: Vec<Arc<dyn GenerationProvider>>,
    stats: DashMap<String, ProviderStats>,
}

impl ProviderChain {
    pub fn new(
        primary: Option<Arc<dyn GenerationProvider>>,
        fallback: Option<Arc<dyn GenerationProvider>>,
    ) -> Self {
        let attempts: Vec<_> = primary.into_iter().chain(fallback).collect();
        Self {
            attempts,
            stats: DashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.attempts.iter().map(|p| p.id()).collect()
    }

    pub fn stats(&self, provider: &str) -> ProviderStats {
        self.stats.get(provider).map(|s| *s).unwrap_or_default()
    }

    /// Try each provider in order through `gate`.
    ///
    /// Returns the first success, or the error of the last provider tried.
    pub async fn generate(
        &self,
        gate: &CallGate,
        prompt: &str,
        context: &GenerationContext,
    ) -> Result<String, GenerationError> {
        let mut last_error = None;

        for (position, provider) in self.attempts.iter().enumerate() {
            let id = provider.id();
            info!("Generating plan with {} ({})", id, provider.model());

            let result = gate.call(id, || provider.generate(prompt, context)).await;
            self.record(id, result.is_ok());

            match result {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if let Some(next) = self.attempts.get(position + 1) {
                        warn!("Provider {} failed, falling back to {}: {}", id, next.id(), e);
                    } else {
                        error!("Provider {} failed: {}", id, e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(GenerationError::NoProviders))
    }

    fn record(&self, provider: &str, success: bool) {
        let mut stats = self.stats.entry(provider.to_string()).or_default();
        stats.attempts += 1;
        if success {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
    }
}

/// Composes ranking, prompting, generation and parsing.
pub struct Planner {
    ranker: RelevanceRanker,
    prompts: PromptBuilder,
    providers: ProviderChain,
    gate: Arc<CallGate>,
    options: PlannerOptions,
}

impl Planner {
    pub fn new(
        ranker: RelevanceRanker,
        providers: ProviderChain,
        gate: Arc<CallGate>,
        options: PlannerOptions,
    ) -> Self {
        Self {
            ranker,
            prompts: PromptBuilder::new(options.prompt_element_limit),
            providers,
            gate,
            options,
        }
    }

    pub fn providers(&self) -> &ProviderChain {
        &self.providers
    }

    pub fn gate(&self) -> &Arc<CallGate> {
        &self.gate
    }

    /// Rank the request's elements. Never fails.
    pub async fn rank(&self, request: &PlanRequest) -> RankedElements {
        let limit = request.elements.len().min(self.options.max_input_elements);
        if limit < request.elements.len() {
            debug!(
                "Dropping {} elements beyond the first {}",
                request.elements.len() - limit,
                limit
            );
        }
        self.ranker.rank(&request.goal, &request.elements[..limit]).await
    }

    /// Rank and render the prompt without calling a provider.
    pub async fn prepare(&self, request: &PlanRequest) -> (RankedElements, String) {
        let ranked = self.rank(request).await;
        log_selection(&ranked);

        let prompt = self.prompts.build(
            &request.goal,
            ranked.elements(),
            &request.url,
            &request.page_title,
        );
        (ranked, prompt)
    }

    /// Produce a validated plan for `request`.
    pub async fn plan(&self, request: &PlanRequest) -> Result<Vec<PlannedStep>, PlanningError> {
        info!(
            "Planning for goal {:?} at {} (user: {}, {} elements)",
            request.goal,
            request.url,
            request.user_id.as_deref().unwrap_or("anonymous"),
            request.elements.len()
        );

        let (_, prompt) = self.prepare(request).await;
        let context = request.context();

        let text = self
            .providers
            .generate(&self.gate, &prompt, &context)
            .await?;
        debug!("Planner response: {}", text);

        let steps = parse_plan(&text)?;
        if !steps.last().is_some_and(PlannedStep::is_terminal) {
            warn!("Plan of {} steps does not end with DONE", steps.len());
        }
        info!("Planned {} steps", steps.len());
        Ok(steps)
    }
}

fn log_selection(ranked: &RankedElements) {
    debug!(
        "Sending {} inputs, {} buttons, {} links ({:?})",
        ranked.inputs.len(),
        ranked.buttons.len(),
        ranked.links.len(),
        ranked.mode
    );
    log_bucket("inputs", &ranked.inputs, 15);
    log_bucket("buttons", &ranked.buttons, 15);
    log_bucket("links", &ranked.links, 20);
}

fn log_bucket(label: &str, bucket: &[RankedElement], shown: usize) {
    debug!("{}:", label);
    for (position, ranked) in bucket.iter().take(shown).enumerate() {
        let element = &ranked.element;
        let name = [&element.text, &element.placeholder, &element.href]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| s.chars().take(40).collect::<String>())
            .unwrap_or_default();
        debug!(
            "  {:2}. [{}] {:40} (score: {:.3})",
            position + 1,
            if element.already_clicked { "x" } else { " " },
            name,
            ranked.similarity_score.unwrap_or(0.0)
        );
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
