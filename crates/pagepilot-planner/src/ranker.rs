//! Goal relevance ranking of page elements.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use pagepilot_embedding::BatchEmbedder;
use pagepilot_protocols::{ElementCategory, PageElement};

use crate::rules::HeuristicRules;

/// Text used for an element with nothing to embed.
const EMPTY_ELEMENT_TEXT: &str = "element";

/// Ranking parameters.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// When false elements are bucketed in page order.
    pub enabled: bool,
    /// Minimum adjusted score to be selected without backfill.
    pub similarity_threshold: f32,
    /// Maximum elements kept per category.
    pub per_category_cap: usize,
    /// Backfill target when too few elements pass the threshold.
    pub min_per_category: usize,
    /// Maximum characters of element text sent for embedding.
    pub max_text_chars: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            similarity_threshold: 0.3,
            per_category_cap: 20,
            min_per_category: 10,
            max_text_chars: 500,
        }
    }
}

/// Why a ranking attempt was abandoned.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("expected {expected} embeddings, got {actual}")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("element {index} has a {actual}-dimensional vector, goal has {expected}")]
    DimensionMismatch {
        index: u32,
        expected: usize,
        actual: usize,
    },

    #[error("element {index} scored a non-finite similarity")]
    NonFiniteScore { index: u32 },
}

/// How a [`RankedElements`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMode {
    /// Scored and selected by relevance.
    Ranked,
    /// Ranking disabled or nothing to rank; page order.
    Unranked,
    /// Ranking failed; page order.
    Degraded,
}

/// A page element with its adjusted relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedElement {
    pub element: PageElement,
    /// `None` when the element was bucketed without scoring.
    pub similarity_score: Option<f32>,
}

impl RankedElement {
    pub fn category(&self) -> ElementCategory {
        self.element.category
    }
}

/// Ranked elements bucketed by category.
#[derive(Debug, Clone)]
pub struct RankedElements {
    pub inputs: Vec<RankedElement>,
    pub buttons: Vec<RankedElement>,
    pub links: Vec<RankedElement>,
    pub mode: RankingMode,
}

impl RankedElements {
    pub fn bucket(&self, category: ElementCategory) -> &[RankedElement] {
        match category {
            ElementCategory::Input => &self.inputs,
            ElementCategory::Button => &self.buttons,
            ElementCategory::Link => &self.links,
        }
    }

    pub fn total(&self) -> usize {
        self.inputs.len() + self.buttons.len() + self.links.len()
    }

    /// Inputs, then buttons, then links.
    pub fn iter(&self) -> impl Iterator<Item = &RankedElement> {
        self.inputs
            .iter()
            .chain(self.buttons.iter())
            .chain(self.links.iter())
    }

    pub fn elements(&self) -> impl Iterator<Item = &PageElement> {
        self.iter().map(|r| &r.element)
    }

    fn bucket_mut(&mut self, category: ElementCategory) -> &mut Vec<RankedElement> {
        match category {
            ElementCategory::Input => &mut self.inputs,
            ElementCategory::Button => &mut self.buttons,
            ElementCategory::Link => &mut self.links,
        }
    }

    fn empty(mode: RankingMode) -> Self {
        Self {
            inputs: Vec::new(),
            buttons: Vec::new(),
            links: Vec::new(),
            mode,
        }
    }
}

/// Scores elements against the goal and keeps the most relevant per category.
///
/// Never fails: any error while scoring is logged and the page-order
/// buckets are returned instead.
pub struct RelevanceRanker {
    embedder: Arc<BatchEmbedder>,
    rules: HeuristicRules,
    config: RankerConfig,
}

impl RelevanceRanker {
    pub fn new(embedder: Arc<BatchEmbedder>, config: RankerConfig) -> Self {
        Self {
            embedder,
            rules: HeuristicRules::default(),
            config,
        }
    }

    pub fn with_rules(mut self, rules: HeuristicRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    pub async fn rank(&self, goal: &str, elements: &[PageElement]) -> RankedElements {
        if !self.config.enabled || elements.is_empty() {
            return self.unranked(elements, RankingMode::Unranked);
        }

        info!(
            "Semantic filtering {} elements for goal: {}",
            elements.len(),
            truncate_chars(goal, 50)
        );

        match self.try_rank(goal, elements).await {
            Ok(ranked) => {
                info!(
                    "Semantic filter: {} -> {} elements ({} inputs, {} buttons, {} links)",
                    elements.len(),
                    ranked.total(),
                    ranked.inputs.len(),
                    ranked.buttons.len(),
                    ranked.links.len()
                );
                ranked
            }
            Err(e) => {
                error!("Ranking degraded, falling back to page order: {}", e);
                self.unranked(elements, RankingMode::Degraded)
            }
        }
    }

    async fn try_rank(
        &self,
        goal: &str,
        elements: &[PageElement],
    ) -> Result<RankedElements, RankingError> {
        let mut texts = Vec::with_capacity(elements.len() + 1);
        texts.push(goal.to_string());
        texts.extend(
            elements
                .iter()
                .map(|e| element_text(e, self.config.max_text_chars)),
        );

        let embeddings = self.embedder.embed_all(&texts).await;
        if embeddings.len() != texts.len() {
            return Err(RankingError::EmbeddingCount {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }
        let Some((goal_vector, element_vectors)) = embeddings.split_first() else {
            return Err(RankingError::EmbeddingCount {
                expected: texts.len(),
                actual: 0,
            });
        };

        let mut scored = Vec::with_capacity(elements.len());
        for (element, vector) in elements.iter().zip(element_vectors) {
            let similarity = vector.cosine_similarity(goal_vector).ok_or(
                RankingError::DimensionMismatch {
                    index: element.index,
                    expected: goal_vector.dimension,
                    actual: vector.dimension,
                },
            )?;
            let score = self.rules.apply(element, similarity);
            if !score.is_finite() {
                return Err(RankingError::NonFiniteScore {
                    index: element.index,
                });
            }
            scored.push((score, element));
        }

        let top_score = scored.iter().map(|(s, _)| *s).fold(f32::NEG_INFINITY, f32::max);
        debug!("Top adjusted score: {:.3}", top_score);

        let mut ranked = RankedElements::empty(RankingMode::Ranked);
        for category in ElementCategory::ALL {
            let mut bucket: Vec<(f32, &PageElement)> = scored
                .iter()
                .filter(|(_, e)| e.category == category)
                .copied()
                .collect();
            // stable: ties keep page order
            bucket.sort_by(|a, b| b.0.total_cmp(&a.0));

            let keep = self.selection_size(&bucket);
            *ranked.bucket_mut(category) = bucket
                .into_iter()
                .take(keep)
                .map(|(score, element)| RankedElement {
                    element: element.clone(),
                    similarity_score: Some(score),
                })
                .collect();
        }

        Ok(ranked)
    }

    /// Count of the leading elements of a descending bucket to keep.
    fn selection_size(&self, sorted: &[(f32, &PageElement)]) -> usize {
        let cap = self.config.per_category_cap;
        let passing = sorted
            .iter()
            .take_while(|(score, _)| *score >= self.config.similarity_threshold)
            .count()
            .min(cap);

        let floor = self.config.min_per_category.min(sorted.len()).min(cap);
        passing.max(floor)
    }

    fn unranked(&self, elements: &[PageElement], mode: RankingMode) -> RankedElements {
        let mut ranked = RankedElements::empty(mode);
        for element in elements {
            let bucket = ranked.bucket_mut(element.category);
            if bucket.len() < self.config.per_category_cap {
                bucket.push(RankedElement {
                    element: element.clone(),
                    similarity_score: None,
                });
            }
        }
        ranked
    }
}

/// Text embedded for an element: text, placeholder, aria-label and the last
/// href segment joined by spaces.
pub fn element_text(element: &PageElement, max_chars: usize) -> String {
    let combined = [
        element.text.as_str(),
        element.placeholder.as_str(),
        element.aria_label.as_str(),
        element.href_tail(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ");

    let truncated = truncate_chars(combined.trim(), max_chars);
    if truncated.is_empty() {
        EMPTY_ELEMENT_TEXT.to_string()
    } else {
        truncated.to_string()
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
#[path = "ranker_tests.rs"]
mod tests;
