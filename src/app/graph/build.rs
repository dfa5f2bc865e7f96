use std::collections::HashSet;
use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::assets::{AssetCache, Preloader};
use crate::graph::{GraphPayload, Node, NodeKind};
use crate::util::parse_count;

use super::super::physics::{ForceSimulation, SimulationConfig};
use super::super::render::RendererKind;
use super::super::{SearchMatchCache, ViewModel};
use super::InteractionController;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Best score of `query` against a node's label and id.
fn node_match_score(matcher: &SkimMatcherV2, node: &Node, query: &str) -> Option<i64> {
    let by_label = fuzzy_match_score(matcher, node.label(), query);
    let by_id = fuzzy_match_score(matcher, &node.id, query);
    by_label.max(by_id)
}

fn total_views(payload: &GraphPayload) -> u64 {
    payload
        .nodes
        .iter()
        .filter(|node| matches!(node.kind, NodeKind::Video(_)))
        .map(|node| parse_count(&node.view_count))
        .fold(0u64, u64::saturating_add)
}

impl ViewModel {
    pub(in crate::app) const SEARCH_RESULT_ROWS: usize = 30;

    pub(in crate::app) fn new(
        source: String,
        payload: GraphPayload,
        kind: RendererKind,
        config: SimulationConfig,
        assets: &mut AssetCache,
    ) -> Self {
        let token = assets.begin_view();
        let preloader = Preloader::new(payload.thumbnail_urls(), token);
        let total_views = total_views(&payload);
        log::info!(
            "opening {} view generation {} ({} nodes, {} edges)",
            kind.label(),
            assets.generation(),
            payload.nodes.len(),
            payload.edges.len()
        );

        let mut model = Self {
            source,
            renderer: kind.create(),
            simulation: ForceSimulation::new(kind.dimensions()),
            interaction: InteractionController::default(),
            preloader,
            config,
            started: false,
            search: String::new(),
            search_match_cache: None,
            total_views,
            payload,
        };
        model.start_if_ready(assets);
        model
    }

    /// Starts the simulation unless the renderer still waits on thumbnails.
    pub(in crate::app) fn start_if_ready(&mut self, assets: &AssetCache) -> bool {
        if self.started {
            return true;
        }
        if self.renderer.waits_for_thumbnails()
            && !assets.all_resolved(self.payload.thumbnail_urls())
        {
            return false;
        }

        self.simulation
            .start(&self.payload.nodes, &self.payload.edges, self.config);
        self.started = true;
        true
    }

    /// Tears the current view down and builds a new one over the same payload.
    pub(in crate::app) fn switch_renderer(&mut self, kind: RendererKind, assets: &mut AssetCache) {
        if self.renderer.kind() == kind {
            return;
        }
        log::info!("switching to the {} renderer", kind.label());

        let token = assets.begin_view();
        self.preloader = Preloader::new(self.payload.thumbnail_urls(), token);
        self.renderer = kind.create();
        self.simulation = ForceSimulation::new(kind.dimensions());
        self.interaction.reset();
        self.started = false;
        self.start_if_ready(assets);
    }

    pub(in crate::app) fn apply_config(&mut self) {
        self.simulation.reconfigure(self.config);
    }

    pub(in crate::app) fn reset_config(&mut self) {
        self.config = SimulationConfig::default();
        self.apply_config();
    }

    pub(in crate::app) fn set_paused(&mut self, paused: bool) {
        self.simulation.set_user_paused(paused);
    }

    pub(in crate::app) fn activate_node(&mut self, index: usize) {
        let Some(node) = self.payload.nodes.get(index) else {
            return;
        };
        if self
            .interaction
            .on_node_activate(&mut self.simulation, index, node)
        {
            log::debug!(
                "selected node {} (selection change #{})",
                node.id,
                self.interaction.transitions()
            );
        }
    }

    pub(in crate::app) fn activate_edge(&mut self, index: usize) {
        let Some(resolved) = self.simulation.edges().get(index) else {
            return;
        };
        let edge = resolved.edge.clone();
        if self
            .interaction
            .on_edge_activate(&mut self.simulation, &edge)
        {
            log::debug!("selected edge {} -> {}", edge.source, edge.target);
        }
    }

    /// Indices of nodes fuzzily matching the search box, cached per query.
    pub(in crate::app) fn search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            self.search_match_cache = None;
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .payload
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node_match_score(&matcher, node, query).is_some())
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    /// Search hits ordered by score, best first.
    pub(in crate::app) fn ranked_search_results(&self, limit: usize) -> Vec<usize> {
        let query = self.search.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .payload
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                node_match_score(&matcher, node, query).map(|score| (score, index))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.truncate(limit);
        scored.into_iter().map(|(_, index)| index).collect()
    }
}
