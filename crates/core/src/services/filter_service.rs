use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::filter::FilterModel;
use crate::models::grid::GridId;

/// How long the "filter interaction in progress" flag stays up after a change.
pub const FILTER_ACTIVITY_WINDOW: Duration = Duration::from_millis(500);

/// After this long without interaction the user is considered idle.
pub const INTERACTION_IDLE_THRESHOLD: Duration = Duration::from_secs(30);

/// Filter state of one grid. `revision` counts writes so callers can tell
/// whether a grid was touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridFilterState {
    pub model: FilterModel,
    pub revision: u64,
}

/// Mirrors a filter applied on one grid onto the others.
///
/// The originating grid is excluded by identity ([`GridId`]), never by
/// comparing filter contents, so a mirrored write can never bounce back to
/// its source.
#[derive(Debug, Clone)]
pub struct FilterSynchronizer {
    sync_enabled: bool,
    shared: Option<FilterModel>,
    grids: HashMap<GridId, GridFilterState>,
}

impl FilterSynchronizer {
    pub fn new(sync_enabled: bool) -> Self {
        Self {
            sync_enabled,
            shared: None,
            grids: GridId::ALL
                .iter()
                .map(|g| (*g, GridFilterState::default()))
                .collect(),
        }
    }

    pub fn is_sync_enabled(&self) -> bool {
        self.sync_enabled
    }

    pub fn set_sync_enabled(&mut self, enabled: bool) {
        self.sync_enabled = enabled;
    }

    /// The last model that was mirrored across grids, if any.
    pub fn shared_model(&self) -> Option<&FilterModel> {
        self.shared.as_ref()
    }

    pub fn state(&self, grid: GridId) -> Option<&GridFilterState> {
        self.grids.get(&grid)
    }

    pub fn filter_for(&self, grid: GridId) -> Option<&FilterModel> {
        self.grids.get(&grid).map(|s| &s.model)
    }

    /// A grid changed its own filter (user typed into that grid).
    pub fn set_local(&mut self, grid: GridId, model: FilterModel) {
        Self::write(&mut self.grids, grid, model);
    }

    /// Propagate `model` from `source` to every other grid.
    /// Returns the grids that were written; empty when sync is off.
    pub fn on_filter_applied(&mut self, source: GridId, model: &FilterModel) -> Vec<GridId> {
        if !self.sync_enabled {
            return Vec::new();
        }

        self.shared = Some(model.clone());
        let targets: Vec<GridId> = GridId::ALL
            .iter()
            .copied()
            .filter(|g| *g != source)
            .collect();
        for grid in &targets {
            Self::write(&mut self.grids, *grid, model.clone());
        }
        tracing::debug!(%source, columns = model.len(), "mirrored filter to other grids");
        targets
    }

    fn write(grids: &mut HashMap<GridId, GridFilterState>, grid: GridId, model: FilterModel) {
        let state = grids.entry(grid).or_default();
        state.model = model;
        state.revision += 1;
    }
}

impl Default for FilterSynchronizer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// "A filter was just changed" flag, cleared [`FILTER_ACTIVITY_WINDOW`]
/// after the last change. Informational only; never affects filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterActivity {
    active_until: Option<Instant>,
}

impl FilterActivity {
    pub fn mark(&mut self, now: Instant) {
        self.active_until = Some(now + FILTER_ACTIVITY_WINDOW);
    }

    pub fn clear(&mut self) {
        self.active_until = None;
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.active_until.is_some_and(|until| now < until)
    }
}

/// Time of the last user interaction with any grid or the settings panel.
#[derive(Debug, Clone, Copy)]
pub struct InteractionTracker {
    last: Instant,
}

impl InteractionTracker {
    pub fn new(now: Instant) -> Self {
        Self { last: now }
    }

    pub fn touch(&mut self, now: Instant) {
        if now > self.last {
            self.last = now;
        }
    }

    pub fn last_interaction(&self) -> Instant {
        self.last
    }

    pub fn is_idle(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= INTERACTION_IDLE_THRESHOLD
    }
}
