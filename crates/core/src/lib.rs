pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use models::{
    api::ClearTarget,
    email::{EmailMatch, EmailRow},
    field::TradeField,
    filter::FilterModel,
    grid::{GridId, GridRow, SortRequest},
    settings::Settings,
    snapshot::TradeSnapshot,
    trade::{TradeId, TradeRecord},
};
use providers::http_backend::HttpConfirmationBackend;
use providers::traits::{ConfirmationBackend, TradeDataSource};
use services::{
    data_store::{DataStore, LoadOutcome},
    filter_service::{FilterActivity, FilterSynchronizer, InteractionTracker},
    reconciliation_service,
    selection_service::{self, SelectionAction, SelectionState},
    status_service::{StatusChange, StatusService},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use errors::CoreError;

/// View state shared by the grids. Locked only for short synchronous
/// sections, never across an `.await`.
#[derive(Debug)]
struct ViewState {
    selection: SelectionState,
    filters: FilterSynchronizer,
    activity: FilterActivity,
    interactions: InteractionTracker,
    settings: Settings,
}

impl ViewState {
    fn after_change(&mut self, reloaded: bool) {
        self.interactions.touch(Instant::now());
        if reloaded {
            self.selection = SelectionState::default();
        }
    }
}

/// Main entry point for the confirmation manager core.
/// Holds the three trade collections plus the view state shared by the grids.
///
/// Every operation takes `&self`, so a shell can keep a load or a status
/// change in flight while it keeps selecting rows and applying filters.
/// Overlapping loads are coalesced: the second one returns
/// [`LoadOutcome::Skipped`].
#[must_use]
pub struct ConfirmationManager {
    store: DataStore,
    status_service: StatusService,
    view: Mutex<ViewState>,
}

impl std::fmt::Debug for ConfirmationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.store.snapshot();
        let view = self.view();
        f.debug_struct("ConfirmationManager")
            .field("unmatched", &snapshot.unmatched.len())
            .field("matched", &snapshot.matched.len())
            .field("email_matches", &snapshot.email_matches.len())
            .field("refreshing", &self.store.is_refreshing())
            .field("selected", &view.selection.selected_id)
            .field("sync_filters", &view.filters.is_sync_enabled())
            .field("settings", &view.settings)
            .finish()
    }
}

impl ConfirmationManager {
    /// Build the default collaborators from `settings`: the HTTP backend at
    /// `api_base_url`, and the assets from disk, or over HTTP when
    /// `assets_dir` is a URL.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let backend = HttpConfirmationBackend::new(settings.api_base())?;
        let source = default_source(&settings.assets_dir);
        Ok(Self::with_collaborators(settings, source, Arc::new(backend)))
    }

    /// Build with caller-supplied collaborators (tests, alternative shells).
    pub fn with_collaborators(
        settings: Settings,
        source: Box<dyn TradeDataSource>,
        backend: Arc<dyn ConfirmationBackend>,
    ) -> Self {
        Self {
            store: DataStore::new(source, Arc::clone(&backend)),
            status_service: StatusService::new(backend),
            view: Mutex::new(ViewState {
                selection: SelectionState::default(),
                filters: FilterSynchronizer::new(settings.sync_filters),
                activity: FilterActivity::default(),
                interactions: InteractionTracker::new(Instant::now()),
                settings,
            }),
        }
    }

    fn view(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Fetch all three collections. A committed load clears the selection,
    /// since the selected trade may no longer exist.
    pub async fn load(&self) -> Result<LoadOutcome, CoreError> {
        let outcome = self.store.load().await?;
        if outcome == LoadOutcome::Loaded {
            self.view().selection = SelectionState::default();
        }
        Ok(outcome)
    }

    /// The collections as of the last successful load.
    pub fn snapshot(&self) -> Arc<TradeSnapshot> {
        self.store.snapshot()
    }

    pub fn is_refreshing(&self) -> bool {
        self.store.is_refreshing()
    }

    /// Email matches paired with the status each one displays.
    #[must_use]
    pub fn email_rows(&self) -> Vec<EmailRow> {
        let snapshot = self.store.snapshot();
        snapshot
            .email_matches
            .iter()
            .map(|email| EmailRow {
                status: reconciliation_service::derive_status(email, &snapshot.matched),
                record: email.clone(),
            })
            .collect()
    }

    // ── Selection & Ordering ────────────────────────────────────────

    /// A matched-grid row was clicked. Returns the re-sorts for the other grids.
    pub fn select_matched(&self, trade: &TradeRecord) -> Vec<SortRequest> {
        let snapshot = self.store.snapshot();
        self.apply_selection(SelectionAction::SelectMatched(trade), &snapshot.matched)
    }

    /// An email-grid row was clicked. Returns the re-sorts for the other grids.
    pub fn select_email(&self, email: &EmailMatch) -> Vec<SortRequest> {
        let snapshot = self.store.snapshot();
        self.apply_selection(SelectionAction::SelectEmail(email), &snapshot.matched)
    }

    pub fn clear_selection(&self) {
        self.apply_selection(SelectionAction::Clear, &[]);
    }

    fn apply_selection(
        &self,
        action: SelectionAction<'_>,
        matched: &[TradeRecord],
    ) -> Vec<SortRequest> {
        let update = selection_service::reduce(action, matched);
        let mut view = self.view();
        view.interactions.touch(Instant::now());
        view.selection = update.state;
        tracing::debug!(selected = ?view.selection.selected_id, "selection changed");
        update.resorts
    }

    /// Copy of the current selection.
    #[must_use]
    pub fn selection(&self) -> SelectionState {
        self.view().selection.clone()
    }

    /// Whether a row carrying `id` belongs to the selected trade.
    #[must_use]
    pub fn is_selected(&self, id: Option<&TradeId>) -> bool {
        self.view().selection.is_selected(id)
    }

    fn selected_id(&self) -> Option<TradeId> {
        self.view().selection.selected_id.clone()
    }

    /// Trade rows of `grid` with the selected trade on top.
    #[must_use]
    pub fn ordered_trades(&self, grid: GridId) -> Vec<TradeRecord> {
        let snapshot = self.store.snapshot();
        let selected = self.selected_id();
        selection_service::order_rows(snapshot.trades(grid), selected.as_ref())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Email rows with those pointing at the selected trade on top.
    #[must_use]
    pub fn ordered_email_matches(&self) -> Vec<EmailRow> {
        let rows = self.email_rows();
        let selected = self.selected_id();
        selection_service::order_rows(&rows, selected.as_ref())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Ordered trade rows of `grid` that pass its current filter.
    #[must_use]
    pub fn visible_trades(&self, grid: GridId) -> Vec<TradeRecord> {
        let rows = self.ordered_trades(grid);
        self.retain_visible(grid, rows)
    }

    /// Ordered email rows that pass the email grid's current filter.
    #[must_use]
    pub fn visible_email_rows(&self) -> Vec<EmailRow> {
        let rows = self.ordered_email_matches();
        self.retain_visible(GridId::EmailMatches, rows)
    }

    fn retain_visible<R: GridRow>(&self, grid: GridId, mut rows: Vec<R>) -> Vec<R> {
        if let Some(model) = self.filter_for(grid) {
            rows.retain(|row| model.matches(row));
        }
        rows
    }

    // ── Highlighting ────────────────────────────────────────────────

    /// Whether `field` of `email` differs from the selected trade.
    #[must_use]
    pub fn is_mismatched(&self, field: TradeField, email: &EmailMatch) -> bool {
        let view = self.view();
        reconciliation_service::is_mismatched(
            field,
            email,
            view.selection.selected_id.as_ref(),
            view.selection.selected_terms.as_ref(),
        )
    }

    /// Whether a matched trade differs from the first email pointing at it.
    #[must_use]
    pub fn matched_row_has_difference(&self, trade: &TradeRecord) -> bool {
        let snapshot = self.store.snapshot();
        reconciliation_service::matched_row_has_difference(trade, &snapshot.email_matches)
    }

    // ── Filters ─────────────────────────────────────────────────────

    /// Record `model` as the filter of `grid` and mirror it to the other
    /// grids when sync is on. Returns the grids that received a copy.
    pub fn apply_filter(&self, grid: GridId, model: FilterModel) -> Vec<GridId> {
        let now = Instant::now();
        let mut view = self.view();
        view.activity.mark(now);
        view.interactions.touch(now);
        let mirrored = view.filters.on_filter_applied(grid, &model);
        view.filters.set_local(grid, model);
        mirrored
    }

    /// Copy of the filter currently set on `grid`.
    #[must_use]
    pub fn filter_for(&self, grid: GridId) -> Option<FilterModel> {
        self.view().filters.filter_for(grid).cloned()
    }

    /// Turn filter mirroring on or off. Already-mirrored filters stay in place.
    pub fn set_sync_filters(&self, enabled: bool) {
        let mut view = self.view();
        view.filters.set_sync_enabled(enabled);
        view.settings.sync_filters = enabled;
        view.interactions.touch(Instant::now());
    }

    /// True for a short while after any filter change.
    #[must_use]
    pub fn is_filter_active(&self) -> bool {
        self.view().activity.is_active(Instant::now())
    }

    // ── Status Lifecycle ────────────────────────────────────────────

    /// Mark `email` as tagged, then reload.
    pub async fn tag(&self, email: &EmailMatch) -> Result<StatusChange, CoreError> {
        let change = self.status_service.tag(&self.store, email).await?;
        self.view().after_change(change.reloaded);
        Ok(change)
    }

    /// Mark `email` as resolved, then reload.
    pub async fn resolve(&self, email: &EmailMatch) -> Result<StatusChange, CoreError> {
        let change = self.status_service.resolve(&self.store, email).await?;
        self.view().after_change(change.reloaded);
        Ok(change)
    }

    /// Restore the status `email` had before its last change, then reload.
    pub async fn undo(&self, email: &EmailMatch) -> Result<StatusChange, CoreError> {
        let change = self.status_service.undo(&self.store, email).await?;
        self.view().after_change(change.reloaded);
        Ok(change)
    }

    /// Wipe a collection on the backend and reload. Returns the backend's
    /// message. The shell asks [`ClearTarget::confirmation_prompt`] first.
    pub async fn clear(&self, target: ClearTarget) -> Result<String, CoreError> {
        let report = self.store.clear(target).await?;
        self.view().after_change(report.reloaded);
        Ok(report.message)
    }

    /// Same as [`Self::clear`] through the body-less legacy endpoints.
    pub async fn clear_legacy(&self, target: ClearTarget) -> Result<String, CoreError> {
        let report = self.store.clear_legacy(target).await?;
        self.view().after_change(report.reloaded);
        Ok(report.message)
    }

    // ── Settings & Activity ─────────────────────────────────────────

    /// Copy of the current settings.
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.view().settings.clone()
    }

    /// Replace the operator details. Connection settings take effect on the
    /// next [`Self::new`]; the sync flag applies immediately.
    pub fn update_settings(&self, settings: Settings) -> Result<(), CoreError> {
        settings.validate()?;
        let mut view = self.view();
        view.filters.set_sync_enabled(settings.sync_filters);
        view.settings = settings;
        view.interactions.touch(Instant::now());
        Ok(())
    }

    /// Record a user interaction that did not go through this facade.
    pub fn touch(&self) {
        self.view().interactions.touch(Instant::now());
    }

    /// No interaction for the idle threshold; shells may refresh freely.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.view().interactions.is_idle(Instant::now())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_source(assets: &str) -> Box<dyn TradeDataSource> {
    use providers::assets::{AssetDirSource, HttpAssetSource};
    if is_url(assets) {
        Box::new(HttpAssetSource::new(assets))
    } else {
        Box::new(AssetDirSource::new(assets))
    }
}

#[cfg(target_arch = "wasm32")]
fn default_source(assets: &str) -> Box<dyn TradeDataSource> {
    Box::new(providers::assets::HttpAssetSource::new(assets))
}

#[cfg(not(target_arch = "wasm32"))]
fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}
