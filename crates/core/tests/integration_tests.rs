use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use confirmation_manager_core::errors::{CoreError, ErrorKind};
use confirmation_manager_core::models::api::{
    ApiResponse, ClearFileRequest, ClearTarget, UndoStatusRequest, UpdateStatusRequest,
};
use confirmation_manager_core::models::field::TradeField;
use confirmation_manager_core::models::filter::{ColumnFilter, FilterModel, TextOperator};
use confirmation_manager_core::models::grid::{GridId, SortRequest};
use confirmation_manager_core::models::settings::Settings;
use confirmation_manager_core::models::status::{ReconciliationStatus, RowStatus};
use confirmation_manager_core::models::trade::{TradeId, TradeRecord};
use confirmation_manager_core::providers::traits::{ConfirmationBackend, TradeDataSource};
use confirmation_manager_core::services::data_store::LoadOutcome;
use confirmation_manager_core::ConfirmationManager;

// ═══════════════════════════════════════════════════════════════════
// Mock Collaborators (in-memory assets, scripted backend)
// ═══════════════════════════════════════════════════════════════════

/// In-memory assets. When gated, every fetch waits for the gate to open.
struct FixtureSource {
    files: Arc<Mutex<HashMap<String, String>>>,
    fetches: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl TradeDataSource for FixtureSource {
    fn name(&self) -> &str {
        "Fixtures"
    }

    async fn fetch_resource(&self, resource: &str) -> Result<Vec<u8>, CoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.files
            .lock()
            .unwrap()
            .get(resource)
            .map(|s| s.as_bytes().to_vec())
            .ok_or_else(|| CoreError::FileIO(format!("{resource}: not found")))
    }
}

struct ScriptedBackend {
    response: Mutex<ApiResponse>,
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ConfirmationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn update_email_status(
        &self,
        request: &UpdateStatusRequest,
    ) -> Result<ApiResponse, CoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("update {} {}", request.email_id, request.status));
        Ok(self.response.lock().unwrap().clone())
    }

    async fn undo_status_change(
        &self,
        request: &UndoStatusRequest,
    ) -> Result<ApiResponse, CoreError> {
        self.calls.lock().unwrap().push(format!("undo {}", request.email_id));
        Ok(self.response.lock().unwrap().clone())
    }

    async fn clear_json_file(&self, request: &ClearFileRequest) -> Result<ApiResponse, CoreError> {
        self.calls.lock().unwrap().push(format!("clear {}", request.file_type));
        Ok(self.response.lock().unwrap().clone())
    }

    async fn clear_legacy(&self, target: ClearTarget) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(format!("legacy {target}"));
        Ok(())
    }
}

struct Harness {
    manager: ConfirmationManager,
    files: Arc<Mutex<HashMap<String, String>>>,
    fetches: Arc<AtomicUsize>,
    backend: Arc<ScriptedBackend>,
}

impl Harness {
    fn set_file(&self, resource: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(resource.to_string(), content.to_string());
    }

    fn respond_with(&self, response: ApiResponse) {
        *self.backend.response.lock().unwrap() = response;
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

fn harness() -> Harness {
    harness_with_gate(None)
}

fn harness_with_gate(gate: Option<Arc<Notify>>) -> Harness {
    let mut files = HashMap::new();
    files.insert(
        "unmatched_trades.json".to_string(),
        r#"[{"TradeNumber": 300, "CounterpartyName": "Initech", "Currency1": "JPY"}]"#.to_string(),
    );
    files.insert(
        "matched_trades.json".to_string(),
        r#"[
            {"TradeNumber": 200, "CounterpartyName": "Globex", "Currency1": "GBP", "QuantityCurrency1": 500},
            {"TradeNumber": 100, "CounterpartyName": "ACME", "Currency1": "USD", "QuantityCurrency1": 1000000}
        ]"#
        .to_string(),
    );
    files.insert(
        "email_matches.json".to_string(),
        r#"[
            {"InferredTradeID": 200, "CounterpartyName": "Globex", "Currency1": "GBP", "QuantityCurrency1": 750},
            {"InferredTradeID": 100, "CounterpartyName": "ACME", "Currency1": "USD", "QuantityCurrency1": 1000000},
            {"InferredTradeID": 0, "ProductType": "Not a recognized trade", "EmailSubject": "Lunch?"}
        ]"#
        .to_string(),
    );

    let files = Arc::new(Mutex::new(files));
    let fetches = Arc::new(AtomicUsize::new(0));
    let backend = Arc::new(ScriptedBackend {
        response: Mutex::new(ApiResponse::ok("Status updated")),
        calls: Mutex::new(Vec::new()),
    });
    let source = FixtureSource {
        files: files.clone(),
        fetches: fetches.clone(),
        gate,
    };
    let backend_dyn: Arc<dyn ConfirmationBackend> = backend.clone();
    let manager =
        ConfirmationManager::with_collaborators(Settings::default(), Box::new(source), backend_dyn);

    Harness {
        manager,
        files,
        fetches,
        backend,
    }
}

async fn loaded() -> Harness {
    let h = harness();
    assert_eq!(h.manager.load().await.unwrap(), LoadOutcome::Loaded);
    h
}

fn acme_filter() -> FilterModel {
    FilterModel::new().with(
        "CounterpartyName",
        ColumnFilter::text(TextOperator::Contains, "acme"),
    )
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_new_with_default_settings() {
    let manager = ConfirmationManager::new(Settings::default()).unwrap();
    assert_eq!(manager.settings().api_base_url, "http://localhost:5005");
    assert!(manager.snapshot().matched.is_empty());
    assert!(format!("{manager:?}").contains("ConfirmationManager"));
}

#[test]
fn test_new_rejects_bad_backend_url() {
    let settings = Settings {
        api_base_url: "localhost".into(),
        ..Settings::default()
    };
    let err = ConfirmationManager::new(settings).unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
}

// ═══════════════════════════════════════════════════════════════════
// Loading & derived statuses
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_load_and_derive_statuses() {
    let h = loaded().await;
    assert_eq!(h.fetches.load(Ordering::SeqCst), 3);

    let rows = h.manager.email_rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].status, RowStatus::Derived(ReconciliationStatus::Difference));
    assert_eq!(rows[1].status, RowStatus::Derived(ReconciliationStatus::ConfirmationOk));
    assert_eq!(rows[2].status, RowStatus::Derived(ReconciliationStatus::Unrecognized));
}

#[tokio::test]
async fn test_persisted_status_is_shown_after_reload() {
    let h = loaded().await;
    h.set_file(
        "email_matches.json",
        r#"[{"InferredTradeID": 200, "CounterpartyName": "Globex", "status": "Resolved", "previous_status": ""}]"#,
    );
    h.manager.load().await.unwrap();

    let rows = h.manager.email_rows();
    assert_eq!(rows[0].status, RowStatus::Overridden(ReconciliationStatus::Resolved));
    assert!(rows[0].record.has_undo_history());
}

#[tokio::test]
async fn test_unknown_persisted_status_shows_derived_status() {
    let h = loaded().await;
    h.set_file(
        "email_matches.json",
        r#"[
            {"InferredTradeID": 200, "CounterpartyName": "Globex", "Currency1": "GBP", "QuantityCurrency1": 750, "status": "Escalated"},
            {"InferredTradeID": 100, "CounterpartyName": "ACME", "Currency1": "USD", "QuantityCurrency1": 1000000, "status": 7}
        ]"#,
    );
    assert_eq!(h.manager.load().await.unwrap(), LoadOutcome::Loaded);

    let rows = h.manager.email_rows();
    assert_eq!(rows[0].record.status, None);
    assert_eq!(rows[0].status, RowStatus::Derived(ReconciliationStatus::Difference));
    assert_eq!(rows[1].status, RowStatus::Derived(ReconciliationStatus::ConfirmationOk));
}

#[tokio::test]
async fn test_odd_trade_ids_do_not_fail_the_load() {
    let h = loaded().await;
    h.set_file(
        "matched_trades.json",
        r#"[
            {"TradeNumber": 100.0, "CounterpartyName": "ACME", "Currency1": "USD", "QuantityCurrency1": 1000000},
            {"TradeNumber": true, "CounterpartyName": "Globex"}
        ]"#,
    );
    h.set_file(
        "email_matches.json",
        r#"[
            {"InferredTradeID": 100.0, "CounterpartyName": "ACME", "Currency1": "USD", "QuantityCurrency1": 1000000},
            {"InferredTradeID": [1], "CounterpartyName": "Globex"}
        ]"#,
    );
    assert_eq!(h.manager.load().await.unwrap(), LoadOutcome::Loaded);

    let snapshot = h.manager.snapshot();
    assert_eq!(snapshot.matched[0].trade_number, TradeId::from(100));
    assert!(snapshot.matched[1].trade_number.is_unset());

    let rows = h.manager.email_rows();
    assert_eq!(rows[0].status, RowStatus::Derived(ReconciliationStatus::ConfirmationOk));
    assert_eq!(rows[1].record.inferred_trade_id, None);
    assert_eq!(rows[1].status, RowStatus::Derived(ReconciliationStatus::Unrecognized));
}

#[tokio::test]
async fn test_string_amount_is_a_difference_after_load() {
    let h = loaded().await;
    h.set_file(
        "email_matches.json",
        r#"[{"InferredTradeID": 100, "CounterpartyName": "ACME", "Currency1": "USD", "QuantityCurrency1": "1,000,000"}]"#,
    );
    h.manager.load().await.unwrap();

    let rows = h.manager.email_rows();
    assert_eq!(rows[0].status, RowStatus::Derived(ReconciliationStatus::Difference));
    let acme = h.manager.snapshot().matched[1].clone();
    assert!(h.manager.matched_row_has_difference(&acme));
}

#[tokio::test]
async fn test_overlapping_loads_are_coalesced() {
    let gate = Arc::new(Notify::new());
    let h = harness_with_gate(Some(gate.clone()));

    let first = h.manager.load();
    let second = async {
        while h.fetch_count() < 3 {
            tokio::task::yield_now().await;
        }
        assert!(h.manager.is_refreshing());
        let outcome = h.manager.load().await;

        // The view stays usable while the first load is in flight.
        let mirrored = h.manager.apply_filter(GridId::Matched, acme_filter());
        let trade = TradeRecord::new(100, Default::default());
        h.manager.select_matched(&trade);
        assert_eq!(h.manager.selection().selected_id, Some(TradeId::from(100)));

        gate.notify_waiters();
        (outcome, mirrored)
    };
    let (first, (second, mirrored)) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), LoadOutcome::Loaded);
    assert_eq!(second.unwrap(), LoadOutcome::Skipped);
    assert_eq!(h.fetch_count(), 3);
    assert!(!h.manager.is_refreshing());
    assert_eq!(mirrored, vec![GridId::EmailMatches, GridId::Unmatched]);
    assert_eq!(h.manager.filter_for(GridId::Unmatched), Some(acme_filter()));
    assert_eq!(h.manager.selection().selected_id, None);
    assert_eq!(h.manager.snapshot().matched.len(), 2);
}

#[tokio::test]
async fn test_failed_load_keeps_previous_data() {
    let h = loaded().await;
    h.set_file("matched_trades.json", "[{broken");

    let err = h.manager.load().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataShape);
    assert_eq!(h.manager.snapshot().matched.len(), 2);
}

// ═══════════════════════════════════════════════════════════════════
// Selection, ordering, highlighting
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_select_matched_orders_and_highlights() {
    let h = loaded().await;
    let snapshot = h.manager.snapshot();
    let globex = snapshot.find_matched(&TradeId::from(200)).unwrap();

    let resorts = h.manager.select_matched(globex);
    assert_eq!(
        resorts,
        vec![
            SortRequest::by_trade_id(GridId::Unmatched),
            SortRequest::by_trade_id(GridId::EmailMatches),
        ]
    );

    let matched: Vec<_> = h
        .manager
        .ordered_trades(GridId::Matched)
        .into_iter()
        .map(|t| t.trade_number)
        .collect();
    assert_eq!(matched, vec![TradeId::from(200), TradeId::from(100)]);

    let emails = h.manager.ordered_email_matches();
    assert_eq!(emails[0].record.inferred_trade_id, Some(TradeId::from(200)));
    assert!(h.manager.is_mismatched(TradeField::QuantityCurrency1, &emails[0].record));
    assert!(!h.manager.is_mismatched(TradeField::Currency1, &emails[0].record));
    assert!(!h.manager.is_mismatched(TradeField::QuantityCurrency1, &emails[1].record));
}

#[tokio::test]
async fn test_without_selection_rows_are_in_natural_order() {
    let h = loaded().await;
    let ids: Vec<_> = h
        .manager
        .ordered_email_matches()
        .into_iter()
        .map(|r| r.record.inferred_trade_id)
        .collect();
    assert_eq!(
        ids,
        vec![Some(TradeId::from(0)), Some(TradeId::from(100)), Some(TradeId::from(200))]
    );
}

#[tokio::test]
async fn test_select_email_resorts_trade_grids() {
    let h = loaded().await;
    let email = h.manager.snapshot().email_matches[1].clone();
    let resorts = h.manager.select_email(&email);
    assert_eq!(
        resorts,
        vec![
            SortRequest::by_trade_id(GridId::Unmatched),
            SortRequest::by_trade_id(GridId::Matched),
        ]
    );
    assert_eq!(h.manager.selection().selected_id, Some(TradeId::from(100)));
}

#[tokio::test]
async fn test_matched_row_difference() {
    let h = loaded().await;
    let snapshot = h.manager.snapshot();
    assert!(h.manager.matched_row_has_difference(&snapshot.matched[0]));
    assert!(!h.manager.matched_row_has_difference(&snapshot.matched[1]));
}

#[tokio::test]
async fn test_clear_selection() {
    let h = loaded().await;
    let email = h.manager.snapshot().email_matches[0].clone();
    h.manager.select_email(&email);
    assert!(h.manager.is_selected(Some(&TradeId::from(200))));
    assert!(h.manager.is_mismatched(TradeField::QuantityCurrency1, &email));

    h.manager.clear_selection();
    assert_eq!(h.manager.selection().selected_id, None);
    assert_eq!(h.manager.selection().selected_terms, None);
    assert!(!h.manager.is_selected(Some(&TradeId::from(200))));
    assert!(!h.manager.is_mismatched(TradeField::QuantityCurrency1, &email));

    let ids: Vec<_> = h
        .manager
        .ordered_trades(GridId::Matched)
        .into_iter()
        .map(|t| t.trade_number)
        .collect();
    assert_eq!(ids, vec![TradeId::from(100), TradeId::from(200)]);
}

#[tokio::test]
async fn test_reload_clears_selection() {
    let h = loaded().await;
    let trade = h.manager.snapshot().matched[0].clone();
    h.manager.select_matched(&trade);
    assert!(h.manager.selection().selected_id.is_some());

    h.manager.load().await.unwrap();
    assert_eq!(h.manager.selection().selected_id, None);
}

// ═══════════════════════════════════════════════════════════════════
// Filters
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_filter_is_mirrored_to_other_grids() {
    let h = loaded().await;

    let mirrored = h.manager.apply_filter(GridId::Matched, acme_filter());
    assert_eq!(mirrored, vec![GridId::EmailMatches, GridId::Unmatched]);
    assert!(h.manager.is_filter_active());

    assert_eq!(h.manager.visible_trades(GridId::Matched).len(), 1);
    assert!(h.manager.visible_trades(GridId::Unmatched).is_empty());
    let emails = h.manager.visible_email_rows();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].record.inferred_trade_id, Some(TradeId::from(100)));
}

#[tokio::test]
async fn test_filter_stays_local_when_sync_disabled() {
    let h = loaded().await;
    h.manager.set_sync_filters(false);
    assert!(!h.manager.settings().sync_filters);

    let mirrored = h.manager.apply_filter(GridId::Matched, acme_filter());
    assert!(mirrored.is_empty());
    assert_eq!(h.manager.filter_for(GridId::Matched), Some(acme_filter()));
    assert!(h.manager.filter_for(GridId::Unmatched).unwrap().is_empty());
    assert_eq!(h.manager.visible_trades(GridId::Unmatched).len(), 1);
}

#[tokio::test]
async fn test_email_grid_filters_on_displayed_status() {
    let h = loaded().await;
    h.manager.set_sync_filters(false);
    h.manager.apply_filter(
        GridId::EmailMatches,
        FilterModel::new().with("status", ColumnFilter::text(TextOperator::Equals, "difference")),
    );

    let rows = h.manager.visible_email_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].record.inferred_trade_id, Some(TradeId::from(200)));
}

// ═══════════════════════════════════════════════════════════════════
// Status lifecycle & clearing
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_tag_reloads_and_resets_selection() {
    let h = loaded().await;
    let email = h.manager.snapshot().email_matches[0].clone();
    h.manager.select_email(&email);

    let change = h.manager.tag(&email).await.unwrap();
    assert!(change.reloaded);
    assert_eq!(h.fetches.load(Ordering::SeqCst), 6);
    assert_eq!(h.manager.selection().selected_id, None);
    assert_eq!(
        h.backend.calls.lock().unwrap().clone(),
        vec!["update 200 Tagged".to_string()]
    );
}

#[tokio::test]
async fn test_rejected_undo_keeps_state() {
    let h = loaded().await;
    h.respond_with(ApiResponse::rejected("No previous status found to undo"));
    let email = h.manager.snapshot().email_matches[1].clone();
    h.manager.select_email(&email);

    let err = h.manager.undo(&email).await.unwrap_err();
    assert_eq!(err.user_message(), "Operation failed: No previous status found to undo");
    assert_eq!(h.fetches.load(Ordering::SeqCst), 3);
    assert_eq!(h.manager.selection().selected_id, Some(TradeId::from(100)));
}

#[tokio::test]
async fn test_resolve_sends_resolved() {
    let h = loaded().await;
    let email = h.manager.snapshot().email_matches[1].clone();
    h.manager.resolve(&email).await.unwrap();
    assert_eq!(
        h.backend.calls.lock().unwrap().clone(),
        vec!["update 100 Resolved".to_string()]
    );
}

#[tokio::test]
async fn test_clear_returns_backend_message() {
    let h = loaded().await;
    h.respond_with(ApiResponse::ok("email_matches.json cleared"));
    h.set_file("email_matches.json", "[]");

    let message = h.manager.clear(ClearTarget::EmailMatches).await.unwrap();
    assert_eq!(message, "email_matches.json cleared");
    assert!(h.manager.snapshot().email_matches.is_empty());
}

#[tokio::test]
async fn test_clear_legacy() {
    let h = loaded().await;
    let message = h.manager.clear_legacy(ClearTarget::MatchedTrades).await.unwrap();
    assert_eq!(message, "matched_trades cleared");
    assert_eq!(
        h.backend.calls.lock().unwrap().clone(),
        vec!["legacy matched_trades".to_string()]
    );
}

// ═══════════════════════════════════════════════════════════════════
// Settings & activity
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_update_settings_applies_sync_flag() {
    let h = harness();
    let settings = Settings {
        sync_filters: false,
        my_name: "Ana".into(),
        ..Settings::default()
    };
    h.manager.update_settings(settings).unwrap();
    assert_eq!(h.manager.settings().my_name, "Ana");
    assert!(h.manager.apply_filter(GridId::Unmatched, acme_filter()).is_empty());
}

#[test]
fn test_update_settings_validates() {
    let h = harness();
    let bad = Settings {
        api_base_url: "nope".into(),
        ..Settings::default()
    };
    assert!(h.manager.update_settings(bad).is_err());
    assert_eq!(h.manager.settings().api_base_url, "http://localhost:5005");
}

#[test]
fn test_fresh_manager_is_not_idle() {
    let h = harness();
    h.manager.touch();
    assert!(!h.manager.is_idle());
    assert!(!h.manager.is_filter_active());
}
