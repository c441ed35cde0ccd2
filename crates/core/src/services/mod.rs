pub mod data_store;
pub mod filter_service;
pub mod format_service;
pub mod reconciliation_service;
pub mod selection_service;
pub mod status_service;
