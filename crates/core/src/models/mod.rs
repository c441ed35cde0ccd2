pub mod api;
pub mod email;
pub mod field;
pub mod filter;
pub mod grid;
pub mod settings;
pub mod snapshot;
pub mod status;
pub mod trade;
