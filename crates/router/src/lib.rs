//! Binds the workspace together: the payment orchestrator (C7/C8), the
//! mock/CyberSource adapters (C5/C6), the middleware pipeline (C9), the
//! HTTP surface (C10), and the event emitter (C11's synchronous half).
//! `crates::storage_impl`/`hyperswitch_interfaces`/`redis_interface` supply
//! everything below the line; this crate is the one that actually answers
//! HTTP requests.

pub mod adapters;
pub mod app_state;
pub mod balance_ledger;
pub mod configs;
pub mod core;
pub mod customer_directory;
pub mod kv_fallback;
pub mod middleware;
pub mod routes;

pub use app_state::AppState;
pub use configs::Settings;
