//! The canonical data model (§3) and the adapter I/O contract (§4.4) that
//! every other crate in the workspace builds against. `router` depends on
//! this crate for its types but never the other way around — the same
//! layering the teacher enforces between `router` and
//! `hyperswitch_domain_models`.

pub mod api_key;
pub mod charge;
pub mod connector_types;
pub mod enums;
pub mod errors;
pub mod events;
pub mod merchant;
pub mod money;
pub mod payment_intent;
pub mod payment_method;
pub mod refund;
pub mod webhook;
