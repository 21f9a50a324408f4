//! The Clock/Random/Crypto port (`crypto`, `date_time`), id generation
//! (`ids`), and the small error-stack/ext-trait glue (`errors`,
//! `ext_traits`) that the rest of the workspace builds on. Nothing in this
//! crate knows about payments; it is the leaf of the dependency graph,
//! exactly as the teacher's `common_utils` is.

pub mod crypto;
pub mod date_time;
pub mod errors;
pub mod ext_traits;
pub mod ids;

#[cfg(feature = "signals")]
pub mod signals;
