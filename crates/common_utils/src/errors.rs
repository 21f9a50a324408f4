//! `error_stack`-flavoured result alias used throughout the workspace, plus
//! the small leaf errors that `ext_traits` raises before a higher-level
//! crate has a chance to attach its own error taxonomy via `change_context`.

pub type CustomResult<T, E> = error_stack::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[error("required field `{0}` was missing")]
pub struct MissingRequiredField(pub &'static str);

#[derive(Debug, thiserror::Error)]
#[error("value did not parse as {expected}")]
pub struct ParsingError {
    pub expected: &'static str,
}
