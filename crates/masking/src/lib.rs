//! Wrapper types for values that must never be casually `Display`ed, logged
//! or serialized to disk: card PANs and CVVs, API keys, webhook secrets, the
//! CyberSource HMAC key. `Secret<T, S>` redacts its `Debug` output and is
//! wiped from memory on drop; callers must opt in via [`PeekInterface`] to
//! read the wrapped value.

#![forbid(unsafe_code)]

use std::{fmt, marker::PhantomData};

use zeroize::Zeroize;

/// Masking strategy: controls how a [`Secret`] renders in `Debug` output.
pub trait Strategy<T> {
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// Default strategy: always prints a fixed placeholder, never the value.
#[derive(Debug)]
pub struct WithType;

impl<T> Strategy<T> for WithType {
    fn fmt(_value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*** redacted ***")
    }
}

/// A value that should not be logged, displayed, or persisted verbatim.
///
/// `Secret` intentionally does not implement `Display`. `Debug` always
/// prints the masking strategy's placeholder. Access the inner value only
/// through [`PeekInterface`], at the point it is actually needed (building
/// an outbound request, hashing, or similar).
pub struct Secret<T: Zeroize, S: Strategy<T> = WithType> {
    inner: T,
    _marker: PhantomData<S>,
}

impl<T: Zeroize, S: Strategy<T>> Secret<T, S> {
    pub fn new(value: T) -> Self {
        Self {
            inner: value,
            _marker: PhantomData,
        }
    }
}

impl<T: Zeroize + Clone, S: Strategy<T>> Clone for Secret<T, S> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<T: Zeroize, S: Strategy<T>> fmt::Debug for Secret<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        S::fmt(&self.inner, f)
    }
}

impl<T: Zeroize, S: Strategy<T>> Drop for Secret<T, S> {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl<T: Zeroize + Default, S: Strategy<T>> Default for Secret<T, S> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Zeroize, S: Strategy<T>> From<T> for Secret<T, S> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// Explicit, auditable access to the value a [`Secret`] wraps.
pub trait PeekInterface<T> {
    fn peek(&self) -> &T;
    fn into_inner(self) -> T;
}

impl<T: Zeroize + Default, S: Strategy<T>> PeekInterface<T> for Secret<T, S> {
    fn peek(&self) -> &T {
        &self.inner
    }

    fn into_inner(mut self) -> T {
        // Leave a zeroizable default behind for `Drop`; the real value
        // moves out to the caller untouched.
        std::mem::take(&mut self.inner)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::{Serialize, Serializer};
    use zeroize::Zeroize;

    use super::{Secret, Strategy};

    impl<T: Zeroize + Serialize, S: Strategy<T>> Serialize for Secret<T, S> {
        fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
        where
            Ser: Serializer,
        {
            self.peek().serialize(serializer)
        }
    }

    impl<'de, T: Zeroize + serde::Deserialize<'de>, S: Strategy<T>> serde::Deserialize<'de>
        for Secret<T, S>
    {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            T::deserialize(deserializer).map(Secret::new)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_the_secret() {
        let secret: Secret<String> = Secret::new("4111111111111111".to_string());
        let rendered = format!("{secret:?}");
        assert!(!rendered.contains("4111111111111111"));
    }

    #[test]
    fn peek_returns_the_original_value() {
        let secret: Secret<String> = Secret::new("sk_live_abc".to_string());
        assert_eq!(secret.peek(), "sk_live_abc");
    }
}
