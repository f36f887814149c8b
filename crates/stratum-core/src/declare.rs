//! Compile-time marker types for high level names.
//!
//! The registry is keyed by strings. Declaring a marker per high level name
//! lets call sites write `registry.new_error_of::<AuthError>("BAD_TOKEN")`
//! and `registry.is::<AuthError>(&err)` instead of repeating the key.

/// A zero-sized marker bound to one high level table key.
pub trait HighLevelKind {
    /// The high level table key, e.g. `"AUTH_ERROR"`.
    const NAME: &'static str;
}

/// Declare marker types implementing [`HighLevelKind`].
///
/// ```rust
/// use stratum_core::{HighLevelKind, declare_high_level_errors};
///
/// declare_high_level_errors! {
///     /// Authentication failures.
///     (AuthError, "AUTH_ERROR"),
///     (InternalServerError, "INTERNAL_SERVER_ERROR"),
/// }
///
/// assert_eq!(AuthError::NAME, "AUTH_ERROR");
/// ```
#[macro_export]
macro_rules! declare_high_level_errors {
    ( $( $(#[$meta:meta])* ($ty:ident, $name:expr) ),* $(,)? ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            pub struct $ty;

            impl $crate::HighLevelKind for $ty {
                const NAME: &'static str = $name;
            }
        )*
    };
}
