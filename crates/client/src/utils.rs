//! Small helpers shared across the crate.

/// Returns early with `$error` unless `$predicate` holds.
///
/// ```ignore
/// ensure!(!self.read_only, HttpError::unsupported_operation("headers are read-only"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error.into());
        }
    };
}

pub(crate) use ensure;
