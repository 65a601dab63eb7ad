//! Utility macros shared by the value objects.

/// Returns early with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// Every `with_*` mutator uses it to validate its argument before cloning the receiver.
///
/// # Example
///
/// ```ignore
/// ensure!(port <= u16::MAX.into(), MessageError::invalid_argument("port out of range"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
