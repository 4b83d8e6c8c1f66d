//! Assertion macros for vault tests
//!
//! Each macro panics with the value it found, so a failing lifecycle test
//! shows the offending item or error instead of a bare `false`.

/// Unwrap an `Ok`, panicking with the error otherwise
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("expected Ok, got {:?}", e),
        }
    };
    ($result:expr, $context:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $context, e),
        }
    };
}

/// Expect an `Err`, optionally of a given shape
///
/// ```ignore
/// assert_err!(manager.get(id).await, ArchiveError::NotFound { .. });
/// ```
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        if let Ok(value) = $result {
            panic!("expected Err, got Ok({:?})", value);
        }
    };
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Err(e) => panic!("wrong error: {:?}", e),
            Ok(value) => panic!("expected Err, got Ok({:?})", value),
        }
    };
}

#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "{:?} does not contain {:?}",
            $haystack,
            $needle
        );
    };
}

/// `restore_expires_at` must be set exactly when the item is restored
#[macro_export]
macro_rules! assert_restore_window {
    ($item:expr) => {
        assert!(
            $item.has_consistent_restore_window(),
            "item {} is {} but restore_expires_at is {:?}",
            $item.id,
            $item.status,
            $item.restore_expires_at
        );
    };
}

/// Inclusive range check
#[macro_export]
macro_rules! assert_in_range {
    ($value:expr, $min:expr, $max:expr) => {{
        let value = $value;
        assert!(
            ($min..=$max).contains(&value),
            "{} outside [{}, {}]",
            value,
            $min,
            $max
        );
    }};
}
