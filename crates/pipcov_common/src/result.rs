//! Internal error type for bookkeeping bugs.

/// Result type for operations that can only fail because of a pipcov bug.
pub type PipcovResult<T> = Result<T, InternalError>;

/// A violated internal invariant.
///
/// Raised when the resource bookkeeping contradicts itself: two Cuts sharing
/// an edge, a clock group rebound to the other domain, a rollback that finds
/// a different state than it recorded. Never a normal search outcome; the
/// caller is expected to stop the run and report the offending location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("edge reused");
        assert_eq!(format!("{err}"), "internal error: edge reused");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "clock rebind".to_string().into();
        assert_eq!(err.message, "clock rebind");
    }

    #[test]
    fn question_mark_propagates() {
        fn inner() -> PipcovResult<u32> {
            Err(InternalError::new("boom"))
        }
        fn outer() -> PipcovResult<u32> {
            let v = inner()?;
            Ok(v + 1)
        }
        assert_eq!(outer().unwrap_err().message, "boom");
    }
}
