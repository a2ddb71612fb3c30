//! Memo-on-reentry helper
//!
//! After a resume the engine runs the interrupting node again, and review loops
//! send control back through nodes that already ran. A node with an expensive or
//! side-effecting computation should therefore check whether its output field is
//! already present and hand the stored value back instead of recomputing:
//!
//! ```rust
//! use waypoint_core::{memo::memoize, RunState};
//! use serde_json::json;
//!
//! # async fn demo() -> waypoint_core::Result<()> {
//! let state = RunState::new().with("summary", "cached");
//! let update = memoize(&state, "summary", || async { Ok(json!("expensive")) }).await?;
//! assert_eq!(update.get("summary"), Some(&json!("cached")));
//! # Ok(())
//! # }
//! ```
//!
//! Presence means "not absent and not `null`"; an empty string is a real value.
//! The returned update re-sets the field, so memoize replace-reduced fields only.

use crate::error::Result;
use crate::state::{PartialUpdate, RunState};
use serde_json::Value;
use std::future::Future;
use tracing::debug;

/// Return `{field: stored}` if `field` is present, otherwise `{field: compute().await?}`
pub async fn memoize<F, Fut>(state: &RunState, field: &str, compute: F) -> Result<PartialUpdate>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    if let Some(stored) = state.get(field) {
        debug!(field, "Reusing stored value");
        return Ok(PartialUpdate::new().set(field, stored.clone()));
    }
    let value = compute().await?;
    Ok(PartialUpdate::new().set(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_computes_once_then_reuses() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let compute = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!("generated"))
        };

        let state = RunState::new().with("code", Value::Null);
        let first = memoize(&state, "code", compute).await.unwrap();
        assert_eq!(first.get("code"), Some(&json!("generated")));

        let state = state.with("code", "generated").with("__decision__", "approve");
        let second = memoize(&state, "code", compute).await.unwrap();
        assert_eq!(second.get("code"), Some(&json!("generated")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_string_counts_as_present() {
        let state = RunState::new().with("notes", "");
        let update = memoize(&state, "notes", || async { Ok(json!("recomputed")) })
            .await
            .unwrap();
        assert_eq!(update.get("notes"), Some(&json!("")));
    }

    #[tokio::test]
    async fn test_compute_errors_propagate() {
        let err = memoize(&RunState::new(), "x", || async {
            Err(crate::GraphError::node_execution("n", "boom"))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
