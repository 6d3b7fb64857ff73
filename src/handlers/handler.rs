//! # Handler: tagged unit of behavior invoked per posted event.
//!
//! A [`Handler`] wraps a closure that receives the event [`Payload`]. Its variant
//! is fixed when it is built:
//! - [`Handler::new_sync`]: a blocking closure, run to completion on tokio's
//!   blocking pool so it never stalls the async workers;
//! - [`Handler::new_async`]: a closure producing a fresh future per invocation,
//!   awaited inside the work unit.
//!
//! ## Identity
//! Cloning a handler is cheap and keeps its identity: clones compare equal,
//! separately built handlers never do (even when wrapping the same fn item).
//! Subscribing a clone twice is a duplicate registration.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Handler, HandlerError, HandlerKind, Payload};
//!
//! let audit = Handler::new_sync("audit", |p: Payload| {
//!     println!("{:?}", p.get("dummy_data"));
//!     Ok(())
//! });
//! let notify = Handler::new_async("notify", |_p: Payload| async move {
//!     Ok::<_, HandlerError>(())
//! });
//!
//! assert_eq!(audit.kind(), HandlerKind::Sync);
//! assert!(notify.is_async());
//! assert_eq!(audit, audit.clone());
//! assert_ne!(audit, notify);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;

use crate::error::{HandlerError, panic_info};
use crate::handlers::Payload;

/// Boxed future returned by async handlers.
pub type BoxHandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'static>>;

type SyncFn = dyn Fn(Payload) -> Result<(), HandlerError> + Send + Sync + 'static;
type AsyncFn = dyn Fn(Payload) -> BoxHandlerFuture + Send + Sync + 'static;

/// Which variant a [`Handler`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Runs to completion on a blocking thread.
    Sync,
    /// Awaited inside the work unit.
    Async,
}

#[derive(Clone)]
enum Callable {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

/// Named, cloneable handler.
#[derive(Clone)]
pub struct Handler {
    name: Cow<'static, str>,
    call: Callable,
}

impl Handler {
    /// Builds a synchronous handler.
    pub fn new_sync<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Payload) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Callable::Sync(Arc::new(f)),
        }
    }

    /// Builds an asynchronous handler.
    ///
    /// The closure is called once per invocation and must return a new future.
    pub fn new_async<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let boxed = move |p: Payload| -> BoxHandlerFuture { Box::pin(f(p)) };
        Self {
            name: name.into(),
            call: Callable::Async(Arc::new(boxed)),
        }
    }

    /// Returns the handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the handler variant.
    pub fn kind(&self) -> HandlerKind {
        match self.call {
            Callable::Sync(_) => HandlerKind::Sync,
            Callable::Async(_) => HandlerKind::Async,
        }
    }

    #[inline]
    pub fn is_async(&self) -> bool {
        self.kind() == HandlerKind::Async
    }

    /// Returns `true` if both handles wrap the same closure allocation.
    pub fn ptr_eq(a: &Handler, b: &Handler) -> bool {
        std::ptr::eq(a.identity(), b.identity())
    }

    fn identity(&self) -> *const () {
        match &self.call {
            Callable::Sync(f) => Arc::as_ptr(f) as *const (),
            Callable::Async(f) => Arc::as_ptr(f) as *const (),
        }
    }

    /// Runs the handler once, converting panics into [`HandlerError::Panicked`].
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) async fn invoke(&self, payload: Payload) -> Result<(), HandlerError> {
        match &self.call {
            Callable::Sync(f) => {
                let f = Arc::clone(f);
                match tokio::task::spawn_blocking(move || f(payload)).await {
                    Ok(res) => res,
                    Err(je) if je.is_panic() => Err(HandlerError::Panicked {
                        info: panic_info(&*je.into_panic()),
                    }),
                    Err(je) => Err(HandlerError::Failed {
                        error: je.to_string(),
                    }),
                }
            }
            Callable::Async(f) => {
                let f = Arc::clone(f);
                let fut = async move { f(payload).await };
                match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(res) => res,
                    Err(panic_err) => Err(HandlerError::Panicked {
                        info: panic_info(&*panic_err),
                    }),
                }
            }
        }
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        Handler::ptr_eq(self, other)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn noop(_: Payload) -> Result<(), HandlerError> {
        Ok(())
    }

    #[test]
    fn test_identity_survives_clone_only() {
        let a = Handler::new_sync("a", noop);
        let b = Handler::new_sync("a", noop);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_sync_handler_runs_with_payload() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = {
            let hits = hits.clone();
            Handler::new_sync("count", move |p: Payload| {
                assert_eq!(p.get("n").and_then(|v| v.as_u64()), Some(7));
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        let payload = Payload::try_from(serde_json::json!({"n": 7})).unwrap();
        h.invoke(payload).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_error_is_returned() {
        let h = Handler::new_async("fails", |_p: Payload| async move {
            Err(HandlerError::fail("nope"))
        });
        let err = h.invoke(Payload::empty()).await.unwrap_err();
        assert_eq!(err, HandlerError::fail("nope"));
    }

    #[tokio::test]
    async fn test_panics_are_captured_for_both_variants() {
        let s = Handler::new_sync("sync-boom", |_p: Payload| -> Result<(), HandlerError> {
            panic!("sync boom")
        });
        let a = Handler::new_async("async-boom", |_p: Payload| async move {
            if true {
                panic!("async boom");
            }
            Ok::<_, HandlerError>(())
        });

        assert_eq!(
            s.invoke(Payload::empty()).await.unwrap_err(),
            HandlerError::Panicked {
                info: "sync boom".into()
            }
        );
        assert_eq!(
            a.invoke(Payload::empty()).await.unwrap_err(),
            HandlerError::Panicked {
                info: "async boom".into()
            }
        );
    }
}
