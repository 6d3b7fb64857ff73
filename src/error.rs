//! Error types used by the eventvisor dispatcher and its handlers.
//!
//! This module defines two main error enums:
//!
//! - [`DispatchError`]: errors returned synchronously by dispatcher operations
//!   (`start`, `post`, payload construction).
//! - [`HandlerError`]: faults raised by individual handler invocations. These are
//!   never returned to the poster; they are captured per work unit and reported
//!   as [`Notice`](crate::Notice)s.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

use crate::core::LifecycleState;

/// # Errors returned by dispatcher operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The dispatcher is not in the `Running` state (never started, draining or stopped).
    #[error("dispatcher is not running")]
    NotRunning,

    /// No handler is registered for the posted event type.
    #[error("no subscription found with '{event_type}'")]
    NoSubscribers {
        /// Event type that was posted.
        event_type: String,
    },

    /// A handler supplied for registration cannot be invoked.
    #[error("invalid handler for '{event_type}': {reason}")]
    InvalidHandler {
        /// Event type the handler was meant for.
        event_type: String,
        /// Why the handler was rejected.
        reason: String,
    },

    /// `start()` was called while the dispatcher was already active.
    #[error("dispatcher is already active (state: {state})")]
    AlreadyRunning {
        /// State observed when `start()` was rejected.
        state: LifecycleState,
    },

    /// A payload could not be built from the supplied value.
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// Why the value was rejected.
        reason: String,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::DispatchError;
    ///
    /// let err = DispatchError::NoSubscribers { event_type: "evt.a".into() };
    /// assert_eq!(err.as_label(), "dispatch_no_subscribers");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NotRunning => "dispatch_not_running",
            DispatchError::NoSubscribers { .. } => "dispatch_no_subscribers",
            DispatchError::InvalidHandler { .. } => "dispatch_invalid_handler",
            DispatchError::AlreadyRunning { .. } => "dispatch_already_running",
            DispatchError::InvalidPayload { .. } => "dispatch_invalid_payload",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::NotRunning => "dispatcher is not running".to_string(),
            DispatchError::NoSubscribers { event_type } => {
                format!("no subscription found with '{event_type}'")
            }
            DispatchError::InvalidHandler { event_type, reason } => {
                format!("invalid handler: event_type={event_type} reason={reason}")
            }
            DispatchError::AlreadyRunning { state } => format!("already active: state={state}"),
            DispatchError::InvalidPayload { reason } => format!("invalid payload: {reason}"),
        }
    }
}

/// # Faults raised by a single handler invocation.
///
/// A handler signals failure by returning [`HandlerError::Failed`]. Panics inside
/// a handler are caught by the worker pool and converted to [`HandlerError::Panicked`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler returned an error.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Handler panicked while running.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Failed`].
    ///
    /// ```
    /// use eventvisor::HandlerError;
    ///
    /// let err = HandlerError::fail("disk full");
    /// assert_eq!(err.to_string(), "handler failed: disk full");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Indicates whether the fault was a panic rather than a returned error.
    pub fn is_panic(&self) -> bool {
        matches!(self, HandlerError::Panicked { .. })
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
