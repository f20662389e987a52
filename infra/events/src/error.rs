use std::borrow::Cow;

/// Errors and diagnostics produced by event bus operations.
///
/// `publish` never returns these. Handler faults are captured per invocation,
/// logged, and collected in a [`DispatchReport`](crate::DispatchReport).
#[ember_derive::ember_error]
pub enum EventBusError {
    /// Caller misuse: a value the bus cannot accept.
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The same handler is already registered for this event kind.
    #[error("Duplicate subscription{}: {message}", format_context(.context))]
    DuplicateSubscription { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A handler returned an error or panicked while handling an event.
    #[error("Handler failure{}: {message}", format_context(.context))]
    HandlerFailure { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A stored handler does not accept the published payload type.
    /// This indicates an invariant violation in the kind registry.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal event bus error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl EventBusError {
    /// Short stable label for log fields.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::DuplicateSubscription { .. } => "duplicate_subscription",
            Self::HandlerFailure { .. } => "handler_failure",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::Internal { .. } => "internal",
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument { message: message.into(), context: None }
    }
}
