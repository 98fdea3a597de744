//! Injected Observability Sink

use tracing::Dispatch;

/// Log destination handed to each pipeline stage
///
/// With no dispatch the stage logs to whatever subscriber is globally
/// installed. With a dispatch, every event the stage emits goes to that
/// dispatch only, for the duration of the stage call.
#[derive(Debug, Clone, Default)]
pub struct ObservabilitySink {
    dispatch: Option<Dispatch>,
}

impl ObservabilitySink {
    /// Sink that forwards to the global subscriber
    pub fn ambient() -> Self {
        Self::default()
    }

    /// Sink bound to a specific dispatch
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Sink that discards everything
    pub fn silent() -> Self {
        Self::new(Dispatch::new(tracing::subscriber::NoSubscriber::default()))
    }

    /// Run `f` with this sink as the active log destination
    pub fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_scope_returns_value() {
        assert_eq!(ObservabilitySink::ambient().in_scope(|| 7), 7);
        assert_eq!(
            ObservabilitySink::silent().in_scope(|| {
                tracing::info!("discarded");
                "done"
            }),
            "done"
        );
    }
}
