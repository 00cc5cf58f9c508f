use thiserror::Error;

/// Failure reported by a [`Host`](crate::Host) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host instance {instance} missing")]
    Missing { instance: String },
    #[error("host instance {child} is not attached to {parent}")]
    NotAttached { child: String, parent: String },
    #[error("host rejected operation: {reason}")]
    Rejected { reason: String },
}

/// Recoverable failure that aborts a render pass.
///
/// When a pass fails the work-in-progress generation is discarded and the
/// committed tree is left exactly as it was.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("component `{component}` failed to render")]
    Component {
        component: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("an update was dispatched while a render pass held the root")]
    RenderInProgress,
}

/// Breach of the hook call-order contract.
///
/// These are programming errors: the engine raises them with `panic!` and
/// never catches them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookViolation {
    #[error("component `{component}` rendered more hooks than during its previous render (hook #{index})")]
    ExtraHook { component: &'static str, index: usize },
    #[error("component `{component}` called {actual} hooks but its previous render called {expected}")]
    MissingHooks {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("hook #{index} of component `{component}` changed kind or state type between renders")]
    SlotMismatch { component: &'static str, index: usize },
}
