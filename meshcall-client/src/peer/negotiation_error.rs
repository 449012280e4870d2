use thiserror::Error;

#[derive(Debug, Error)]
pub enum NegotiationError {
    /// The connection refused a remote description.
    #[error("remote description rejected: {0:#}")]
    NegotiationRejected(anyhow::Error),

    #[error("failed to create {what}: {reason:#}")]
    LocalDescription {
        what: &'static str,
        reason: anyhow::Error,
    },
}

impl NegotiationError {
    pub(crate) fn local(what: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |reason| Self::LocalDescription { what, reason }
    }
}
