//! Unified error type.

/// A failure raised inside the pipeline.
///
/// Expected rejections (bad origin, malformed body, failed validation) are
/// expressed as [`Envelope`](crate::Envelope) values, not as `Error`s. This
/// type covers what the error boundary has to contain: a business handler
/// returning `Err`, a body that cannot be serialized, or a panic.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The business handler returned an error.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),

    /// The business handler's output could not be rendered as JSON.
    #[error("failed to serialize response body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A handler panicked, either while building its future or while it ran.
    #[error("handler panicked: {0}")]
    Panic(String),
}

impl Error {
    /// Builds an [`Error::Panic`] from the payload `catch_unwind` hands back.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        Self::Panic(msg)
    }
}
