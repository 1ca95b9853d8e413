use crate::Canvas;

/// Writes a finished canvas somewhere durable.
pub trait PersistenceSink {
    /// The error returned when the canvas cannot be written.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Persist the canvas.
    fn persist(&self, canvas: &Canvas) -> Result<(), Self::Error>;
}
