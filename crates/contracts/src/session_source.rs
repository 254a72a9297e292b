//! SessionSource trait - Acquisition collaborator abstraction
//!
//! Decouples the replay pipeline from where raw telemetry comes from
//! (recorded files, a synthetic generator, a remote provider).

use crate::{ReplayError, SessionData, SessionKey};

/// Acquisition collaborator
///
/// Implementations return the complete raw dataset for one event. A failure
/// here is fatal to the request and must be reported as
/// [`ReplayError::Acquisition`].
///
/// # Example
///
/// ```ignore
/// let source = FileSessionSource::new("data");
/// let session = source.load(&SessionKey::new(2023, "Monza", "R")).await?;
/// println!("{} entities", session.entities.len());
/// ```
#[trait_variant::make(SessionSource: Send)]
pub trait LocalSessionSource {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Acquire the raw dataset of one session
    ///
    /// # Errors
    /// Returns `ReplayError::Acquisition` when the session is unknown or the
    /// provider is unavailable.
    async fn load(&self, key: &SessionKey) -> Result<SessionData, ReplayError>;
}
