//! Logic layered on top of the session state.

/// Async session driver: clock, delayed phase changes and observation.
pub mod clock;
/// Broadcast hub for session events.
pub mod events;
/// Encouragement and study suggestions derived from a score report.
pub mod feedback;
/// Per-question review of a finished session.
pub mod review;
/// Score report computation.
pub mod scoring;
