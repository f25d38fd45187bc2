//! # Bus Events
//!
//! Contract every payload carried by the bus must satisfy.

/// An event that can be fanned out through the bus.
///
/// Events are cloned once per receiver, so they should stay small.
pub trait BusEvent: Clone + Send + Sync + 'static {
    /// Short, stable name of the event kind. Used for logging only.
    fn kind(&self) -> &'static str;
}
