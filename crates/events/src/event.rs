use chrono::{DateTime, Utc};

/// A fact emitted by an aggregate.
///
/// Events are immutable, versioned for schema evolution and only ever appended.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable dotted name, e.g. `"inventory.stock.changed"`.
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// Business time at which the fact occurred.
    fn occurred_at(&self) -> DateTime<Utc>;
}
