use chrono::{DateTime, Utc};

/// A fact about a visit or a medicine, emitted once the change it describes
/// has been committed.
///
/// `event_type` names the fact on the wire as `<context>.<aggregate>.<fact>`
/// and never changes once published.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    /// Payload schema version, bumped on incompatible changes.
    fn schema_version(&self) -> u32 {
        1
    }

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;
}
