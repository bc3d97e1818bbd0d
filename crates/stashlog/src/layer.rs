//! Forwarding `tracing` events into a [`Logger`].

use crate::caller::CallerInfo;
use crate::render::Fields;
use crate::{Level, Logger};
use serde_json::Value;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// A [`Layer`] that writes every `tracing` event as a stashlog entry.
///
/// The event's `message` becomes the entry message, its other fields become
/// entry fields, and its source location becomes `file`/`line`. Events
/// emitted by stashlog itself are ignored.
///
/// ```rust
/// use stashlog::Logger;
/// use tracing_subscriber::layer::SubscriberExt;
///
/// let logger = Logger::new();
/// let subscriber = tracing_subscriber::registry().with(logger.layer());
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::info!(port = 8080, "listening");
/// });
/// ```
#[derive(Debug, Clone)]
pub struct StashLayer {
    logger: Logger,
}

impl StashLayer {
    /// Wraps `logger`.
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

/// Maps a `tracing` level onto the closest stashlog level.
#[must_use]
pub fn level_from_tracing(level: tracing::Level) -> Level {
    match level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

impl<S> Layer<S> for StashLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        // Our own diagnostics fire while the file lock is held.
        if meta.target().starts_with(env!("CARGO_CRATE_NAME")) {
            return;
        }

        let level = level_from_tracing(*meta.level());
        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let caller = CallerInfo::new(
            meta.file().unwrap_or("<unknown>"),
            meta.line().unwrap_or(0),
        );
        self.logger.log_at(
            level,
            visitor.message.as_deref().unwrap_or_default(),
            visitor.fields,
            caller,
        );
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Fields,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_from_tracing(tracing::Level::TRACE), Level::Debug);
        assert_eq!(level_from_tracing(tracing::Level::DEBUG), Level::Debug);
        assert_eq!(level_from_tracing(tracing::Level::INFO), Level::Info);
        assert_eq!(level_from_tracing(tracing::Level::WARN), Level::Warn);
        assert_eq!(level_from_tracing(tracing::Level::ERROR), Level::Error);
    }
}
