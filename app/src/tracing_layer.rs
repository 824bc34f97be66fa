// In app/src/tracing_layer.rs

use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;

/// Appends every event to a log file as
/// `timestamp - LEVEL - target - message key=value ...`.
pub struct FileLogLayer {
    file: Mutex<File>,
}

impl FileLogLayer {
    /// Opens (or creates) `path` in append mode.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl<S> Layer<S> for FileLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        // Create a visitor to extract the message and fields from the event.
        let mut visitor = LogLineVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let line = format!(
            "{} - {} - {} - {}{}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            metadata.level(),
            metadata.target(),
            visitor.message,
            visitor.fields,
        );

        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = file.write_all(line.as_bytes()) {
            eprintln!("failed to write log line: {e}");
        }
    }
}

// Captures the `message` field and renders the others as ` key=value`.
#[derive(Default)]
struct LogLineVisitor {
    message: String,
    fields: String,
}

impl tracing::field::Visit for LogLineVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push_str(&format!(" {}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}
