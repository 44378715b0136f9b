//! Guest-facing logging surface and the host print sinks behind it.
//!
//! The console installed on the global surface has exactly two entry points,
//! `log` and `error`, and both route to the same print primitive: the
//! runtime deliberately draws no severity distinction between them.
//!
//! # Serialization policy
//!
//! Text arguments are emitted verbatim, with no quoting or escaping. Every
//! other argument is rendered in the canonical structured-data encoding.
//! Pieces are joined with a single ASCII space and the finished message gets
//! one trailing newline. A value that cannot be encoded fails the whole call
//! with [`SerializationError`] before anything reaches the sink.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::value::{SerializationError, Value};

/// Host print primitive. Accepts one string, performs output, returns
/// nothing; fire-and-forget from the guest's perspective.
pub trait PrintSink {
    /// Emit one already-formatted chunk of output.
    fn print(&self, text: &str);
}

/// The restricted console object installed on the global surface.
pub struct Console {
    sink: Rc<dyn PrintSink>,
}

impl Console {
    /// Build a console over the given print primitive.
    pub fn new(sink: Rc<dyn PrintSink>) -> Self {
        Self { sink }
    }

    /// Log a sequence of guest values.
    ///
    /// # Errors
    ///
    /// Propagates [`SerializationError`] from the formatter; in that case no
    /// partial output is emitted.
    pub fn log(&self, args: &[Value]) -> Result<(), SerializationError> {
        self.emit(args)
    }

    /// Same routing as [`Console::log`]; no severity-based filtering.
    pub fn error(&self, args: &[Value]) -> Result<(), SerializationError> {
        self.emit(args)
    }

    fn emit(&self, args: &[Value]) -> Result<(), SerializationError> {
        let message = args_to_message(args)?;
        self.sink.print(&format!("{message}\n"));
        Ok(())
    }
}

/// Render log arguments into a single message: text verbatim, everything
/// else in canonical structured encoding, joined with single spaces.
pub fn args_to_message(args: &[Value]) -> Result<String, SerializationError> {
    let mut pieces = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Value::Text(text) => pieces.push(text.clone()),
            other => pieces.push(other.to_canonical_json()?),
        }
    }
    Ok(pieces.join(" "))
}

/// A single line captured from the guest console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// UTC timestamp when the line was captured.
    pub timestamp: DateTime<Utc>,
    /// The printed text, trailing newline included.
    pub message: String,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            message,
        }
    }
}

/// Shared buffer type for captured guest output.
pub type LogStorage = Rc<RefCell<Vec<LogEntry>>>;

/// Print sink that buffers output so the host can collect it after a run.
#[derive(Default)]
pub struct CaptureSink {
    entries: LogStorage,
}

impl CaptureSink {
    /// Create an empty capture buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the shared buffer; clones observe later prints.
    pub fn storage(&self) -> LogStorage {
        Rc::clone(&self.entries)
    }

    /// Snapshot of the captured messages, in print order.
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }
}

impl PrintSink for CaptureSink {
    fn print(&self, text: &str) {
        self.entries.borrow_mut().push(LogEntry::new(text.to_string()));
    }
}

/// Print sink that streams output through an unbounded channel.
///
/// Send failures are ignored: once the receiver is gone the output is
/// dropped, and the guest never observes the difference.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Stream prints into the given channel.
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

impl PrintSink for ChannelSink {
    fn print(&self, text: &str) {
        let _ = self.sender.send(text.to_string());
    }
}

/// Print sink that routes through the `log` facade.
pub struct LoggerSink;

impl PrintSink for LoggerSink {
    fn print(&self, text: &str) {
        // Both console entry points land here at the same level.
        info!("[guest]: {}", text.trim_end_matches('\n'));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FunctionRef;
    use std::collections::BTreeMap;

    fn capture_console() -> (Console, CaptureSink) {
        let sink = CaptureSink::new();
        let console = Console::new(Rc::new(CaptureSink {
            entries: sink.storage(),
        }));
        (console, sink)
    }

    #[test]
    fn text_arguments_are_verbatim() {
        let (console, sink) = capture_console();
        console.log(&[Value::text("plain \"text\"")]).unwrap();
        assert_eq!(sink.messages(), vec!["plain \"text\"\n".to_string()]);
    }

    #[test]
    fn mixed_arguments_are_space_joined() {
        let (console, sink) = capture_console();
        console
            .log(&[
                Value::text("count:"),
                Value::number(3.0),
                Value::object(BTreeMap::from([("a".to_string(), Value::number(1.0))])),
            ])
            .unwrap();
        assert_eq!(sink.messages(), vec!["count: 3 {\"a\":1}\n".to_string()]);
    }

    #[test]
    fn error_routes_to_the_same_sink() {
        let (console, sink) = capture_console();
        console.log(&[Value::text("first")]).unwrap();
        console.error(&[Value::text("second")]).unwrap();
        // Same sink, same format, no severity tagging.
        assert_eq!(
            sink.messages(),
            vec!["first\n".to_string(), "second\n".to_string()]
        );
    }

    #[test]
    fn empty_argument_list_prints_a_bare_newline() {
        let (console, sink) = capture_console();
        console.log(&[]).unwrap();
        assert_eq!(sink.messages(), vec!["\n".to_string()]);
    }

    #[test]
    fn cyclic_argument_fails_with_no_partial_output() {
        let (console, sink) = capture_console();
        let items = Rc::new(RefCell::new(Vec::new()));
        items.borrow_mut().push(Value::Array(Rc::clone(&items)));
        let result = console.log(&[Value::text("before"), Value::Array(items)]);
        assert_eq!(result, Err(SerializationError::Cyclic));
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn function_argument_fails_with_no_partial_output() {
        let (console, sink) = capture_console();
        let result = console.error(&[Value::function(FunctionRef::named(
            "runBenchmarks",
            Rc::new(()),
        ))]);
        assert_eq!(result, Err(SerializationError::Unsupported("function")));
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn channel_sink_streams_messages() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let console = Console::new(Rc::new(ChannelSink::new(sender)));
        console.log(&[Value::text("streamed")]).unwrap();
        assert_eq!(receiver.recv().await.unwrap(), "streamed\n");
    }

    #[test]
    fn channel_sink_ignores_a_closed_receiver() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);
        let console = Console::new(Rc::new(ChannelSink::new(sender)));
        console.log(&[Value::text("dropped")]).unwrap();
    }

    #[test]
    fn capture_entries_are_timestamped() {
        let (console, sink) = capture_console();
        console.log(&[Value::text("stamped")]).unwrap();
        let storage = sink.storage();
        let entries = storage.borrow();
        assert_eq!(entries.len(), 1);
        let age = Utc::now().signed_duration_since(entries[0].timestamp);
        assert!(age.num_seconds() < 1);
    }
}
