use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSON-lines layout log. Cloned handles share one writer, so parallel passes
/// interleave whole lines. Counters live with each pass in [`DebugCounters`].
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<BufWriter<File>>>,
}

/// Event counts for one layout pass, written out by
/// [`DebugLogger::emit_summary`].
#[derive(Debug, Clone, Default)]
pub(crate) struct DebugCounters {
    counts: BTreeMap<String, u64>,
}

impl DebugCounters {
    pub fn increment(&mut self, key: &str, amount: u64) {
        let entry = self.counts.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Writes one event line: `{"type": <kind>, ...fields}`.
    pub fn log_event(&self, kind: &str, fields: Value) {
        let mut line = Map::new();
        line.insert("type".to_string(), Value::String(kind.to_string()));
        if let Value::Object(fields) = fields {
            line.extend(fields);
        }
        self.write_line(&Value::Object(line));
    }

    pub fn emit_summary(&self, context: &str, counters: &DebugCounters) {
        self.write_line(&json!({
            "type": "debug.summary",
            "context": context,
            "counts": counters.counts,
        }));
    }

    pub fn flush(&self) {
        if let Ok(mut writer) = self.inner.lock() {
            let _ = writer.flush();
        }
    }

    fn write_line(&self, line: &Value) {
        if let Ok(mut writer) = self.inner.lock() {
            let _ = writeln!(writer, "{line}");
        }
    }
}
