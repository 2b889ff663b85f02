//! Log capture for unit tests.
//!
//! A process-wide logger that appends records to a per-thread buffer, so
//! tests running in parallel only see their own records.

use std::cell::RefCell;
use std::sync::Once;

use log::kv::{self, Key, Value, VisitSource};
use log::{Level, LevelFilter, Log, Metadata, Record};

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl CapturedRecord {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

thread_local! {
    static RECORDS: RefCell<Option<Vec<CapturedRecord>>> = const { RefCell::new(None) };
}

struct CaptureLogger;

static LOGGER: CaptureLogger = CaptureLogger;

struct Fields(Vec<(String, String)>);

impl<'kvs> VisitSource<'kvs> for Fields {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        self.0.push((key.to_string(), value.to_string()));
        Ok(())
    }
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            if let Some(records) = records.borrow_mut().as_mut() {
                let mut fields = Fields(Vec::new());
                let _ = record.key_values().visit(&mut fields);
                records.push(CapturedRecord {
                    level: record.level(),
                    message: record.args().to_string(),
                    fields: fields.0,
                });
            }
        });
    }

    fn flush(&self) {}
}

/// Run `f` and return its result with every record it logged on this thread.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<CapturedRecord>) {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });

    RECORDS.with(|records| *records.borrow_mut() = Some(Vec::new()));
    let result = f();
    let records = RECORDS
        .with(|records| records.borrow_mut().take())
        .unwrap_or_default();
    (result, records)
}
