//! Opt-in local telemetry for the hwprog tools.
//!
//! Nothing leaves the machine. Usage events go through a bounded queue to a
//! writer thread that appends them to a JSONL file under the data dir; panics
//! can be written as crash reports next to it. Both are off unless enabled
//! through the environment.

use std::any::Any;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

const QUEUE_DEPTH: usize = 128;
const ROTATE_AT_BYTES: u64 = 1024 * 1024;

const USAGE_ENV: &str = "HWPROG_TELEMETRY";
const CRASH_ENV: &str = "HWPROG_TELEMETRY_CRASH";
const INSTALL_ID_ENV: &str = "HWPROG_TELEMETRY_INSTALL_ID";

#[derive(Clone, Debug)]
pub struct Settings {
    pub app: &'static str,
    pub version: &'static str,
    pub usage: bool,
    pub crashes: bool,
    pub install_id: Option<String>,
    /// Events land in `<root>/<app>/`.
    pub root: PathBuf,
}

impl Settings {
    pub fn from_env(app: &'static str, version: &'static str) -> Self {
        Self {
            app,
            version,
            usage: truthy(std::env::var(USAGE_ENV).ok().as_deref()),
            crashes: truthy(std::env::var(CRASH_ENV).ok().as_deref()),
            install_id: std::env::var(INSTALL_ID_ENV).ok(),
            root: telemetry_root(),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct UsageEvent {
    pub event_type: String,
    pub at_unix_millis: i64,
    pub app: String,
    pub version: String,
    pub session_id: String,
    pub install_id: Option<String>,
    pub properties: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct CrashReport<'a> {
    at_unix_millis: i64,
    app: &'a str,
    version: &'a str,
    session_id: &'a str,
    message: String,
    location: Option<String>,
}

/// Event sink for one process. The writer thread only exists while usage
/// events are enabled and the recorder has not been shut down.
pub struct Recorder {
    settings: Settings,
    session_id: String,
    log: EventLog,
    queue: Mutex<Option<SyncSender<UsageEvent>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

static RECORDER: OnceLock<Arc<Recorder>> = OnceLock::new();

/// Installs the process-wide recorder. Later calls return the first one.
pub fn install(settings: Settings) -> Arc<Recorder> {
    let recorder = RECORDER.get_or_init(|| {
        let recorder = Arc::new(Recorder::start(settings));
        if recorder.settings.crashes {
            hook_panics(Arc::clone(&recorder));
        }
        recorder
    });
    Arc::clone(recorder)
}

pub fn install_from_env(app: &'static str, version: &'static str) -> Arc<Recorder> {
    install(Settings::from_env(app, version))
}

pub fn event(event_type: &str, properties: &[(&str, &str)]) {
    if let Some(recorder) = RECORDER.get() {
        recorder.record(event_type, properties);
    }
}

/// Writes out queued events before the process exits.
pub fn shutdown() {
    if let Some(recorder) = RECORDER.get() {
        recorder.shutdown();
    }
}

impl Recorder {
    pub fn start(settings: Settings) -> Self {
        let log = EventLog::new(settings.root.join(settings.app));
        let (queue, writer) = if settings.usage {
            let (sender, receiver) = sync_channel::<UsageEvent>(QUEUE_DEPTH);
            let writer_log = log.clone();
            let handle = std::thread::spawn(move || {
                for event in receiver {
                    if let Err(err) = writer_log.append(&event) {
                        eprintln!(
                            "telemetry: cannot write {}: {err}",
                            writer_log.events_path().display()
                        );
                    }
                }
            });
            (Some(sender), Some(handle))
        } else {
            (None, None)
        };
        Self {
            settings,
            session_id: format!("{:x}-{:x}", unix_millis(), std::process::id()),
            log,
            queue: Mutex::new(queue),
            writer: Mutex::new(writer),
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Queues one event; dropped silently when disabled or the queue is full.
    pub fn record(&self, event_type: &str, properties: &[(&str, &str)]) {
        let queue = lock(&self.queue);
        let Some(sender) = queue.as_ref() else {
            return;
        };
        let _ = sender.try_send(UsageEvent {
            event_type: event_type.to_string(),
            at_unix_millis: unix_millis(),
            app: self.settings.app.to_string(),
            version: self.settings.version.to_string(),
            session_id: self.session_id.clone(),
            install_id: self.settings.install_id.clone(),
            properties: properties
                .iter()
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        });
    }

    /// Closes the queue and waits for the writer to drain it.
    pub fn shutdown(&self) {
        drop(lock(&self.queue).take());
        if let Some(handle) = lock(&self.writer).take() {
            let _ = handle.join();
        }
    }

    fn write_crash(&self, message: String, location: Option<String>) -> io::Result<()> {
        let report = CrashReport {
            at_unix_millis: unix_millis(),
            app: self.settings.app,
            version: self.settings.version,
            session_id: &self.session_id,
            message,
            location,
        };
        self.log.write_crash(&report)
    }
}

/// Append-only JSONL file that rotates once it grows past a size limit.
#[derive(Clone, Debug)]
pub struct EventLog {
    dir: PathBuf,
    max_bytes: u64,
}

impl EventLog {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            max_bytes: ROTATE_AT_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join("events.jsonl")
    }

    pub fn append(&self, event: &UsageEvent) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.events_path();
        self.rotate_if_full(&path)?;
        let mut line = serde_json::to_vec(event).map_err(io::Error::other)?;
        line.push(b'\n');
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?
            .write_all(&line)
    }

    fn rotate_if_full(&self, path: &Path) -> io::Result<()> {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        if size < self.max_bytes {
            return Ok(());
        }
        let previous = path.with_extension("jsonl.1");
        if previous.exists() {
            fs::remove_file(&previous)?;
        }
        fs::rename(path, previous)
    }

    fn write_crash(&self, report: &CrashReport<'_>) -> io::Result<()> {
        let dir = self.dir.join("crashes");
        fs::create_dir_all(&dir)?;
        let name = format!("{}-{}.json", report.at_unix_millis, std::process::id());
        let data = serde_json::to_vec_pretty(report).map_err(io::Error::other)?;
        fs::write(dir.join(name), data)
    }
}

fn hook_panics(recorder: Arc<Recorder>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|at| format!("{}:{}:{}", at.file(), at.line(), at.column()));
        if let Err(err) = recorder.write_crash(panic_message(info.payload()), location) {
            eprintln!("telemetry: cannot write crash report: {err}");
        }
        previous(info);
    }));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with a non-string payload".to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn telemetry_root() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".local/share/hwprog"))
        .unwrap_or_else(|_| PathBuf::from("/tmp/hwprog"))
        .join("telemetry")
}

fn truthy(value: Option<&str>) -> bool {
    value.is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
