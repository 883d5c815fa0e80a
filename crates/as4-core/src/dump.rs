//! # Incoming Dump
//!
//! Optional diagnostics side channel: a hook that may ask for a copy of
//! every raw inbound byte stream. It never influences decisions.
//!
//! At most one hook is active. Setting it is last-writer-wins; readers see
//! either the old or the new hook, never a partial value.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// What is known about a request before its body is read.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub request_id: String,
    pub remote_addr: Option<String>,
    pub headers: Vec<(String, String)>,
    pub received_at: DateTime<Utc>,
}

impl RequestMetadata {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            remote_addr: None,
            headers: Vec::new(),
            received_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

pub type DumpSink = Box<dyn Write + Send>;

pub trait IncomingDumper: Send + Sync {
    /// Returns a sink to mirror the request body into, or `None` to skip it.
    fn on_new_request(&self, meta: &RequestMetadata) -> Option<DumpSink>;

    /// Called once the request has been handled.
    fn on_end_request(&self, _meta: &RequestMetadata, _error: Option<&str>) {}
}

/// Slot holding the active dumper.
#[derive(Default)]
pub struct DumpHook {
    active: RwLock<Option<Arc<dyn IncomingDumper>>>,
}

impl DumpHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `dumper` (or clears the slot), returning the previous one.
    pub fn set(&self, dumper: Option<Arc<dyn IncomingDumper>>) -> Option<Arc<dyn IncomingDumper>> {
        std::mem::replace(&mut *self.active.write(), dumper)
    }

    pub fn get(&self) -> Option<Arc<dyn IncomingDumper>> {
        self.active.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.active.read().is_some()
    }

    /// Wraps `body` so that every byte read from it is mirrored to the
    /// active dumper's sink, if any.
    pub fn mirror<R: Read>(&self, meta: &RequestMetadata, body: R) -> MirrorReader<R> {
        let sink = self.get().and_then(|d| d.on_new_request(meta));
        if sink.is_some() {
            debug!(request = %meta.request_id, "mirroring incoming request");
        }
        MirrorReader::new(body, sink)
    }

    /// Forwards end-of-request to the active dumper.
    pub fn end_request(&self, meta: &RequestMetadata, error: Option<&str>) {
        if let Some(dumper) = self.get() {
            dumper.on_end_request(meta, error);
        }
    }
}

impl std::fmt::Debug for DumpHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpHook").field("active", &self.is_set()).finish()
    }
}

/// Reader adapter that tees everything it reads into a sink.
///
/// A failing sink is dropped with a warning; the body keeps flowing.
pub struct MirrorReader<R> {
    inner: R,
    sink: Option<DumpSink>,
    mirrored: u64,
}

impl<R: Read> MirrorReader<R> {
    pub fn new(inner: R, sink: Option<DumpSink>) -> Self {
        Self {
            inner,
            sink,
            mirrored: 0,
        }
    }

    pub fn is_mirroring(&self) -> bool {
        self.sink.is_some()
    }

    pub fn bytes_mirrored(&self) -> u64 {
        self.mirrored
    }

    /// Flushes the sink and returns the wrapped reader.
    pub fn finish(mut self) -> R {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.flush() {
                warn!(error = %e, "flushing incoming dump failed");
            }
        }
        self.inner
    }
}

impl<R: Read> Read for MirrorReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            if let Some(sink) = self.sink.as_mut() {
                match sink.write_all(&buf[..n]) {
                    Ok(()) => self.mirrored += n as u64,
                    Err(e) => {
                        warn!(error = %e, "incoming dump sink failed, mirroring stopped");
                        self.sink = None;
                    }
                }
            }
        }
        Ok(n)
    }
}

/// Writes each request, headers first, to its own file in a directory.
#[derive(Debug, Clone)]
pub struct FileIncomingDumper {
    directory: PathBuf,
}

impl FileIncomingDumper {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `<timestamp>-<request id>.as4in`, with the id reduced to safe characters.
    pub fn file_name(meta: &RequestMetadata) -> String {
        let id: String = meta
            .request_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{}-{id}.as4in", meta.received_at.format("%Y%m%dT%H%M%S%.3f"))
    }

    fn open(&self, meta: &RequestMetadata) -> io::Result<DumpSink> {
        fs::create_dir_all(&self.directory)?;
        let file = File::create(self.directory.join(Self::file_name(meta)))?;
        let mut out = BufWriter::new(file);
        for (name, value) in &meta.headers {
            write!(out, "{name}: {value}\r\n")?;
        }
        out.write_all(b"\r\n")?;
        Ok(Box::new(out))
    }
}

impl IncomingDumper for FileIncomingDumper {
    fn on_new_request(&self, meta: &RequestMetadata) -> Option<DumpSink> {
        match self.open(meta) {
            Ok(sink) => Some(sink),
            Err(e) => {
                warn!(request = %meta.request_id, error = %e, "cannot open incoming dump file");
                None
            }
        }
    }
}
