//! Optional hooks into a split run.
//!
//! Observers are purely observational: the engine calls them at fixed points
//! and ignores what they do. A split behaves identically with no observer, one
//! observer, or several.

use crate::engine::{OutputFile, SplitSummary};
use crate::policy::SplitPolicy;
use std::path::Path;
use sysinfo::{Pid, System};
use tracing::{debug, info};

/// Callbacks invoked by [`SplitEngine`](crate::SplitEngine).
///
/// Every method has a no-op default.
pub trait SplitObserver {
    /// The header has been read and output is about to start.
    fn on_split_started(&mut self, _source: &Path, _policy: &SplitPolicy) {}

    /// An output file has been flushed and closed (rollover or end of input).
    fn on_file_closed(&mut self, _file: &OutputFile) {}

    /// The run finished successfully.
    fn on_split_finished(&mut self, _summary: &SplitSummary) {}
}

/// Observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SplitObserver for NoopObserver {}

/// Logs the resident memory of this process every time an output file closes.
///
/// Memory should stay flat across rollovers no matter how large the input is;
/// this is the quickest way to confirm it on a real file.
pub struct MemoryReporter {
    system: System,
    pid: Option<Pid>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            debug!("current pid unavailable; memory reporting disabled");
        }
        Self {
            system: System::new(),
            pid,
        }
    }

    /// Resident set size of the current process in bytes, if the platform reports it.
    pub fn resident_bytes(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system.refresh_process(pid);
        self.system.process(pid).map(sysinfo::Process::memory)
    }
}

impl Default for MemoryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitObserver for MemoryReporter {
    fn on_file_closed(&mut self, file: &OutputFile) {
        if let Some(bytes) = self.resident_bytes() {
            let mb = bytes as f64 / 1024.0 / 1024.0;
            info!(file = file.index, "memory usage: {mb:.1} MB");
        }
    }
}
