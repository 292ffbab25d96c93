//! Syscall tracing
//!
//! Records every host call the guest makes:
//! - Ring buffer of recent events (bounded memory)
//! - Per-syscall counters for calls, errors and time spent
//! - JSON export for offline inspection

use super::abi::{ESUCCESS, Syscall};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::time::Duration;

/// Default number of events kept in the trace buffer
pub const TRACE_BUFFER_SIZE: usize = 1000;

/// A single syscall as seen at the boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEvent {
    /// Sequence number across the whole run
    pub seq: u64,
    pub syscall: Syscall,
    /// Raw guest arguments
    pub args: Vec<i64>,
    /// Status returned to the guest
    pub status: i32,
    /// Time spent in the host, in microseconds
    pub elapsed_us: u64,
}

/// Performance counters for one syscall
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfCounters {
    /// Calls that returned success
    pub ok: u64,
    /// Calls that returned a non-zero status
    pub errors: u64,
    /// Total time spent (us)
    pub total_us: u64,
    /// Minimum call time (us)
    pub min_us: u64,
    /// Maximum call time (us)
    pub max_us: u64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            ok: 0,
            errors: 0,
            total_us: 0,
            min_us: u64::MAX,
            max_us: 0,
        }
    }

    /// Record one call
    pub fn record(&mut self, elapsed_us: u64, ok: bool) {
        if ok {
            self.ok += 1;
        } else {
            self.errors += 1;
        }
        self.total_us += elapsed_us;
        self.min_us = self.min_us.min(elapsed_us);
        self.max_us = self.max_us.max(elapsed_us);
    }

    pub fn calls(&self) -> u64 {
        self.ok + self.errors
    }

    /// Average time per call
    pub fn avg_us(&self) -> f64 {
        match self.calls() {
            0 => 0.0,
            n => self.total_us as f64 / n as f64,
        }
    }
}

impl Default for PerfCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded record of the syscalls made during a run
#[derive(Debug, Clone, Serialize)]
pub struct SyscallTrace {
    capacity: usize,
    next_seq: u64,
    /// Events evicted from the ring buffer
    dropped: u64,
    events: VecDeque<TraceEvent>,
    stats: BTreeMap<Syscall, PerfCounters>,
}

impl SyscallTrace {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_seq: 0,
            dropped: 0,
            events: VecDeque::with_capacity(capacity.min(TRACE_BUFFER_SIZE)),
            stats: BTreeMap::new(),
        }
    }

    /// Record a completed syscall
    pub fn record(&mut self, syscall: Syscall, args: &[i64], status: i32, elapsed: Duration) {
        let elapsed_us = elapsed.as_micros().min(u64::MAX as u128) as u64;

        self.stats
            .entry(syscall)
            .or_default()
            .record(elapsed_us, status == ESUCCESS);

        if self.capacity == 0 {
            self.dropped += 1;
        } else {
            if self.events.len() == self.capacity {
                self.events.pop_front();
                self.dropped += 1;
            }
            self.events.push_back(TraceEvent {
                seq: self.next_seq,
                syscall,
                args: args.to_vec(),
                status,
                elapsed_us,
            });
        }
        self.next_seq += 1;
    }

    /// Recent events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter()
    }

    pub fn stats(&self, syscall: Syscall) -> Option<&PerfCounters> {
        self.stats.get(&syscall)
    }

    /// Total syscalls recorded, including evicted ones
    pub fn total_calls(&self) -> u64 {
        self.next_seq
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for SyscallTrace {
    fn default() -> Self {
        Self::new(TRACE_BUFFER_SIZE)
    }
}
