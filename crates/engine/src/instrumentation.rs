//! Commit-phase timing
//!
//! Feature-gated to avoid overhead in production.
//! Enable with: cargo build --features perf-trace
//!
//! # Usage
//!
//! ```ignore
//! let mut trace = CommitTrace::new();
//! let r = perf_time!(trace, store_value_ns, store.put(&value)?);
//! debug!(trace = %trace.summary());
//! ```

/// Per-commit performance trace
///
/// When `perf-trace` feature is enabled, this struct captures
/// timing information for each phase of a dataset commit.
#[cfg(feature = "perf-trace")]
#[derive(Debug, Default, Clone)]
pub struct CommitTrace {
    /// Time to store the committed value (ns)
    pub store_value_ns: u64,
    /// Time to store the commit object (ns)
    pub store_commit_ns: u64,
    /// Time to flush the value store (ns)
    pub flush_ns: u64,
    /// Time to swap and persist the head (ns)
    pub swap_ns: u64,
}

#[cfg(feature = "perf-trace")]
impl CommitTrace {
    /// Create new empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all recorded phases (ns)
    pub fn total_ns(&self) -> u64 {
        self.store_value_ns + self.store_commit_ns + self.flush_ns + self.swap_ns
    }

    /// Format as human-readable string
    pub fn summary(&self) -> String {
        format!(
            "value: {}ns, commit: {}ns, flush: {}ns, swap: {}ns, total: {}ns",
            self.store_value_ns,
            self.store_commit_ns,
            self.flush_ns,
            self.swap_ns,
            self.total_ns(),
        )
    }

    /// Share of the total spent flushing, in percent
    pub fn flush_pct(&self) -> f64 {
        self.flush_ns as f64 / self.total_ns().max(1) as f64 * 100.0
    }
}

/// No-op trace for production builds
#[cfg(not(feature = "perf-trace"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct CommitTrace;

#[cfg(not(feature = "perf-trace"))]
impl CommitTrace {
    /// Create new empty trace (no-op)
    pub fn new() -> Self {
        Self
    }

    /// Format as human-readable string (no-op)
    pub fn summary(&self) -> &'static str {
        "perf-trace disabled"
    }
}

/// Macro for conditional timing
///
/// When `perf-trace` is enabled, times the expression and stores in trace.
/// When disabled, just evaluates the expression with zero overhead.
#[cfg(feature = "perf-trace")]
#[macro_export]
macro_rules! perf_time {
    ($trace:expr, $field:ident, $expr:expr) => {{
        let start = std::time::Instant::now();
        let result = $expr;
        $trace.$field = start.elapsed().as_nanos() as u64;
        result
    }};
}

/// No-op version of perf_time! macro when `perf-trace` feature is disabled.
#[cfg(not(feature = "perf-trace"))]
#[macro_export]
macro_rules! perf_time {
    ($trace:expr, $field:ident, $expr:expr) => {
        $expr
    };
}
