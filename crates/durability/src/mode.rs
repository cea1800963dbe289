//! Durability mode configuration
//!
//! Controls when buffered values reach disk.

/// Durability mode for a local store
///
/// | Mode | Puts | fsync |
/// |------|------|-------|
/// | Standard | buffered in the memtable | at every commit |
/// | Always | written through | after every put |
///
/// In both modes the values a commit references are durable before the
/// head moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Buffer puts in the memtable; flush and fsync at commit (the default)
    #[default]
    Standard,
    /// Write every put through to the log and fsync immediately
    Always,
}

impl DurabilityMode {
    /// True if every put must be written through and synced
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Always)
    }

    /// Human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::Standard => "Standard (buffered puts, fsync at commit)",
            DurabilityMode::Always => "Always sync (write-through, slowest)",
        }
    }
}
