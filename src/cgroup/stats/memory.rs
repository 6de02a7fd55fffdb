//! Parsing for the cgroup v2 `memory.current` file, which holds the group's
//! total memory usage as a single decimal byte count.

use std::io::BufRead;

use super::parser::SingleLineStat;
use super::StatParseError;

/// Current memory usage from `memory.current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    /// Total memory charged to the group, in bytes.
    pub usage_bytes: u64,
}

impl SingleLineStat for MemoryUsage {
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Self> {
        let mut line = String::new();
        buf.read_line(&mut line)?;
        let line = line.trim();
        let usage_bytes = line
            .parse::<u64>()
            .map_err(|source| StatParseError::InvalidValue {
                value: line.to_string(),
                line: 1,
                source,
            })?;

        Ok(MemoryUsage { usage_bytes })
    }
}
