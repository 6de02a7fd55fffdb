//! Parsers for the cgroup v2 stat files the manager reads.
//!
//! Each file format gets a dedicated type implementing either
//! [`KeyValueStat`] (multi-line key/value files) or [`SingleLineStat`]
//! (single scalar files).

mod cpu;
mod error;
mod io;
mod memory;
mod parser;

pub use cpu::CpuStat;
pub use error::StatParseError;
pub use io::IoStat;
pub use memory::MemoryUsage;
pub use parser::{KeyValueStat, SingleLineStat};
