//! Parsing for the cgroup v2 `cpu.stat` file.
//!
//! The file is one whitespace-separated key/value pair per line. Only the
//! usage counters are extracted; scheduler throttling and burst counters are
//! left to their defaults when absent and ignored when present.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::parser::KeyValueStat;

/// CPU usage counters from `cpu.stat`. All values are cumulative
/// microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuStat {
    /// Total CPU time charged to the group (user + system).
    pub usage_usec: u64,
    /// Time spent in user space.
    pub user_usec: u64,
    /// Time spent in the kernel.
    pub system_usec: u64,
}

impl CpuStat {
    fn set_usage_usec(&mut self, v: u64) {
        self.usage_usec = v;
    }

    fn set_user_usec(&mut self, v: u64) {
        self.user_usec = v;
    }

    fn set_system_usec(&mut self, v: u64) {
        self.system_usec = v;
    }
}

type Setter = fn(&mut CpuStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(3);

    m.insert("usage_usec", CpuStat::set_usage_usec);
    m.insert("user_usec", CpuStat::set_user_usec);
    m.insert("system_usec", CpuStat::set_system_usec);

    m
});

impl KeyValueStat for CpuStat {
    const SPLIT_CHAR: Option<char> = None;
    const SKIP_VALUES: usize = 0;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}
