//! Parsing for the cgroup v2 `io.stat` file.
//!
//! Each line starts with a device number (`8:0`) followed by `key=value`
//! pairs. Counters are summed across every device line into one [`IoStat`];
//! a device that omits a key simply contributes nothing to it.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::parser::KeyValueStat;

/// Block I/O counters from `io.stat`, aggregated over all devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoStat {
    /// Bytes read.
    pub rbytes: u64,
    /// Bytes written.
    pub wbytes: u64,
    /// Read operations.
    pub rios: u64,
    /// Write operations.
    pub wios: u64,
}

impl IoStat {
    fn add_rbytes(&mut self, v: u64) {
        self.rbytes += v;
    }

    fn add_wbytes(&mut self, v: u64) {
        self.wbytes += v;
    }

    fn add_rios(&mut self, v: u64) {
        self.rios += v;
    }

    fn add_wios(&mut self, v: u64) {
        self.wios += v;
    }
}

type Accumulator = fn(&mut IoStat, u64);

static ACCUMULATORS: LazyLock<HashMap<&'static str, Accumulator>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Accumulator> = HashMap::with_capacity(4);

    m.insert("rbytes", IoStat::add_rbytes);
    m.insert("wbytes", IoStat::add_wbytes);
    m.insert("rios", IoStat::add_rios);
    m.insert("wios", IoStat::add_wios);

    m
});

impl KeyValueStat for IoStat {
    const SPLIT_CHAR: Option<char> = Some('=');
    // The leading device number column carries no '=' and is skipped.
    const SKIP_VALUES: usize = 1;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &ACCUMULATORS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::stats::StatParseError;
    use crate::cgroup::stats::error::extract_stat_parse_error;

    #[test]
    fn test_parse_empty_io_stat() {
        let stat = IoStat::from_reader(&mut "".as_bytes()).unwrap();
        assert_eq!(stat, IoStat::default());
    }

    #[test]
    fn test_sums_across_devices() {
        let data = "\
8:0 rbytes=100 wbytes=150 rios=3 wios=4
254:0 rbytes=50 wbytes=50 rios=1 wios=2
";
        let stat = IoStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.rbytes, 150);
        assert_eq!(stat.wbytes, 200);
        assert_eq!(stat.rios, 4);
        assert_eq!(stat.wios, 6);
    }

    #[test]
    fn test_missing_keys_stay_zero() {
        let data = "8:0 rbytes=1024 wbytes=2048\n";
        let stat = IoStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.rbytes, 1024);
        assert_eq!(stat.wbytes, 2048);
        assert_eq!(stat.rios, 0);
        assert_eq!(stat.wios, 0);
    }

    #[test]
    fn test_unknown_keys_and_malformed_pairs_ignored() {
        let data = "8:0 foo=100 rbytes=1024 malformedpair wios=24\n";
        let stat = IoStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(stat.rbytes, 1024);
        assert_eq!(stat.wios, 24);
    }

    #[test]
    fn test_parse_invalid_io_stat() {
        let data = "8:0 rbytes=abc\n";
        let err = IoStat::from_reader(&mut data.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        match extract_stat_parse_error(&err) {
            StatParseError::InvalidKeyValue { key, value, .. } => {
                assert_eq!(key, "rbytes");
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidKeyValue, got {other:?}"),
        }
    }
}
