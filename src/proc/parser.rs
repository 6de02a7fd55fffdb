//! Parsers for the `/proc` file formats consumed by the samplers.
//!
//! Each parser takes either a string slice (single-line formats) or a
//! [`BufRead`] (line-oriented formats) and produces a plain counter struct.
//! All counters are cumulative kernel values; delta and rate computation is
//! the samplers' job, not the parsers'.

use std::io::BufRead;

use super::error::ProcParseError;

/// Counters extracted from the single line of `/proc/<pid>/stat`.
///
/// The kernel writes the process name in parentheses; all field positions
/// here are counted after the closing parenthesis, where the state character
/// is field 1, utime/stime are fields 12/13 and the thread count is field 18.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PidStat {
    /// Time spent in user mode, in clock ticks.
    pub utime_ticks: u64,
    /// Time spent in kernel mode, in clock ticks.
    pub stime_ticks: u64,
    /// Current number of threads.
    pub threads: u64,
    /// Minor page faults (no disk I/O required).
    pub minflt: u64,
    /// Major page faults (disk I/O required).
    pub majflt: u64,
}

impl PidStat {
    /// Cumulative page fault count, minor and major combined.
    pub fn page_faults(&self) -> u64 {
        self.minflt + self.majflt
    }
}

// 0-based positions in the whitespace-split tail after the final ')'.
const STAT_MINFLT: usize = 7;
const STAT_MAJFLT: usize = 9;
const STAT_UTIME: usize = 11;
const STAT_STIME: usize = 12;
const STAT_THREADS: usize = 17;

/// Parses the stat line of a single process.
pub fn parse_pid_stat(line: &str) -> Result<PidStat, ProcParseError> {
    // The process name may itself contain spaces or parentheses, so only the
    // text after the *last* ')' is positional.
    let tail = line
        .rsplit_once(')')
        .map(|(_, tail)| tail)
        .ok_or_else(|| ProcParseError::UnexpectedFormat {
            file: "stat",
            content: line.to_string(),
        })?;

    let fields: Vec<&str> = tail.split_whitespace().collect();
    if fields.len() <= STAT_THREADS {
        return Err(ProcParseError::UnexpectedFormat {
            file: "stat",
            content: line.to_string(),
        });
    }

    Ok(PidStat {
        utime_ticks: parse_field("stat", "utime", fields[STAT_UTIME])?,
        stime_ticks: parse_field("stat", "stime", fields[STAT_STIME])?,
        threads: parse_field("stat", "num_threads", fields[STAT_THREADS])?,
        minflt: parse_field("stat", "minflt", fields[STAT_MINFLT])?,
        majflt: parse_field("stat", "majflt", fields[STAT_MAJFLT])?,
    })
}

/// Parses the aggregate cpu line (the first line of `/proc/stat`) and returns
/// the sum of all tick counters present.
///
/// The kernel reports up to 10 counters (user, nice, system, idle, iowait,
/// irq, softirq, steal, guest, guest_nice); older kernels report fewer.
/// Anything below 5 counters is treated as a format error.
pub fn parse_total_ticks(line: &str) -> Result<u64, ProcParseError> {
    let mut fields = line.split_whitespace();
    match fields.next() {
        Some(label) if label.starts_with("cpu") => {}
        _ => {
            return Err(ProcParseError::UnexpectedFormat {
                file: "stat",
                content: line.to_string(),
            });
        }
    }

    let mut total: u64 = 0;
    let mut count = 0usize;
    for field in fields.take(10) {
        total += parse_field("stat", "cpu ticks", field)?;
        count += 1;
    }

    if count < 5 {
        return Err(ProcParseError::UnexpectedFormat {
            file: "stat",
            content: line.to_string(),
        });
    }

    Ok(total)
}

/// Counters extracted from `/proc/<pid>/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PidStatus {
    /// Voluntary plus involuntary context switches, cumulative.
    pub context_switches: u64,
    /// Swapped-out memory in bytes (`VmSwap`); 0 when the kernel omits the
    /// line, e.g. for kernel threads or swap-less systems.
    pub swap_bytes: u64,
}

/// Parses `/proc/<pid>/status`, extracting the context switch counters and
/// swap usage. Lines other than the three of interest are skipped.
pub fn parse_pid_status<R: BufRead>(buf: &mut R) -> Result<PidStatus, ProcParseError> {
    let mut voluntary = 0u64;
    let mut nonvoluntary = 0u64;
    let mut swap_kb = 0u64;

    let mut line = String::new();
    while buf.read_line(&mut line)? != 0 {
        if let Some(rest) = line.strip_prefix("voluntary_ctxt_switches:") {
            voluntary = parse_field("status", "voluntary_ctxt_switches", rest.trim())?;
        } else if let Some(rest) = line.strip_prefix("nonvoluntary_ctxt_switches:") {
            nonvoluntary = parse_field("status", "nonvoluntary_ctxt_switches", rest.trim())?;
        } else if let Some(rest) = line.strip_prefix("VmSwap:") {
            let value = rest.trim().trim_end_matches("kB").trim();
            swap_kb = parse_field("status", "VmSwap", value)?;
        }
        line.clear();
    }

    Ok(PidStatus {
        context_switches: voluntary + nonvoluntary,
        swap_bytes: swap_kb * 1024,
    })
}

/// Page counts from `/proc/<pid>/statm`; the first two whitespace-separated
/// fields are the total mapped size and the resident set, both in pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PidStatm {
    pub size_pages: u64,
    pub resident_pages: u64,
}

/// Parses the single line of `/proc/<pid>/statm`.
pub fn parse_pid_statm(line: &str) -> Result<PidStatm, ProcParseError> {
    let mut fields = line.split_whitespace();
    let (Some(size), Some(resident)) = (fields.next(), fields.next()) else {
        return Err(ProcParseError::UnexpectedFormat {
            file: "statm",
            content: line.to_string(),
        });
    };

    Ok(PidStatm {
        size_pages: parse_field("statm", "size", size)?,
        resident_pages: parse_field("statm", "resident", resident)?,
    })
}

/// Disk I/O accounting from `/proc/<pid>/io`. All counters are cumulative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PidIo {
    /// Bytes fetched from the storage layer.
    pub read_bytes: u64,
    /// Bytes sent to the storage layer.
    pub write_bytes: u64,
    /// Read syscalls issued (read, pread, ...).
    pub syscr: u64,
    /// Write syscalls issued (write, pwrite, ...).
    pub syscw: u64,
}

impl PidIo {
    /// Total I/O syscalls issued by the process.
    pub fn io_syscalls(&self) -> u64 {
        self.syscr + self.syscw
    }
}

/// Parses `/proc/<pid>/io`; unknown lines are skipped.
pub fn parse_pid_io<R: BufRead>(buf: &mut R) -> Result<PidIo, ProcParseError> {
    let mut io = PidIo::default();

    let mut line = String::new();
    while buf.read_line(&mut line)? != 0 {
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            match key {
                "read_bytes" => io.read_bytes = parse_field("io", "read_bytes", value)?,
                "write_bytes" => io.write_bytes = parse_field("io", "write_bytes", value)?,
                "syscr" => io.syscr = parse_field("io", "syscr", value)?,
                "syscw" => io.syscw = parse_field("io", "syscw", value)?,
                _ => {}
            }
        }
        line.clear();
    }

    Ok(io)
}

/// System-wide traffic totals from `/proc/net/dev`, summed over every
/// interface except loopback.
///
/// These are host-level counters: the kernel exposes no per-process network
/// accounting, so callers must not present them as process-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetTotals {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

/// Parses `/proc/net/dev`: two header lines, then one line per interface of
/// the form `name: rx_bytes rx_packets ... tx_bytes tx_packets ...`.
/// Lines with too few fields are skipped; the `lo` interface is excluded.
pub fn parse_net_dev<R: BufRead>(buf: &mut R) -> Result<NetTotals, ProcParseError> {
    let mut totals = NetTotals::default();

    let mut line = String::new();
    for _ in 0..2 {
        buf.read_line(&mut line)?;
        line.clear();
    }

    while buf.read_line(&mut line)? != 0 {
        if let Some((iface, data)) = line.trim().split_once(':') {
            if iface.trim() != "lo" {
                let fields: Vec<&str> = data.split_whitespace().collect();
                if fields.len() >= 10 {
                    totals.rx_bytes += fields[0].parse().unwrap_or(0);
                    totals.rx_packets += fields[1].parse().unwrap_or(0);
                    totals.tx_bytes += fields[8].parse().unwrap_or(0);
                    totals.tx_packets += fields[9].parse().unwrap_or(0);
                }
            }
        }
        line.clear();
    }

    Ok(totals)
}

/// Connection state value the kernel uses for ESTABLISHED sockets.
const TCP_ESTABLISHED: &str = "01";

/// Parses `/proc/net/tcp` and counts connections in the ESTABLISHED state.
///
/// The state is the fourth whitespace-separated field of each row after the
/// header line (`sl local_address rem_address st ...`).
pub fn parse_tcp_established<R: BufRead>(buf: &mut R) -> Result<u64, ProcParseError> {
    let mut count = 0u64;

    let mut line = String::new();
    buf.read_line(&mut line)?;
    line.clear();

    while buf.read_line(&mut line)? != 0 {
        if let Some(state) = line.split_whitespace().nth(3) {
            if state == TCP_ESTABLISHED {
                count += 1;
            }
        }
        line.clear();
    }

    Ok(count)
}

fn parse_field(
    file: &'static str,
    field: &'static str,
    value: &str,
) -> Result<u64, ProcParseError> {
    value
        .parse::<u64>()
        .map_err(|source| ProcParseError::InvalidValue {
            file,
            field,
            value: value.to_string(),
            source,
        })
}
