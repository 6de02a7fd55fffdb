//! CSV persistence for samples and reports.
//!
//! [`CsvWriter`] is constructed explicitly by the caller around any
//! [`io::Write`]; the header row is written at construction and the handle
//! is released on drop. There are no process-global output files.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::namespace::ReportRow;
use crate::proc::{CpuSample, IoSample, MemorySample};

/// A record type with a fixed CSV column layout.
pub trait CsvRecord {
    /// The header row, without a trailing newline.
    fn header() -> &'static str;

    /// Writes one data row, including the trailing newline.
    fn write_row<W: Write>(&self, out: &mut W) -> io::Result<()>;
}

/// Writes records of one type to an underlying writer, header first.
#[derive(Debug)]
pub struct CsvWriter<T, W> {
    out: W,
    _marker: std::marker::PhantomData<T>,
}

impl<T: CsvRecord, W: Write> CsvWriter<T, W> {
    /// Wraps `out`, immediately writing the header row for `T`.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{}", T::header())?;
        Ok(Self {
            out,
            _marker: std::marker::PhantomData,
        })
    }

    pub fn write(&mut self, record: &T) -> io::Result<()> {
        record.write_row(&mut self.out)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl<T: CsvRecord> CsvWriter<T, BufWriter<File>> {
    /// Creates (or truncates) a CSV file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl CsvRecord for CpuSample {
    fn header() -> &'static str {
        "timestamp,pid,cpu_percent,user_time_ticks,system_time_ticks,context_switches,threads"
    }

    fn write_row<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{},{},{:.2},{},{},{},{}",
            self.timestamp,
            self.pid,
            self.cpu_percent,
            self.user_time_ticks,
            self.system_time_ticks,
            self.context_switches,
            self.threads
        )
    }
}

impl CsvRecord for MemorySample {
    fn header() -> &'static str {
        "timestamp,pid,rss_bytes,vsize_bytes,page_faults,swap_bytes"
    }

    fn write_row<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            self.timestamp,
            self.pid,
            self.rss_bytes,
            self.vsize_bytes,
            self.page_faults,
            self.swap_bytes
        )
    }
}

impl CsvRecord for IoSample {
    fn header() -> &'static str {
        "timestamp,pid,read_bytes,write_bytes,io_syscalls,disk_ops,\
         read_rate_bytes_per_sec,write_rate_bytes_per_sec,disk_ops_per_sec,\
         rx_bytes,tx_bytes,rx_packets,tx_packets,connections"
    }

    fn write_row<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{},{},{},{},{},{},{:.2},{:.2},{:.2},{},{},{},{},{}",
            self.timestamp,
            self.pid,
            self.read_bytes,
            self.write_bytes,
            self.io_syscalls,
            self.disk_ops,
            self.read_rate_bytes_per_sec,
            self.write_rate_bytes_per_sec,
            self.disk_ops_per_sec,
            self.rx_bytes,
            self.tx_bytes,
            self.rx_packets,
            self.tx_packets,
            self.connections
        )
    }
}

impl CsvRecord for ReportRow {
    fn header() -> &'static str {
        "namespace,inode,pid_count"
    }

    fn write_row<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{},{},{}", self.kind, self.inode, self.member_count)
    }
}
