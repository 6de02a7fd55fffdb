use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use procgov::cgroup::{CgroupManager, DEFAULT_CGROUP_ROOT};
use procgov::namespace::bench::{CloneFactory, DEFAULT_ITERATIONS, OverheadBenchmark};
use procgov::namespace::{Inspector, NamespaceType};
use procgov::proc::{CpuMonitor, IoMonitor, Procfs, memory};
use procgov::record::{CsvRecord, CsvWriter};

#[derive(Parser)]
#[command(name = "procgov", version, about = "Process telemetry, cgroup control and namespace inspection")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample resource usage of a process at a fixed interval.
    Monitor {
        #[command(subcommand)]
        resource: MonitorCommand,
    },
    /// Manage cgroup v2 groups and their limits.
    Cgroup {
        /// Root of the cgroup v2 hierarchy.
        #[arg(long, default_value = DEFAULT_CGROUP_ROOT)]
        root: PathBuf,
        #[command(subcommand)]
        action: CgroupCommand,
    },
    /// Inspect namespace identities and measure isolation overhead.
    Ns {
        #[command(subcommand)]
        action: NsCommand,
    },
}

#[derive(Subcommand)]
enum MonitorCommand {
    /// CPU usage, context switches and thread count.
    Cpu(MonitorArgs),
    /// Resident set, virtual size, page faults and swap.
    Memory(MonitorArgs),
    /// Disk throughput plus system-wide network totals.
    Io(MonitorArgs),
}

#[derive(Args)]
struct MonitorArgs {
    /// Process to observe.
    #[arg(long)]
    pid: i32,
    /// Seconds between samples.
    #[arg(long, default_value_t = 1.0)]
    interval: f64,
    /// Number of samples to take; unlimited when omitted.
    #[arg(long)]
    count: Option<u64>,
    /// Also append samples to a CSV file at this path.
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print samples as JSON lines instead of plain text.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum CgroupCommand {
    /// Create a group; succeeds if it already exists.
    Create { name: String },
    /// Move a process into a group.
    Attach { name: String, pid: i32 },
    /// Set the memory limit in bytes; zero or negative removes the limit.
    SetMemory { name: String, bytes: i64 },
    /// Limit CPU bandwidth to a fraction of cores.
    SetCpu {
        name: String,
        cores: f64,
        /// Enforcement period in microseconds.
        #[arg(long, default_value_t = 100_000)]
        period_us: u64,
    },
    /// Print current memory usage in bytes.
    Memory { name: String },
    /// Print cumulative CPU usage in microseconds.
    Cpu { name: String },
    /// Print block I/O counters, summed across devices.
    Io { name: String },
}

#[derive(Subcommand)]
enum NsCommand {
    /// List the namespace identities of a process.
    List { pid: i32 },
    /// Compare the namespaces of two processes.
    Compare { pid1: i32, pid2: i32 },
    /// List the processes holding a given namespace instance.
    Members { kind: String, inode: u64 },
    /// Report every namespace instance on the system with member counts.
    Report {
        /// Also write the report to a CSV file at this path.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Measure namespace creation and teardown cost.
    Bench {
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: u32,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Monitor { resource } => run_monitor(resource),
        Command::Cgroup { root, action } => run_cgroup(CgroupManager::new(root), action),
        Command::Ns { action } => run_ns(action),
    }
}

fn run_monitor(resource: MonitorCommand) -> Result<(), Box<dyn Error>> {
    let procfs = Procfs::default();
    match resource {
        MonitorCommand::Cpu(args) => {
            let mut monitor = CpuMonitor::init(procfs, args.pid)?;
            sample_loop(&args, || monitor.sample(), |s| {
                format!(
                    "pid {} cpu {:.2}% threads {} ctxt-switches {}",
                    s.pid, s.cpu_percent, s.threads, s.context_switches
                )
            })
        }
        MonitorCommand::Memory(args) => {
            let pid = args.pid;
            sample_loop(&args, || memory::sample(&procfs, pid), |s| {
                format!(
                    "pid {} rss {} vsize {} page-faults {} swap {}",
                    s.pid, s.rss_bytes, s.vsize_bytes, s.page_faults, s.swap_bytes
                )
            })
        }
        MonitorCommand::Io(args) => {
            let mut monitor = IoMonitor::init(procfs, args.pid)?;
            let interval = args.interval;
            sample_loop(&args, || monitor.sample(interval), |s| {
                format!(
                    "pid {} read {:.0} B/s write {:.0} B/s ops {:.1}/s net rx {} tx {} conns {}",
                    s.pid,
                    s.read_rate_bytes_per_sec,
                    s.write_rate_bytes_per_sec,
                    s.disk_ops_per_sec,
                    s.rx_bytes,
                    s.tx_bytes,
                    s.connections
                )
            })
        }
    }
}

/// Runs the shared sampling loop: sleep, sample, emit. A failed sample is
/// reported and the loop keeps going, so a briefly unreadable process does
/// not kill a long-running recording.
fn sample_loop<T, E, F, D>(args: &MonitorArgs, mut next: F, describe: D) -> Result<(), Box<dyn Error>>
where
    T: Serialize + CsvRecord,
    E: Error,
    F: FnMut() -> Result<T, E>,
    D: Fn(&T) -> String,
{
    if args.interval <= 0.0 {
        return Err(format!("interval must be positive, got {}", args.interval).into());
    }

    let mut csv = match &args.csv {
        Some(path) => Some(CsvWriter::<T, BufWriter<File>>::create(path)?),
        None => None,
    };

    let mut remaining = args.count;
    while remaining != Some(0) {
        thread::sleep(Duration::from_secs_f64(args.interval));
        match next() {
            Ok(sample) => {
                if args.json {
                    println!("{}", serde_json::to_string(&sample)?);
                } else {
                    println!("{}", describe(&sample));
                }
                if let Some(writer) = csv.as_mut() {
                    writer.write(&sample)?;
                    writer.flush()?;
                }
            }
            Err(err) => log::error!("sampling failed: {err}"),
        }
        if let Some(count) = remaining.as_mut() {
            *count -= 1;
        }
    }

    Ok(())
}

fn run_cgroup(manager: CgroupManager, action: CgroupCommand) -> Result<(), Box<dyn Error>> {
    if matches!(
        action,
        CgroupCommand::Create { .. }
            | CgroupCommand::Attach { .. }
            | CgroupCommand::SetMemory { .. }
            | CgroupCommand::SetCpu { .. }
    ) && !nix::unistd::Uid::effective().is_root()
    {
        log::warn!("not running as root; cgroup writes will likely be denied");
    }

    match action {
        CgroupCommand::Create { name } => {
            manager.create(&name)?;
            println!("created {name}");
        }
        CgroupCommand::Attach { name, pid } => {
            manager.attach(&name, pid)?;
            println!("attached {pid} to {name}");
        }
        CgroupCommand::SetMemory { name, bytes } => {
            manager.set_memory_limit(&name, bytes)?;
            println!("memory limit set on {name}");
        }
        CgroupCommand::SetCpu {
            name,
            cores,
            period_us,
        } => {
            manager.set_cpu_limit(&name, cores, period_us)?;
            println!("cpu limit set on {name}");
        }
        CgroupCommand::Memory { name } => {
            println!("{}", manager.memory_usage(&name)?);
        }
        CgroupCommand::Cpu { name } => {
            println!("{}", manager.cpu_usage(&name)?);
        }
        CgroupCommand::Io { name } => {
            let stat = manager.io_stats(&name)?;
            println!(
                "rbytes {} wbytes {} rios {} wios {}",
                stat.rbytes, stat.wbytes, stat.rios, stat.wios
            );
        }
    }

    Ok(())
}

fn run_ns(action: NsCommand) -> Result<(), Box<dyn Error>> {
    let inspector = Inspector::default();

    match action {
        NsCommand::List { pid } => {
            for identity in inspector.identities(pid)? {
                println!("{}\t{}", identity.kind, identity.inode);
            }
        }
        NsCommand::Compare { pid1, pid2 } => {
            for compared in inspector.compare(pid1, pid2)? {
                let verdict = if compared.shared { "shared" } else { "private" };
                println!("{}\t{verdict}", compared.kind);
            }
        }
        NsCommand::Members { kind, inode } => {
            let kind = NamespaceType::from_proc_name(&kind)
                .ok_or_else(|| format!("unknown namespace type `{kind}`"))?;
            for pid in inspector.members(kind, inode)? {
                println!("{pid}");
            }
        }
        NsCommand::Report { csv } => {
            let rows = inspector.system_report()?;
            let mut writer = match &csv {
                Some(path) => Some(CsvWriter::create(path)?),
                None => None,
            };
            for row in &rows {
                println!("{}\t{}\t{}", row.kind, row.inode, row.member_count);
                if let Some(writer) = writer.as_mut() {
                    writer.write(row)?;
                }
            }
            if let Some(writer) = writer.as_mut() {
                writer.flush()?;
            }
        }
        NsCommand::Bench { iterations } => {
            let mut bench = OverheadBenchmark::new(CloneFactory).with_iterations(iterations);
            for result in bench.run() {
                match result {
                    Ok(report) => println!(
                        "{}\t{:.1} us over {} iterations",
                        report.kind, report.mean_micros, report.iterations
                    ),
                    Err(err) => log::error!("benchmark failed: {err}"),
                }
            }
        }
    }

    Ok(())
}
