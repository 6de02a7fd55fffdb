//! Measures the cost of creating and tearing down namespaces.
//!
//! Each sample clones a child that exits immediately with exactly one
//! namespace isolation flag, then waits for it; the measured window covers
//! clone through reaped child, so teardown is included. Process creation is
//! behind [`IsolatedProcessFactory`] so the benchmark loop itself can be
//! tested without privilege.

use std::time::Instant;

use serde::Serialize;

use super::{NamespaceError, NamespaceType};

/// Samples per namespace type.
pub const DEFAULT_ITERATIONS: u32 = 50;

/// Spawns a no-op child isolated in one namespace and waits for it to exit.
pub trait IsolatedProcessFactory {
    /// # Errors
    ///
    /// Fails with [`NamespaceError::Unsupported`] when `kind` cannot be
    /// isolated here, or [`NamespaceError::Spawn`] when the clone itself
    /// fails.
    fn run_isolated(&mut self, kind: NamespaceType) -> Result<(), NamespaceError>;
}

/// Factory backed by `clone(2)`. Only the Linux build can actually isolate;
/// elsewhere every call is [`NamespaceError::Unsupported`].
#[derive(Debug, Default)]
pub struct CloneFactory;

#[cfg(target_os = "linux")]
mod imp {
    use nix::sched::CloneFlags;
    use nix::sys::wait::waitpid;

    use super::*;

    /// The child only needs to reach its exit; 8 KiB is plenty.
    const CHILD_STACK_BYTES: usize = 8 * 1024;

    fn clone_flag(kind: NamespaceType) -> Option<CloneFlags> {
        match kind {
            NamespaceType::Pid => Some(CloneFlags::CLONE_NEWPID),
            NamespaceType::Net => Some(CloneFlags::CLONE_NEWNET),
            NamespaceType::Mnt => Some(CloneFlags::CLONE_NEWNS),
            NamespaceType::Uts => Some(CloneFlags::CLONE_NEWUTS),
            NamespaceType::Ipc => Some(CloneFlags::CLONE_NEWIPC),
            NamespaceType::User => Some(CloneFlags::CLONE_NEWUSER),
            NamespaceType::Cgroup => None,
        }
    }

    impl IsolatedProcessFactory for CloneFactory {
        fn run_isolated(&mut self, kind: NamespaceType) -> Result<(), NamespaceError> {
            let flags = clone_flag(kind).ok_or(NamespaceError::Unsupported { kind })?;

            let mut stack = [0u8; CHILD_STACK_BYTES];
            // SAFETY: the callback only returns an exit status and borrows
            // nothing from the parent; the stack outlives the child because
            // the child is reaped before this frame returns.
            let child = unsafe {
                nix::sched::clone(Box::new(|| 0), &mut stack, flags, Some(libc::SIGCHLD))
            }
            .map_err(|source| NamespaceError::Spawn { kind, source })?;

            waitpid(child, None).map_err(|source| NamespaceError::Io(source.into()))?;
            Ok(())
        }
    }
}

#[cfg(not(target_os = "linux"))]
impl IsolatedProcessFactory for CloneFactory {
    fn run_isolated(&mut self, kind: NamespaceType) -> Result<(), NamespaceError> {
        Err(NamespaceError::Unsupported { kind })
    }
}

/// Mean creation-plus-teardown cost for one namespace type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverheadReport {
    pub kind: NamespaceType,
    pub iterations: u32,
    /// Arithmetic mean over all iterations, in microseconds.
    pub mean_micros: f64,
}

/// Runs the isolation factory repeatedly and averages the wall-clock cost.
#[derive(Debug)]
pub struct OverheadBenchmark<F> {
    factory: F,
    iterations: u32,
}

impl<F: IsolatedProcessFactory> OverheadBenchmark<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            iterations: DEFAULT_ITERATIONS,
        }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Measures one namespace type, running every iteration sequentially.
    ///
    /// # Errors
    ///
    /// The first failed iteration aborts the measurement with its error;
    /// partial runs are not averaged.
    pub fn measure(&mut self, kind: NamespaceType) -> Result<OverheadReport, NamespaceError> {
        let mut total_micros = 0.0;
        for _ in 0..self.iterations {
            let start = Instant::now();
            self.factory.run_isolated(kind)?;
            total_micros += start.elapsed().as_secs_f64() * 1_000_000.0;
        }

        Ok(OverheadReport {
            kind,
            iterations: self.iterations,
            mean_micros: total_micros / f64::from(self.iterations.max(1)),
        })
    }

    /// Measures every benchmarkable type. A failure aborts only that type's
    /// measurement; the remaining types still run.
    pub fn run(&mut self) -> Vec<Result<OverheadReport, NamespaceError>> {
        NamespaceType::BENCHMARKABLE
            .into_iter()
            .map(|kind| self.measure(kind))
            .collect()
    }
}
