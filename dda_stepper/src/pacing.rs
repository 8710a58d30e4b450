//! Wall-clock pacing of the Run tick.
//!
//! A realtime run sleeps to absolute deadlines one tick period apart, so
//! late wake-ups do not accumulate drift. Under the `rt` feature the
//! deadlines live on `CLOCK_MONOTONIC` and are slept with
//! `clock_nanosleep(TIMER_ABSTIME)`; [`RtPlacement::apply`] additionally
//! locks the process pages and moves the pacing thread onto one core under
//! `SCHED_FIFO`. Without the feature, placement does nothing and deadlines
//! are `std::time::Instant`s.

use std::time::Duration;

use crate::cycle::CycleError;

/// Core and priority for the thread that paces ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtPlacement {
    /// Core the thread is pinned to.
    pub cpu: usize,
    /// `SCHED_FIFO` priority.
    pub priority: i32,
}

impl Default for RtPlacement {
    fn default() -> Self {
        Self {
            cpu: 0,
            priority: 80,
        }
    }
}

impl RtPlacement {
    /// Lock memory, pin the calling thread and switch it to `SCHED_FIFO`.
    ///
    /// # Errors
    /// `CycleError::RtSetup` naming the call that failed. Always `Ok` without
    /// the `rt` feature.
    pub fn apply(&self) -> Result<(), CycleError> {
        os::place(self.cpu, self.priority)
    }
}

/// Absolute-deadline sleeper, one Run tick period per [`TickPacer::wait`].
#[derive(Debug)]
pub struct TickPacer {
    period: Duration,
    deadline: os::Deadline,
}

impl TickPacer {
    /// Pacer for `tick_hz`, starting from now.
    ///
    /// # Errors
    /// `CycleError::RtSetup` for a zero tick rate or an unreadable clock.
    pub fn new(tick_hz: u32) -> Result<Self, CycleError> {
        let period = Duration::from_secs(1)
            .checked_div(tick_hz)
            .ok_or_else(|| CycleError::RtSetup("tick rate is zero".to_string()))?;
        Ok(Self {
            period,
            deadline: os::now()?,
        })
    }

    /// Tick period.
    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep until one period after the previous deadline.
    pub fn wait(&mut self) {
        self.deadline = os::advance(self.deadline, self.period);
        os::sleep_until(&self.deadline);
    }
}

#[cfg(feature = "rt")]
mod os {
    use std::time::Duration;

    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::sys::mman::{MlockallFlags, mlockall};
    use nix::sys::time::TimeSpec;
    use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};
    use nix::unistd::Pid;

    use crate::cycle::CycleError;

    pub(super) type Deadline = TimeSpec;

    fn failed(call: &str, err: impl std::fmt::Display) -> CycleError {
        CycleError::RtSetup(format!("{call}: {err}"))
    }

    pub(super) fn place(cpu: usize, priority: i32) -> Result<(), CycleError> {
        mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
            .map_err(|e| failed("mlockall", e))?;

        let mut cores = CpuSet::new();
        cores.set(cpu).map_err(|e| failed("cpu set", e))?;
        sched_setaffinity(Pid::from_raw(0), &cores).map_err(|e| failed("sched_setaffinity", e))?;

        let param = libc::sched_param {
            sched_priority: priority,
        };
        // SAFETY: pid 0 targets the calling thread; `param` outlives the call.
        if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
            return Err(failed("sched_setscheduler", std::io::Error::last_os_error()));
        }
        Ok(())
    }

    pub(super) fn now() -> Result<Deadline, CycleError> {
        clock_gettime(ClockId::CLOCK_MONOTONIC).map_err(|e| failed("clock_gettime", e))
    }

    pub(super) fn advance(deadline: Deadline, period: Duration) -> Deadline {
        deadline + TimeSpec::from(period)
    }

    pub(super) fn sleep_until(deadline: &Deadline) {
        // EINTR only shortens one period; the next deadline is absolute.
        let _ = clock_nanosleep(
            ClockId::CLOCK_MONOTONIC,
            ClockNanosleepFlags::TIMER_ABSTIME,
            deadline,
        );
    }
}

#[cfg(not(feature = "rt"))]
mod os {
    use std::time::{Duration, Instant};

    use crate::cycle::CycleError;

    pub(super) type Deadline = Instant;

    pub(super) fn place(_cpu: usize, _priority: i32) -> Result<(), CycleError> {
        Ok(())
    }

    pub(super) fn now() -> Result<Deadline, CycleError> {
        Ok(Instant::now())
    }

    pub(super) fn advance(deadline: Deadline, period: Duration) -> Deadline {
        deadline + period
    }

    pub(super) fn sleep_until(deadline: &Deadline) {
        if let Some(rest) = deadline.checked_duration_since(Instant::now()) {
            std::thread::sleep(rest);
        }
    }
}
