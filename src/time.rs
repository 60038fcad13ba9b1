use std::time::Duration;

use nix::{
  errno::Errno,
  sys::time::TimeSpec,
  time::{clock_gettime, ClockId},
};

use crate::libc;

/// Converts a relative timeout into the kernel's timespec layout.
///
/// Seconds beyond `i64::MAX` saturate.
#[must_use]
pub fn deadline(dur: Duration) -> libc::kernel_timespec {
  libc::kernel_timespec {
    tv_sec: i64::try_from(dur.as_secs()).unwrap_or(i64::MAX),
    tv_nsec: i64::from(dur.subsec_nanos()),
  }
}

/// Measures elapsed time on `CLOCK_MONOTONIC`.
pub struct Stopwatch {
  start: TimeSpec,
}

impl Stopwatch {
  /// # Errors
  ///
  /// Fails only if the monotonic clock is unavailable.
  pub fn start() -> Result<Self, Errno> {
    Ok(Self { start: now()? })
  }

  /// # Errors
  ///
  /// Fails only if the monotonic clock is unavailable.
  pub fn elapsed(&self) -> Result<Duration, Errno> {
    let diff = now()? - self.start;

    let secs = u64::try_from(diff.tv_sec()).unwrap_or(0);
    let nanos = u32::try_from(diff.tv_nsec()).unwrap_or(0);
    Ok(Duration::new(secs, nanos))
  }
}

fn now() -> Result<TimeSpec, Errno> {
  clock_gettime(ClockId::CLOCK_MONOTONIC)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deadline_split() {
    assert_eq!(
      deadline(Duration::from_millis(50)),
      libc::kernel_timespec {
        tv_sec: 0,
        tv_nsec: 50_000_000
      }
    );

    assert_eq!(
      deadline(Duration::from_millis(1500)),
      libc::kernel_timespec {
        tv_sec: 1,
        tv_nsec: 500_000_000
      }
    );

    assert_eq!(deadline(Duration::MAX).tv_sec, i64::MAX);
  }

  #[test]
  fn stopwatch_is_monotonic() {
    let sw = Stopwatch::start().unwrap();
    std::thread::sleep(Duration::from_millis(20));
    let first = sw.elapsed().unwrap();
    let second = sw.elapsed().unwrap();

    assert!(first >= Duration::from_millis(20));
    assert!(second >= first);
  }
}
