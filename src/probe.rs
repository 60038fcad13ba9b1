//! The probe itself: create a ring, issue one timed `io_uring_enter` with an
//! extended argument, time it, report, release the ring.

use std::{io::Write, os::unix::io::RawFd, time::Duration};

use nix::errno::Errno;

use crate::{
  error::Error,
  libc,
  time::{self, Stopwatch},
  uring::{Ring, TimedWait},
};

pub const DEFAULT_ENTRIES: u32 = 256;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

const ENTER_FLAG_NAMES: &[(u32, &str)] = &[
  (libc::IORING_ENTER_GETEVENTS, "GETEVENTS"),
  (libc::IORING_ENTER_SQ_WAKEUP, "SQ_WAKEUP"),
  (libc::IORING_ENTER_SQ_WAIT, "SQ_WAIT"),
  (libc::IORING_ENTER_EXT_ARG, "EXT_ARG"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeConfig {
  /// Requested submission queue capacity.
  pub entries: u32,
  /// How long the enter call may block.
  pub timeout: Duration,
  pub min_complete: u32,
}

impl Default for ProbeConfig {
  fn default() -> Self {
    Self {
      entries: DEFAULT_ENTRIES,
      timeout: DEFAULT_TIMEOUT,
      min_complete: 0,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
  /// The call returned this many available completions.
  Completed(u32),
  /// The deadline passed first (`ETIME`).
  TimedOut,
}

#[derive(Clone, Copy, Debug)]
pub struct Report {
  pub fd: RawFd,
  pub outcome: Outcome,
  pub elapsed: Duration,
}

impl Report {
  #[must_use]
  pub fn completions(&self) -> u32 {
    match self.outcome {
      Outcome::Completed(n) => n,
      Outcome::TimedOut => 0,
    }
  }
}

impl std::fmt::Display for Report {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "Success! ret={}, elapsed={}ms",
      self.completions(),
      self.elapsed.as_millis()
    )?;

    if self.outcome == Outcome::TimedOut {
      write!(f, " (timed out)")?;
    }

    Ok(())
  }
}

/// Runs the probe once, writing the diagnostic text to `out`.
///
/// The ring is released before this returns, on every path.
///
/// # Errors
///
/// See [`Error`]. A wait that merely times out is reported as
/// [`Outcome::TimedOut`], not as an error.
pub fn run<W: Write>(config: &ProbeConfig, out: &mut W) -> Result<Report, Error> {
  let ring = Ring::new(config.entries).map_err(Error::Setup)?;
  let fd = ring.fd();
  writeln!(out, "io_uring fd={fd}")?;

  if !ring.features().contains(libc::IORING_FEAT_EXT_ARG) {
    log::warn!("kernel does not advertise IORING_FEAT_EXT_ARG, expect EINVAL");
  }

  let ts = time::deadline(config.timeout);
  let arg = TimedWait::new(&ts);
  let flags = libc::IORING_ENTER_GETEVENTS | libc::IORING_ENTER_EXT_ARG;

  writeln!(out, "Calling io_uring_enter2:")?;
  writeln!(out, "  fd={fd}")?;
  writeln!(out, "  to_submit=0")?;
  writeln!(out, "  min_complete={}", config.min_complete)?;
  writeln!(out, "  flags={flags:#x} ({})", describe_enter_flags(flags))?;
  writeln!(out, "  arg.ts={:#x} (points to ts)", arg.raw().ts)?;
  writeln!(out, "  arg.sigmask={}", arg.raw().sigmask)?;
  writeln!(out, "  arg.sigmask_sz={}", arg.raw().sigmask_sz)?;
  writeln!(out, "  argsz={}", TimedWait::SIZE)?;
  writeln!(out, "  ts.tv_sec={}, ts.tv_nsec={}", ts.tv_sec, ts.tv_nsec)?;
  out.flush()?;

  let stopwatch = Stopwatch::start().map_err(Error::Clock)?;
  let res = ring.wait(config.min_complete, &arg);
  let elapsed = stopwatch.elapsed().map_err(Error::Clock)?;

  let outcome = match res {
    Ok(n) => Outcome::Completed(n),
    Err(Errno::ETIME) => Outcome::TimedOut,
    Err(err) => {
      log::debug!("io_uring_enter on fd={fd} failed after {elapsed:?}");
      return Err(Error::Enter(err));
    }
  };

  let report = Report {
    fd,
    outcome,
    elapsed,
  };
  writeln!(out, "{report}")?;

  Ok(report)
}

fn describe_enter_flags(flags: u32) -> String {
  let names: Vec<_> = ENTER_FLAG_NAMES
    .iter()
    .filter(|(bit, _)| flags & bit != 0)
    .map(|(_, name)| *name)
    .collect();

  if names.is_empty() {
    "none".to_string()
  } else {
    names.join(" | ")
  }
}
