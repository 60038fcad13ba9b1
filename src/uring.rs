//! Raw `io_uring_setup` / `io_uring_enter` syscalls and the ring handle they
//! produce.
//!
//! Only the calls needed to wait on the completion queue are exposed; the
//! submission and completion rings are never mapped.

use std::{marker::PhantomData, os::unix::io::RawFd};

use nix::errno::Errno;

use crate::libc;

const FEATURE_NAMES: &[(u32, &str)] = &[
  (libc::IORING_FEAT_SINGLE_MMAP, "SINGLE_MMAP"),
  (libc::IORING_FEAT_NODROP, "NODROP"),
  (libc::IORING_FEAT_SUBMIT_STABLE, "SUBMIT_STABLE"),
  (libc::IORING_FEAT_RW_CUR_POS, "RW_CUR_POS"),
  (libc::IORING_FEAT_CUR_PERSONALITY, "CUR_PERSONALITY"),
  (libc::IORING_FEAT_FAST_POLL, "FAST_POLL"),
  (libc::IORING_FEAT_POLL_32BITS, "POLL_32BITS"),
  (libc::IORING_FEAT_SQPOLL_NONFIXED, "SQPOLL_NONFIXED"),
  (libc::IORING_FEAT_EXT_ARG, "EXT_ARG"),
  (libc::IORING_FEAT_NATIVE_WORKERS, "NATIVE_WORKERS"),
  (libc::IORING_FEAT_RSRC_TAGS, "RSRC_TAGS"),
];

/// Feature bits the kernel reported back from `io_uring_setup`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Features(u32);

impl Features {
  #[must_use]
  pub fn bits(self) -> u32 {
    self.0
  }

  #[must_use]
  pub fn contains(self, feature: u32) -> bool {
    self.0 & feature == feature
  }

  /// Names of the known bits that are set. Unknown bits are skipped.
  pub fn names(self) -> impl Iterator<Item = &'static str> {
    FEATURE_NAMES
      .iter()
      .filter(move |(bit, _)| self.contains(*bit))
      .map(|(_, name)| *name)
  }
}

/// Extended argument block for a timed `io_uring_enter`.
///
/// The kernel reads the deadline through the address stored in `ts`, so the
/// block borrows the deadline for as long as it exists.
pub struct TimedWait<'ts> {
  arg: libc::io_uring_getevents_arg,
  _ts: PhantomData<&'ts libc::kernel_timespec>,
}

impl<'ts> TimedWait<'ts> {
  /// Byte size handed to the kernel as `argsz`.
  pub const SIZE: usize = std::mem::size_of::<libc::io_uring_getevents_arg>();

  #[must_use]
  pub fn new(ts: &'ts libc::kernel_timespec) -> Self {
    Self {
      arg: libc::io_uring_getevents_arg {
        sigmask: 0,
        sigmask_sz: 0,
        pad: 0,
        ts: std::ptr::addr_of!(*ts) as u64,
      },
      _ts: PhantomData,
    }
  }

  #[must_use]
  pub fn raw(&self) -> &libc::io_uring_getevents_arg {
    &self.arg
  }

  #[must_use]
  pub fn as_ptr(&self) -> *const libc::c_void {
    std::ptr::addr_of!(self.arg).cast()
  }
}

/// An io_uring instance. The descriptor is closed when the ring is dropped.
pub struct Ring {
  fd: RawFd,
  params: libc::io_uring_params,
}

impl Ring {
  /// Creates a ring with room for `entries` submissions and no setup flags.
  ///
  /// # Errors
  ///
  /// Returns the errno the kernel reported, e.g. `EINVAL` for a zero or
  /// oversized `entries`, `EPERM`/`ENOSYS` where io_uring is disabled.
  pub fn new(entries: u32) -> Result<Self, Errno> {
    let mut params = libc::io_uring_params::default();

    let ret = unsafe {
      ::libc::syscall(
        ::libc::SYS_io_uring_setup,
        entries,
        std::ptr::addr_of_mut!(params),
      )
    };

    if ret < 0 {
      return Err(Errno::last());
    }

    let fd = RawFd::try_from(ret).map_err(|_| Errno::EOVERFLOW)?;
    let ring = Self { fd, params };

    log::debug!(
      "io_uring_setup: fd={fd} sq_entries={} cq_entries={} features={:#x}",
      params.sq_entries,
      params.cq_entries,
      ring.features().bits()
    );
    log::trace!(
      "io_uring features: {}",
      ring.features().names().collect::<Vec<_>>().join(" | ")
    );

    Ok(ring)
  }

  #[must_use]
  pub fn fd(&self) -> RawFd {
    self.fd
  }

  #[must_use]
  pub fn params(&self) -> &libc::io_uring_params {
    &self.params
  }

  #[must_use]
  pub fn features(&self) -> Features {
    Features(self.params.features)
  }

  /// Raw `io_uring_enter`.
  ///
  /// # Errors
  ///
  /// Returns the errno for a negative result, `ETIME` included.
  ///
  /// # Safety
  ///
  /// `arg` and `argsz` must describe what `flags` tells the kernel to expect:
  /// a sigset when `IORING_ENTER_EXT_ARG` is clear, an
  /// `io_uring_getevents_arg` (whose `ts` points at a live timespec) when it
  /// is set. Both must stay valid until the call returns.
  pub unsafe fn enter(
    &self,
    to_submit: u32,
    min_complete: u32,
    flags: u32,
    arg: *const libc::c_void,
    argsz: usize,
  ) -> Result<u32, Errno> {
    let ret = ::libc::syscall(
      ::libc::SYS_io_uring_enter,
      self.fd,
      to_submit,
      min_complete,
      flags,
      arg,
      argsz,
    );

    if ret < 0 {
      return Err(Errno::last());
    }

    u32::try_from(ret).map_err(|_| Errno::EOVERFLOW)
  }

  /// Waits for `min_complete` completions or until the deadline in `arg`
  /// passes, whichever comes first. Nothing is submitted.
  ///
  /// # Errors
  ///
  /// `ETIME` when the deadline passed with fewer than `min_complete`
  /// completions, or whatever else the kernel reports.
  pub fn wait(&self, min_complete: u32, arg: &TimedWait<'_>) -> Result<u32, Errno> {
    unsafe {
      self.enter(
        0,
        min_complete,
        libc::IORING_ENTER_GETEVENTS | libc::IORING_ENTER_EXT_ARG,
        arg.as_ptr(),
        TimedWait::SIZE,
      )
    }
  }
}

impl Drop for Ring {
  fn drop(&mut self) {
    log::debug!("closing io_uring fd={}", self.fd);
    if let Err(err) = nix::unistd::close(self.fd) {
      log::error!("failed to close io_uring fd={}: {}", self.fd, err.desc());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timed_wait_points_at_deadline() {
    let ts = libc::kernel_timespec {
      tv_sec: 0,
      tv_nsec: 50_000_000,
    };
    let arg = TimedWait::new(&ts);

    assert_eq!(arg.raw().ts, std::ptr::addr_of!(ts) as u64);
    assert_eq!(arg.raw().sigmask, 0);
    assert_eq!(arg.raw().sigmask_sz, 0);
    assert_eq!(TimedWait::SIZE, 24);
  }

  #[test]
  fn feature_names() {
    let features = Features(libc::IORING_FEAT_NODROP | libc::IORING_FEAT_EXT_ARG | (1 << 31));
    assert!(features.contains(libc::IORING_FEAT_EXT_ARG));
    assert!(!features.contains(libc::IORING_FEAT_FAST_POLL));
    assert_eq!(features.names().collect::<Vec<_>>(), ["NODROP", "EXT_ARG"]);
  }
}
