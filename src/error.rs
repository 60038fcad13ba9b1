use nix::errno::Errno;

/// Everything that ends a probe run early. Each variant maps to exit status 1.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// `io_uring_setup` failed. No ring exists, so nothing is released.
  #[error("io_uring_setup failed: errno={} ({})", errno_code(.0), .0.desc())]
  Setup(Errno),

  /// `io_uring_enter` failed with something other than an expired deadline.
  #[error("io_uring_enter failed: ret=-1, errno={} ({})", errno_code(.0), .0.desc())]
  Enter(Errno),

  #[error("clock_gettime(CLOCK_MONOTONIC): {}", .0.desc())]
  Clock(Errno),

  #[error("failed to write diagnostics: {0}")]
  Output(#[from] std::io::Error),
}

fn errno_code(err: &Errno) -> i32 {
  *err as i32
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages() {
    assert_eq!(
      Error::Setup(Errno::EINVAL).to_string(),
      format!("io_uring_setup failed: errno={} (Invalid argument)", Errno::EINVAL as i32)
    );
    assert_eq!(
      Error::Enter(Errno::EINTR).to_string(),
      format!(
        "io_uring_enter failed: ret=-1, errno={} (Interrupted system call)",
        Errno::EINTR as i32
      )
    );
  }
}
