use std::time::Duration;

use clap::Parser;

use crate::probe::{self, ProbeConfig};

#[derive(Debug, Parser)]
#[command(
  name = "uring-probe",
  version,
  about = "Time one io_uring_enter wait with an extended-argument timeout"
)]
pub struct Opt {
  /// Ring capacity passed to io_uring_setup
  #[arg(
    short,
    long,
    default_value_t = probe::DEFAULT_ENTRIES,
    value_parser = clap::value_parser!(u32).range(1..)
  )]
  pub entries: u32,

  /// Wait deadline in milliseconds
  #[arg(short, long, default_value_t = 50)]
  pub timeout_ms: u64,

  /// Completions to wait for before the deadline
  #[arg(short, long, default_value_t = 0)]
  pub min_complete: u32,
}

impl Opt {
  #[must_use]
  pub fn config(&self) -> ProbeConfig {
    ProbeConfig {
      entries: self.entries,
      timeout: Duration::from_millis(self.timeout_ms),
      min_complete: self.min_complete,
    }
  }
}

pub fn parse() -> Opt {
  Opt::parse()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_probe_defaults() {
    let opt = Opt::try_parse_from(["uring-probe"]).unwrap();
    assert_eq!(opt.config(), ProbeConfig::default());
  }

  #[test]
  fn overrides() {
    let opt = Opt::try_parse_from([
      "uring-probe",
      "-e",
      "8",
      "--timeout-ms",
      "1500",
      "-m",
      "1",
    ])
    .unwrap();
    assert_eq!(
      opt.config(),
      ProbeConfig {
        entries: 8,
        timeout: Duration::from_millis(1500),
        min_complete: 1,
      }
    );
  }

  #[test]
  fn zero_entries_rejected() {
    assert!(Opt::try_parse_from(["uring-probe", "--entries", "0"]).is_err());
  }
}
