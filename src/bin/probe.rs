#![warn(clippy::pedantic)]

use std::{io::Write, process::ExitCode};

extern crate uring_probe;

fn main() -> ExitCode {
  uring_probe::logger::init();

  let config = uring_probe::cli::parse().config();
  log::debug!("probe config: {config:?}");

  let stdout = std::io::stdout();
  let mut out = stdout.lock();

  match uring_probe::run(&config, &mut out) {
    Ok(report) => {
      log::debug!("probe finished: {report:?}");
      ExitCode::SUCCESS
    }
    Err(err) => {
      if writeln!(out, "{err}").is_err() {
        log::error!("{err}");
      }
      ExitCode::FAILURE
    }
  }
}
