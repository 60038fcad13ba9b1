use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_uring-probe");

#[test]
fn setup_failure_exits_with_one() {
  // far above the kernel's entry limit, rejected before any wait
  let output = Command::new(BIN)
    .args(["--entries", "4294967295"])
    .output()
    .unwrap();

  let stdout = String::from_utf8(output.stdout).unwrap();
  assert_eq!(output.status.code(), Some(1));
  assert!(stdout.starts_with("io_uring_setup failed: errno="), "{stdout}");
  assert!(!stdout.contains("Calling io_uring_enter2"));
}

#[test]
fn zero_entries_is_a_usage_error() {
  let output = Command::new(BIN).args(["-e", "0"]).output().unwrap();
  assert_eq!(output.status.code(), Some(2));
}

#[test]
fn default_run_exits_with_zero() {
  match uring_probe::Ring::new(256) {
    Ok(ring) if ring.features().contains(uring_probe::libc::IORING_FEAT_EXT_ARG) => {}
    _ => {
      println!("skipping: io_uring unavailable");
      return;
    }
  }

  let output = Command::new(BIN).output().unwrap();
  let stdout = String::from_utf8(output.stdout).unwrap();

  assert_eq!(output.status.code(), Some(0), "{stdout}");
  assert!(stdout.lines().last().unwrap().starts_with("Success! ret="));
}
