use std::io::Write;

use log::LevelFilter;

/// Logs go to stderr, keeping stdout for the probe's own output.
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init() {
  env_logger::builder()
    .filter_level(LevelFilter::Warn)
    .parse_default_env()
    .format(|buf, record| {
      let l = &record.level().as_str()[..1];
      writeln!(buf, "{} [{l}] {}", buf.timestamp_millis(), record.args())
    })
    .init();
}
