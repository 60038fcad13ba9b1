#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_panics_doc)]
#![allow(non_camel_case_types)]

pub mod cli;
pub mod error;
pub mod libc;
pub mod logger;
pub mod probe;
pub mod time;
pub mod uring;

pub use error::Error;
pub use probe::{run, Outcome, ProbeConfig, Report};
pub use uring::{Features, Ring, TimedWait};
