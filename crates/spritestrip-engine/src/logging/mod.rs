//! Logger initialization.
//!
//! Code logs through the `log` facade; `env_logger` is the only backend and is
//! installed once by [`init_logging`].

mod init;

pub use init::{LoggingConfig, init_logging};
