//! Terminal front end for jumon.
//!
//! The binary wires these pieces together; they live in a library so the
//! session logic can be driven from tests without a terminal.

pub mod command;
pub mod config;
pub mod listing;
pub mod session;

pub use command::{Command, CommandError};
pub use config::{ConfigError, JumonConfig};
pub use session::{Reply, Session, SessionError};
