//! CLI argument parsing and command handling.

mod args;

pub use args::{Cli, Command, ConfigAction, GlobalArgs, Operation, OperationArgs, RemoteOperation, normalize_args};
