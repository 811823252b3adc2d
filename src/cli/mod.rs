//! Command-line interface

pub mod commands;

pub use commands::{
    cmd_demo, cmd_keygen, cmd_status, cmd_sweep, cmd_validate, load_config, AppState, CliResult,
};
