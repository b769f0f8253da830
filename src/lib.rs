//! Run-history tracking and failure-pattern detection for CI results.
//!
//! Every tracked test or suite owns a [`record::RunRecord`]: lifetime
//! counters plus a bounded window of the latest outcomes. The window answers
//! "is this flaky?" and, through [`template::detect`], "when did this failure
//! pattern start?".

pub mod app_error;
pub mod cli;
pub mod config;
pub mod events;
pub mod identity;
pub mod logging;
pub mod model;
pub mod output;
pub mod record;
pub mod registry;
pub mod template;
pub mod version;

pub fn run() -> i32 {
    match cli::run_cli() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            err.code()
        }
    }
}
