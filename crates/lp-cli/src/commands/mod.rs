//! CLI subcommand implementations.

pub mod add;
pub mod calendar;
pub mod import;
pub mod items;
pub mod status;
pub mod task;
pub mod util;
