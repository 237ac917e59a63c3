//! Test-only helpers shared across crates.

use std::sync::OnceLock;

use crate::logger::init_logger;

static INIT: OnceLock<()> = OnceLock::new();

/// Initialize the logger exactly once for the test process.
pub fn init() {
    INIT.get_or_init(|| {
        init_logger(log::LevelFilter::Debug);
    });
}
