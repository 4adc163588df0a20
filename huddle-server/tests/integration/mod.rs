pub mod join_tests;
pub mod mailbox_tests;
pub mod presence_tests;
pub mod scenario_tests;

use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
