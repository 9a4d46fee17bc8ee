use tracing_subscriber::EnvFilter;

/// Routes the tree's `trace!` events to the test output.
///
/// Silent unless `RUST_LOG` asks for them, e.g. `RUST_LOG=cursor_btree=trace`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
