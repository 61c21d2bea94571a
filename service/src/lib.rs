use log::info;
use std::sync::Arc;
use store::memory::InMemoryStore;

pub mod config;
pub mod logging;

/// Builds the process-wide store handle. Created once at startup and shared
/// across all request invocations; the handle is safe for concurrent reuse and
/// is recreated on the next cold start rather than torn down explicitly.
pub fn init_store(config: &config::Config) -> Arc<InMemoryStore> {
    info!(
        "Store config: connection_ttl={}s, token_ttl={}s",
        config.connection_ttl_secs, config.token_ttl_secs
    );

    Arc::new(InMemoryStore::new())
}
