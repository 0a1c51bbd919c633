// tests/integration/test_helpers.rs

//! Shared fixtures for integration tests: a `Controller` wired to an in-memory management
//! context, with a couple of knobs for provoking start failures.

use clusterd::config::ClusterConfig;
use clusterd::core::entity::memory::MemoryManagementContext;
use clusterd::core::tasks::TokioTaskExecutor;
use clusterd::Controller;
use std::sync::Arc;

pub struct TestContext {
    pub controller: Controller,
    pub management: Arc<MemoryManagementContext>,
}

impl TestContext {
    /// Builds a controller over a root location with `num_zones` availability zones
    /// (0 disables zone support in `config`), using `config` as given except for
    /// `member_spec`, which is always set to a fixed test blueprint name.
    pub fn new(mut config: ClusterConfig, num_zones: u32) -> Self {
        config.member_spec = Some("test-member".to_string());
        config.enable_availability_zones = num_zones > 0;

        let management = Arc::new(MemoryManagementContext::new("root", num_zones));
        let executor = Arc::new(TokioTaskExecutor);
        let controller = Controller::new(config, management.clone(), executor);

        Self {
            controller,
            management,
        }
    }

    pub fn root(&self) -> clusterd::core::entity::Location {
        self.management.root()
    }
}
