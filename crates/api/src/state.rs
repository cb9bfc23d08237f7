use generator::GreedyGenerator;
use jobs::InMemJobs;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<GreedyGenerator>>,
}

impl AppState {
    pub fn new_default() -> Self {
        Self {
            jobs: Arc::new(InMemJobs::new(GreedyGenerator::new())),
        }
    }
}
