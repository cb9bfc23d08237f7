use horario_core::Generator;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;
use types::{GenerateEnvelope, GenerateResult};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status")]
pub enum JobStatus {
    Queued,
    Running,
    Done { result: GenerateResult },
    Failed { message: String },
}

#[derive(Clone)]
pub struct InMemJobs<G: Generator> {
    inner: std::sync::Arc<RwLock<HashMap<String, JobStatus>>>,
    generator: std::sync::Arc<G>,
}

impl<G: Generator> InMemJobs<G> {
    pub fn new(generator: G) -> Self {
        Self {
            inner: Default::default(),
            generator: std::sync::Arc::new(generator),
        }
    }

    pub fn enqueue(&self, mut env: GenerateEnvelope) -> JobId {
        // The run itself is a pure function of its envelope; wall-clock
        // enters here, once, unless the caller already stamped it.
        if env.generated_at == 0 {
            env.generated_at = now_ms();
        }

        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let generator = self.generator.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            {
                let mut w = map.write();
                w.insert(id_for_task.clone(), JobStatus::Running);
            }
            match generator.generate(env).await {
                Ok(result) => {
                    map.write()
                        .insert(id_for_task, JobStatus::Done { result });
                }
                Err(e) => {
                    error!(?e, "generation job failed");
                    map.write().insert(
                        id_for_task,
                        JobStatus::Failed {
                            message: e.to_string(),
                        },
                    );
                }
            }
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).cloned()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
