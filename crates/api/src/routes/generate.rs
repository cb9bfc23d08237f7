use crate::state::AppState;
use axum::{extract::State, Json};
use types::GenerateEnvelope;
use utoipa::ToSchema;

#[derive(serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
        post,
        path = "/v1/generate",
        request_body = GenerateEnvelope,
        responses((status = 200, description = "Generation job enqueued", body = JobCreated))
    )]
pub async fn generate(
    State(state): State<AppState>,
    Json(env): Json<GenerateEnvelope>,
) -> Json<JobCreated> {
    let id = state.jobs.enqueue(env);
    Json(JobCreated {
        job_id: id.0,
        status: "queued",
    })
}
