use crate::error::ApiError;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use horario_core::report::compute_report;
use types::{GeneratedSchedule, Instance};

#[derive(Deserialize, ToSchema)]
pub struct ReportIn {
    pub instance: Instance,
    pub schedules: Vec<GeneratedSchedule>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub owner_id: String,
    pub name: String,
    pub lessons: u32,
    pub blocked: u32,
    pub free: u32,
    pub budget: Option<u32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportOut {
    pub consistent: bool,
    pub lessons_total: u32,
    pub teachers: Vec<Usage>,
    pub courses: Vec<Usage>,
    pub mismatches: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/v1/report",
    request_body = ReportIn,
    responses(
    (status = 200, description = "Occupancy and consistency breakdown for a schedule set", body = ReportOut),
    (status = 400, description = "Empty schedule set")
    )
)]
pub async fn report(Json(input): Json<ReportIn>) -> Result<Json<ReportOut>, ApiError> {
    if input.schedules.is_empty() {
        return Err(ApiError("no schedules provided".into()));
    }
    let r = compute_report(&input.instance, &input.schedules);
    let usage = |u: &horario_core::report::OwnerUsage| Usage {
        owner_id: u.owner_id.clone(),
        name: u.name.clone(),
        lessons: u.lessons,
        blocked: u.blocked,
        free: u.free,
        budget: u.budget,
    };
    Ok(Json(ReportOut {
        consistent: r.is_consistent(),
        lessons_total: r.lessons_total,
        teachers: r.teachers.iter().map(usage).collect(),
        courses: r.courses.iter().map(usage).collect(),
        mismatches: r.mismatches,
    }))
}
