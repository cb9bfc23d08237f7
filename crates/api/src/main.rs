mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod generate;
    pub mod health;
    pub mod jobs;
    pub mod report;
    pub mod validate;
}

use axum::{
    routing::{get, post},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::generate::generate,
            routes::jobs::status,
            routes::jobs::result,
            routes::validate::validate_handler,
            routes::report::report,
        ),
        components(schemas(
            types::Instance, types::Teacher, types::Course, types::Subject,
            types::WeekConfig, types::DaySchedule, types::Period, types::PeriodKind,
            types::Level, types::LevelScope, types::SubjectKind, types::LevelGrade,
            types::CourseAssignment, types::Restriction, types::Cell, types::OwnerKind,
            types::GeneratedSchedule, types::GenerateParams, types::GenerateEnvelope,
            types::GenerateResult, types::GenerateSummary,
            types::TeacherId, types::CourseId, types::SubjectId,
            jobs::JobId, jobs::JobStatus,
            routes::validate::ValidationReport,
            routes::generate::JobCreated,
            routes::report::ReportIn,
            routes::report::ReportOut,
            routes::report::Usage
        )),
        tags(
            (name = "horario", description = "Timetable generation API")
        )
    )]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let app_state = state::AppState::new_default();

    let app = Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/generate", post(routes::generate::generate))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/report", post(routes::report::report))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(app_state);

    let port = std::env::var("HORARIO__SERVER__PORT").unwrap_or_else(|_| "8080".into());
    let addr: std::net::SocketAddr = format!("0.0.0.0:{}", port).parse()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
