mod allocate;

use anyhow::bail;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info};

use horario_core::demand::build_demand;
use horario_core::grid::{GridStore, ScheduleGrid, WeekShape};
use horario_core::Generator;
use types::{
    Course, GenerateEnvelope, GenerateResult, GenerateSummary, GeneratedSchedule, OwnerKind,
    Subject, Teacher, WeekConfig,
};

use allocate::AllocOutcome;

/// Single-pass deterministic generator: teachers are processed strictly in
/// input order because a later teacher's demand can collide with course
/// slots an earlier teacher already claimed.
pub struct GreedyGenerator;

impl GreedyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreedyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for GreedyGenerator {
    async fn generate(&self, env: GenerateEnvelope) -> anyhow::Result<GenerateResult> {
        Ok(run(env))
    }
}

/// Runs one full generation pass. Always produces a best-effort result:
/// drift and collisions are tallied, a faulty teacher record only loses its
/// own schedule. Every grid starts freshly initialized, so reruns replace
/// rather than merge.
pub fn run(env: GenerateEnvelope) -> GenerateResult {
    let started = Instant::now();
    let inst = &env.instance;
    let shape = WeekShape::new(&inst.week);
    let courses = inst.courses_by_id();
    let subjects = inst.subjects_by_id();

    let mut store = GridStore::new();
    for course in &inst.courses {
        store.ensure_course(&course.id, &inst.week);
    }

    let mut schedules: Vec<GeneratedSchedule> = Vec::new();
    let mut conflicts = 0u64;
    let mut placed_hours = 0u32;
    let mut skipped_teachers: Vec<String> = Vec::new();

    for teacher in &inst.teachers {
        match process_teacher(
            &mut store, teacher, &courses, &subjects, &inst.week, &shape, &env,
        ) {
            Ok((grid, outcome)) => {
                conflicts += outcome.conflicts;
                placed_hours += outcome.placed;
                schedules.push(wrap(
                    OwnerKind::Teacher,
                    &teacher.id.0,
                    &teacher.name,
                    grid,
                    env.generated_at,
                ));
            }
            Err(e) => {
                error!(teacher = %teacher.id, error = %e, "teacher processing failed, schedule omitted");
                skipped_teachers.push(teacher.id.0.clone());
            }
        }
    }
    let teacher_schedules = schedules.len() as u32;

    // Course schedules are the accumulated side effect of every teacher's
    // allocation; untouched courses come out all-free.
    let mut course_schedules = 0u32;
    for course in &inst.courses {
        if let Some(grid) = store.take_course(&course.id) {
            schedules.push(wrap(
                OwnerKind::Course,
                &course.id.0,
                &course.label(),
                grid,
                env.generated_at,
            ));
            course_schedules += 1;
        }
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        teacher_schedules,
        course_schedules, conflicts, placed_hours, elapsed_ms, "generation complete"
    );

    GenerateResult {
        status: "generated".into(),
        schedules,
        summary: GenerateSummary {
            teacher_schedules,
            course_schedules,
            conflicts,
            elapsed_ms,
        },
        stats: serde_json::json!({
            "method": "greedy",
            "placedHours": placed_hours,
            "skippedTeachers": skipped_teachers,
        }),
    }
}

fn process_teacher(
    store: &mut GridStore,
    teacher: &Teacher,
    courses: &HashMap<&str, &Course>,
    subjects: &HashMap<&str, &Subject>,
    week: &WeekConfig,
    shape: &WeekShape,
    env: &GenerateEnvelope,
) -> anyhow::Result<(ScheduleGrid, AllocOutcome)> {
    if teacher.id.0.trim().is_empty() {
        bail!("teacher record has an empty id");
    }
    if teacher.name.trim().is_empty() {
        bail!("teacher {} has an empty name", teacher.id);
    }

    let mut grid = ScheduleGrid::initialize(week);
    grid.apply_restrictions(&teacher.restrictions);
    store.insert_teacher(&teacher.id, grid);

    let mut demand = build_demand(teacher, courses, subjects);
    debug!(teacher = %teacher.id, items = demand.len(), "demand built");

    let outcome = allocate::allocate(store, teacher, &mut demand, shape, &env.params);
    let grid = match store.take_teacher(&teacher.id) {
        Some(grid) => grid,
        None => bail!("teacher {} grid vanished from the store", teacher.id),
    };
    Ok((grid, outcome))
}

fn wrap(
    owner_kind: OwnerKind,
    owner_id: &str,
    name: &str,
    grid: ScheduleGrid,
    generated_at: u64,
) -> GeneratedSchedule {
    GeneratedSchedule {
        id: GeneratedSchedule::schedule_id(owner_kind, owner_id),
        owner_kind,
        owner_id: owner_id.to_string(),
        name: name.to_string(),
        grid: grid.into_cells(),
        generated_at,
    }
}
