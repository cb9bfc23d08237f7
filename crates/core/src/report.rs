use serde::Serialize;
use std::collections::HashMap;
use types::{Cell, GeneratedSchedule, Instance, OwnerKind};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerUsage {
    pub owner_id: String,
    pub name: String,
    pub lessons: u32,
    pub blocked: u32,
    pub free: u32,
    /// Weekly available-hours budget, teachers only.
    pub budget: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub teachers: Vec<OwnerUsage>,
    pub courses: Vec<OwnerUsage>,
    pub lessons_total: u32,
    /// Violations of the lockstep invariant: a lesson on one side whose
    /// counterpart cell does not reference the same subject and owner.
    pub mismatches: Vec<String>,
}

impl Report {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Occupancy breakdown plus a dual-grid audit over a finished schedule set.
/// Every teacher-side lesson must be mirrored by the named course's cell and
/// vice versa; one-sided writes cannot happen through the grid store, so a
/// mismatch here means the schedule set was tampered with or mixed from
/// different runs.
pub fn compute_report(inst: &Instance, schedules: &[GeneratedSchedule]) -> Report {
    let by_id: HashMap<&str, &GeneratedSchedule> =
        schedules.iter().map(|s| (s.id.as_str(), s)).collect();
    let budgets: HashMap<&str, u32> = inst
        .teachers
        .iter()
        .map(|t| (t.id.0.as_str(), t.weekly_hours))
        .collect();

    let mut report = Report::default();

    for schedule in schedules {
        let mut usage = OwnerUsage {
            owner_id: schedule.owner_id.clone(),
            name: schedule.name.clone(),
            lessons: 0,
            blocked: 0,
            free: 0,
            budget: match schedule.owner_kind {
                OwnerKind::Teacher => budgets.get(schedule.owner_id.as_str()).copied(),
                OwnerKind::Course => None,
            },
        };
        for (day, cells) in &schedule.grid {
            for (period, cell) in cells {
                match cell {
                    Cell::Free => usage.free += 1,
                    Cell::Blocked { .. } => usage.blocked += 1,
                    Cell::Lesson { .. } => {
                        usage.lessons += 1;
                        audit_cell(schedule, day, period, cell, &by_id, &mut report.mismatches);
                    }
                    Cell::Off { .. } => {}
                }
            }
        }
        match schedule.owner_kind {
            OwnerKind::Teacher => {
                report.lessons_total += usage.lessons;
                report.teachers.push(usage);
            }
            OwnerKind::Course => report.courses.push(usage),
        }
    }

    report
}

fn audit_cell(
    schedule: &GeneratedSchedule,
    day: &str,
    period: &str,
    cell: &Cell,
    by_id: &HashMap<&str, &GeneratedSchedule>,
    mismatches: &mut Vec<String>,
) {
    let Cell::Lesson {
        subject_id,
        teacher_id,
        course_id,
        ..
    } = cell
    else {
        return;
    };

    let (counterpart_kind, counterpart_id) = match schedule.owner_kind {
        OwnerKind::Teacher => (OwnerKind::Course, course_id.as_ref().map(|c| c.0.as_str())),
        OwnerKind::Course => (OwnerKind::Teacher, teacher_id.as_ref().map(|t| t.0.as_str())),
    };
    let Some(counterpart_id) = counterpart_id else {
        mismatches.push(format!(
            "{}: lesson at {day}/{period} names no counterpart",
            schedule.id
        ));
        return;
    };

    let counterpart_schedule_id = GeneratedSchedule::schedule_id(counterpart_kind, counterpart_id);
    let Some(counterpart) = by_id.get(counterpart_schedule_id.as_str()) else {
        mismatches.push(format!(
            "{}: lesson at {day}/{period} references missing schedule {counterpart_schedule_id}",
            schedule.id
        ));
        return;
    };

    match counterpart.cell(day, period) {
        Some(Cell::Lesson {
            subject_id: other_subject,
            teacher_id: other_teacher,
            course_id: other_course,
            ..
        }) => {
            let refers_back = match schedule.owner_kind {
                OwnerKind::Teacher => other_teacher
                    .as_ref()
                    .is_some_and(|t| t.0 == schedule.owner_id),
                OwnerKind::Course => other_course
                    .as_ref()
                    .is_some_and(|c| c.0 == schedule.owner_id),
            };
            if other_subject != subject_id || !refers_back {
                mismatches.push(format!(
                    "{} and {counterpart_schedule_id} disagree at {day}/{period}",
                    schedule.id
                ));
            }
        }
        _ => mismatches.push(format!(
            "{}: lesson at {day}/{period} is one-sided, {counterpart_schedule_id} has no matching cell",
            schedule.id
        )),
    }
}
