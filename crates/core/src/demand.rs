use std::collections::HashMap;
use tracing::{debug, warn};
use types::{Course, CourseId, Subject, SubjectId, Teacher, DEFAULT_WEEKLY_HOURS};

/// One pending requirement: place `hours_remaining` weekly hours of a
/// subject for a course, attributed to one teacher. Built fresh per teacher
/// per run and consumed by the allocator; never persisted.
#[derive(Clone, Debug)]
pub struct DemandItem {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub course_id: CourseId,
    pub course_label: String,
    pub hours_remaining: u32,
}

/// Expands a teacher's course assignments into the flat demand queue.
/// Emission order follows the assignment list and, within each assignment,
/// the listed subject order; the allocator treats that order as placement
/// priority. Stale course or subject references are configuration drift:
/// skipped with a warning, never fatal.
pub fn build_demand(
    teacher: &Teacher,
    courses: &HashMap<&str, &Course>,
    subjects: &HashMap<&str, &Subject>,
) -> Vec<DemandItem> {
    let mut demand = Vec::new();
    for assignment in &teacher.assignments {
        let Some(course) = courses.get(assignment.course_id.0.as_str()) else {
            warn!(teacher = %teacher.id, course = %assignment.course_id, "assignment references a missing course, skipped");
            continue;
        };
        for subject_id in &assignment.subject_ids {
            let Some(subject) = subjects.get(subject_id.0.as_str()) else {
                warn!(teacher = %teacher.id, subject = %subject_id, "assignment references a missing subject, skipped");
                continue;
            };
            // An explicit zero means the subject is not taught at this
            // level/grade; an absent entry means the table was never filled
            // in and falls back to the default.
            let hours = match subject.hours_for(course.level, course.grade) {
                Some(0) => {
                    debug!(subject = %subject.id, course = %course.id, "zero weekly hours, no demand");
                    continue;
                }
                Some(h) => h,
                None => DEFAULT_WEEKLY_HOURS,
            };
            demand.push(DemandItem {
                subject_id: subject.id.clone(),
                subject_name: subject.name.clone(),
                course_id: course.id.clone(),
                course_label: course.label(),
                hours_remaining: hours,
            });
        }
    }
    demand
}
