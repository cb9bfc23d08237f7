pub mod demand;
pub mod grid;
pub mod report;

use async_trait::async_trait;
use thiserror::Error;

pub use types::{
    Cell, Course, GenerateEnvelope, GenerateResult, GenerateSummary, GeneratedSchedule, Instance,
    LevelGrade, OwnerKind, Subject, Teacher, WeekConfig,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid instance: {0}")]
    Msg(String),
}

pub fn validate(inst: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    if inst.week.days.is_empty() {
        errors.push("week has no days".into());
    }

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name} id: {s}"));
            }
        }
    }
    chk_unique("day", inst.week.days.iter().map(|d| &d.day), &mut errors);
    chk_unique(
        "teacher",
        inst.teachers.iter().map(|x| &x.id.0),
        &mut errors,
    );
    chk_unique("course", inst.courses.iter().map(|x| &x.id.0), &mut errors);
    chk_unique("subject", inst.subjects.iter().map(|x| &x.id.0), &mut errors);

    for day in &inst.week.days {
        if day.periods.is_empty() {
            errors.push(format!("day {} has no periods", day.day));
        }
        chk_unique(
            &format!("period on {}", day.day),
            day.periods.iter().map(|p| &p.name),
            &mut errors,
        );
    }

    for s in &inst.subjects {
        for key in s.weekly_hours.keys() {
            if !LevelGrade(key.clone()).is_valid_format() {
                errors.push(format!(
                    "subject {} has malformed hour-table key: {key}",
                    s.id.0
                ));
            }
        }
    }

    let courses = inst.courses_by_id();
    for t in &inst.teachers {
        if t.weekly_hours == 0 {
            errors.push(format!("teacher {} has weekly_hours=0", t.id.0));
        }
        for a in &t.assignments {
            // A dangling course id is configuration drift, skipped at run
            // time; a level mismatch on a resolvable course is a data error.
            if let Some(course) = courses.get(a.course_id.0.as_str()) {
                if !t.levels.covers(course.level) {
                    errors.push(format!(
                        "teacher {} ({:?}) is assigned to course {} at level {}",
                        t.id.0, t.levels, course.id.0, course.level
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

#[async_trait]
pub trait Generator: Send + Sync + 'static {
    async fn generate(&self, env: GenerateEnvelope) -> anyhow::Result<GenerateResult>;
}
