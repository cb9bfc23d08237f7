use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use generator::run;
use horario_core::report::compute_report;
use types::{
    Cell, Course, CourseAssignment, CourseId, DaySchedule, GenerateEnvelope, GenerateParams,
    Instance, Level, LevelScope, Period, PeriodKind, Subject, SubjectId, Teacher, TeacherId,
    WeekConfig,
};

fn week() -> WeekConfig {
    WeekConfig {
        days: ["Lunes", "Martes", "Miércoles", "Jueves", "Viernes"]
            .iter()
            .map(|d| DaySchedule {
                day: (*d).into(),
                periods: vec![
                    Period {
                        name: "Primera Hora".into(),
                        start: "08:00".into(),
                        end: "08:45".into(),
                        kind: PeriodKind::Class,
                    },
                    Period {
                        name: "Segunda Hora".into(),
                        start: "08:45".into(),
                        end: "09:30".into(),
                        kind: PeriodKind::Class,
                    },
                    Period {
                        name: "Recreo".into(),
                        start: "09:30".into(),
                        end: "10:00".into(),
                        kind: PeriodKind::Break,
                    },
                    Period {
                        name: "Tercera Hora".into(),
                        start: "10:00".into(),
                        end: "10:45".into(),
                        kind: PeriodKind::Class,
                    },
                    Period {
                        name: "Cuarta Hora".into(),
                        start: "10:45".into(),
                        end: "11:30".into(),
                        kind: PeriodKind::Class,
                    },
                ],
            })
            .collect(),
    }
}

/// Builds a small envelope from sampled shape parameters. The construction
/// itself is deterministic so every failure reproduces from the seed.
fn build_envelope(
    n_teachers: usize,
    n_courses: usize,
    subject_hours: Vec<u32>,
    double_periods: bool,
) -> GenerateEnvelope {
    let subjects: Vec<Subject> = subject_hours
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            let mut weekly_hours = HashMap::new();
            weekly_hours.insert("primary.3".to_string(), h);
            Subject {
                id: SubjectId(format!("s{i}")),
                name: format!("Materia {i}"),
                color: None,
                kind: Default::default(),
                weekly_hours,
            }
        })
        .collect();
    let courses: Vec<Course> = (0..n_courses)
        .map(|i| Course {
            id: CourseId(format!("c{i}")),
            name: "Tercero".into(),
            level: Level::Primary,
            grade: 3,
            section: format!("{}", (b'A' + i as u8) as char),
            students: 25,
        })
        .collect();
    let teachers: Vec<Teacher> = (0..n_teachers)
        .map(|i| Teacher {
            id: TeacherId(format!("t{i}")),
            name: format!("Docente {i}"),
            specialty: String::new(),
            levels: LevelScope::Both,
            weekly_hours: 30,
            assignments: vec![CourseAssignment {
                course_id: CourseId(format!("c{}", i % n_courses)),
                subject_ids: subjects.iter().map(|s| s.id.clone()).collect(),
            }],
            restrictions: vec![],
        })
        .collect();

    GenerateEnvelope {
        instance: Instance {
            teachers,
            courses,
            subjects,
            week: week(),
        },
        params: GenerateParams {
            double_periods,
            ..Default::default()
        },
        generated_at: 1,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn generation_is_deterministic(
        n_teachers in 1..=3usize,
        n_courses in 1..=2usize,
        subject_hours in prop::collection::vec(0u32..=6, 1..=3),
        double_periods in any::<bool>(),
    ) {
        let first = run(build_envelope(n_teachers, n_courses, subject_hours.clone(), double_periods));
        let second = run(build_envelope(n_teachers, n_courses, subject_hours, double_periods));
        prop_assert_eq!(
            serde_json::to_string(&first.schedules).unwrap(),
            serde_json::to_string(&second.schedules).unwrap()
        );
        prop_assert_eq!(first.summary.conflicts, second.summary.conflicts);
    }

    #[test]
    fn grids_always_stay_in_lockstep(
        n_teachers in 1..=3usize,
        n_courses in 1..=2usize,
        subject_hours in prop::collection::vec(0u32..=6, 1..=3),
        double_periods in any::<bool>(),
    ) {
        let env = build_envelope(n_teachers, n_courses, subject_hours, double_periods);
        let inst = env.instance.clone();
        let result = run(env);
        let report = compute_report(&inst, &result.schedules);
        prop_assert!(report.is_consistent(), "{:?}", report.mismatches);
    }

    #[test]
    fn lessons_only_land_on_class_periods(
        n_teachers in 1..=3usize,
        n_courses in 1..=2usize,
        subject_hours in prop::collection::vec(0u32..=6, 1..=3),
        double_periods in any::<bool>(),
    ) {
        let env = build_envelope(n_teachers, n_courses, subject_hours, double_periods);
        let class_slots: HashSet<(String, String)> = env
            .instance
            .week
            .days
            .iter()
            .flat_map(|d| {
                d.periods
                    .iter()
                    .filter(|p| p.kind == PeriodKind::Class)
                    .map(|p| (d.day.clone(), p.name.clone()))
            })
            .collect();
        let result = run(env);
        for schedule in &result.schedules {
            for (day, cells) in &schedule.grid {
                for (period, cell) in cells {
                    if matches!(cell, Cell::Lesson { .. }) {
                        prop_assert!(
                            class_slots.contains(&(day.clone(), period.clone())),
                            "lesson outside class slot at {}/{} in {}",
                            day, period, schedule.id
                        );
                    }
                }
            }
        }
    }
}
