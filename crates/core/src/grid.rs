use std::collections::{BTreeMap, HashMap};
use tracing::warn;
use types::{
    Cell, CourseId, DayCells, PeriodKind, Restriction, SubjectId, TeacherId, WeekConfig,
};

/// Precomputed scan order for one day: the full ordered period list, the
/// assignable class-kind subset, and the maximal runs of class periods not
/// interrupted by a break or lunch. Consecutive-run placement is only legal
/// inside one segment.
#[derive(Clone, Debug)]
pub struct DayShape {
    pub day: String,
    pub class_periods: Vec<String>,
    pub segments: Vec<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct WeekShape {
    pub days: Vec<DayShape>,
}

impl WeekShape {
    pub fn new(week: &WeekConfig) -> Self {
        let days = week
            .days
            .iter()
            .map(|d| {
                let mut segments: Vec<Vec<String>> = Vec::new();
                let mut current: Vec<String> = Vec::new();
                for p in &d.periods {
                    if p.kind == PeriodKind::Class {
                        current.push(p.name.clone());
                    } else if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                if !current.is_empty() {
                    segments.push(current);
                }
                DayShape {
                    day: d.day.clone(),
                    class_periods: d
                        .periods
                        .iter()
                        .filter(|p| p.kind == PeriodKind::Class)
                        .map(|p| p.name.clone())
                        .collect(),
                    segments,
                }
            })
            .collect();
        Self { days }
    }

    pub fn class_slot_count(&self) -> usize {
        self.days.iter().map(|d| d.class_periods.len()).sum()
    }
}

/// One owner's week of cells. Class periods start at the [`Cell::Free`]
/// sentinel; break and lunch rows are present but never assignable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScheduleGrid {
    cells: BTreeMap<String, DayCells>,
}

impl ScheduleGrid {
    pub fn initialize(week: &WeekConfig) -> Self {
        let mut cells: BTreeMap<String, DayCells> = BTreeMap::new();
        for d in &week.days {
            let day = cells.entry(d.day.clone()).or_default();
            for p in &d.periods {
                let cell = match p.kind {
                    PeriodKind::Class => Cell::Free,
                    kind => Cell::Off { kind },
                };
                day.insert(p.name.clone(), cell);
            }
        }
        Self { cells }
    }

    pub fn get(&self, day: &str, period: &str) -> Option<&Cell> {
        self.cells.get(day).and_then(|d| d.get(period))
    }

    fn get_mut(&mut self, day: &str, period: &str) -> Option<&mut Cell> {
        self.cells.get_mut(day).and_then(|d| d.get_mut(period))
    }

    pub fn is_free(&self, day: &str, period: &str) -> bool {
        matches!(self.get(day, period), Some(Cell::Free))
    }

    /// Overwrites the free-period sentinel with the restriction's activity.
    /// Restrictions naming a slot that does not exist, or that is not
    /// currently free, are skipped: stored restrictions routinely drift out
    /// of sync with a reconfigured period grid and must not abort a run.
    pub fn apply_restrictions(&mut self, restrictions: &[Restriction]) {
        for r in restrictions {
            match self.get_mut(&r.day, &r.period) {
                Some(cell) if cell.is_free() => {
                    *cell = Cell::Blocked {
                        activity: r.activity.clone(),
                    };
                }
                Some(_) => {
                    warn!(day = %r.day, period = %r.period, "restriction targets an occupied or non-class slot, skipped");
                }
                None => {
                    warn!(day = %r.day, period = %r.period, "restriction targets an unknown slot, skipped");
                }
            }
        }
    }

    pub fn into_cells(self) -> BTreeMap<String, DayCells> {
        self.cells
    }
}

/// Identity of one placement: which teacher teaches which subject to which
/// course. The allocator builds one per demand item and reuses it per slot.
#[derive(Clone, Debug)]
pub struct Placement {
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub course_id: CourseId,
    pub course_label: String,
    pub subject_id: SubjectId,
    pub subject_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaceOutcome {
    Committed,
    TeacherBusy,
    CourseBusy,
    UnknownSlot,
}

/// Indexed store of every teacher-owned and course-owned grid in a run.
/// Placements go through [`GridStore::try_place`], which checks both sides
/// and commits both cells or neither; nothing else writes lesson cells, so
/// the lockstep invariant between the two views holds by construction.
#[derive(Clone, Debug, Default)]
pub struct GridStore {
    teachers: HashMap<String, ScheduleGrid>,
    courses: HashMap<String, ScheduleGrid>,
}

impl GridStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_teacher(&mut self, id: &TeacherId, grid: ScheduleGrid) {
        self.teachers.insert(id.0.clone(), grid);
    }

    pub fn ensure_course(&mut self, id: &CourseId, week: &WeekConfig) {
        self.courses
            .entry(id.0.clone())
            .or_insert_with(|| ScheduleGrid::initialize(week));
    }

    pub fn teacher(&self, id: &TeacherId) -> Option<&ScheduleGrid> {
        self.teachers.get(id.0.as_str())
    }

    pub fn course(&self, id: &CourseId) -> Option<&ScheduleGrid> {
        self.courses.get(id.0.as_str())
    }

    pub fn teacher_is_free(&self, id: &TeacherId, day: &str, period: &str) -> bool {
        self.teachers
            .get(id.0.as_str())
            .is_some_and(|g| g.is_free(day, period))
    }

    pub fn course_is_free(&self, id: &CourseId, day: &str, period: &str) -> bool {
        self.courses
            .get(id.0.as_str())
            .is_some_and(|g| g.is_free(day, period))
    }

    pub fn try_place(&mut self, p: &Placement, day: &str, period: &str) -> PlaceOutcome {
        match self
            .teachers
            .get(p.teacher_id.0.as_str())
            .and_then(|g| g.get(day, period))
        {
            Some(Cell::Free) => {}
            Some(_) => return PlaceOutcome::TeacherBusy,
            None => return PlaceOutcome::UnknownSlot,
        }
        match self
            .courses
            .get(p.course_id.0.as_str())
            .and_then(|g| g.get(day, period))
        {
            Some(Cell::Free) => {}
            Some(_) => return PlaceOutcome::CourseBusy,
            None => return PlaceOutcome::UnknownSlot,
        }

        // Both sides verified free; commit both cells.
        let teacher_cell = self
            .teachers
            .get_mut(p.teacher_id.0.as_str())
            .and_then(|g| g.get_mut(day, period))
            .expect("checked above");
        *teacher_cell = Cell::Lesson {
            subject_id: p.subject_id.clone(),
            subject: p.subject_name.clone(),
            teacher_id: None,
            teacher: None,
            course_id: Some(p.course_id.clone()),
            course: Some(p.course_label.clone()),
        };
        let course_cell = self
            .courses
            .get_mut(p.course_id.0.as_str())
            .and_then(|g| g.get_mut(day, period))
            .expect("checked above");
        *course_cell = Cell::Lesson {
            subject_id: p.subject_id.clone(),
            subject: p.subject_name.clone(),
            teacher_id: Some(p.teacher_id.clone()),
            teacher: Some(p.teacher_name.clone()),
            course_id: None,
            course: None,
        };
        PlaceOutcome::Committed
    }

    pub fn take_teacher(&mut self, id: &TeacherId) -> Option<ScheduleGrid> {
        self.teachers.remove(id.0.as_str())
    }

    pub fn take_course(&mut self, id: &CourseId) -> Option<ScheduleGrid> {
        self.courses.remove(id.0.as_str())
    }
}
