use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}
id_newtype!(TeacherId);
id_newtype!(CourseId);
id_newtype!(SubjectId);

/// Human label for an unclaimed class period. Rendering only; the grid
/// itself carries [`Cell::Free`], never this string.
pub const FREE_LABEL: &str = "Hora Pedagógica";

pub const DEFAULT_WEEKLY_HOURS: u32 = 2;

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    #[default]
    Class,
    Break,
    Lunch,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Period {
    pub name: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub kind: PeriodKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct DaySchedule {
    pub day: String,
    #[serde(default)]
    pub periods: Vec<Period>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct WeekConfig {
    #[serde(default)]
    pub days: Vec<DaySchedule>,
}

impl WeekConfig {
    pub fn day_names(&self) -> Vec<&str> {
        self.days.iter().map(|d| d.day.as_str()).collect()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Primary,
    Secondary,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Primary => "primary".fmt(f),
            Level::Secondary => "secondary".fmt(f),
        }
    }
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LevelScope {
    Primary,
    Secondary,
    #[default]
    Both,
}

impl LevelScope {
    pub fn covers(&self, level: Level) -> bool {
        matches!(
            (self, level),
            (LevelScope::Both, _)
                | (LevelScope::Primary, Level::Primary)
                | (LevelScope::Secondary, Level::Secondary)
        )
    }
}

/// Composite `"<level>.<grade>"` key into a subject's weekly-hour table,
/// e.g. `"primary.3"`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash)]
#[serde(transparent)]
pub struct LevelGrade(pub String);

impl LevelGrade {
    pub fn new(level: Level, grade: u8) -> Self {
        Self(format!("{level}.{grade}"))
    }

    pub fn is_valid_format(&self) -> bool {
        let parts: Vec<_> = self.0.split('.').collect();
        if parts.len() != 2 {
            return false;
        }
        let grade_ok = parts[1].parse::<u8>().is_ok();
        matches!(parts[0], "primary" | "secondary") && grade_ok
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    #[default]
    Core,
    Area,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub kind: SubjectKind,
    /// Required weekly hours keyed by [`LevelGrade`] key. A missing entry
    /// does not mean "not taught"; consumers fall back to
    /// [`DEFAULT_WEEKLY_HOURS`].
    #[serde(default)]
    pub weekly_hours: HashMap<String, u32>,
}

impl Subject {
    pub fn hours_for(&self, level: Level, grade: u8) -> Option<u32> {
        self.weekly_hours
            .get(LevelGrade::new(level, grade).0.as_str())
            .copied()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub level: Level,
    pub grade: u8,
    pub section: String,
    #[serde(default)]
    pub students: u32,
}

impl Course {
    pub fn label(&self) -> String {
        format!("{} {}{}", self.name, self.grade, self.section)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Restriction {
    pub day: String,
    pub period: String,
    pub activity: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseAssignment {
    pub course_id: CourseId,
    #[serde(default)]
    pub subject_ids: Vec<SubjectId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub levels: LevelScope,
    pub weekly_hours: u32,
    #[serde(default)]
    pub assignments: Vec<CourseAssignment>,
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Cell {
    Free,
    Off {
        kind: PeriodKind,
    },
    Blocked {
        activity: String,
    },
    #[serde(rename_all = "camelCase")]
    Lesson {
        subject_id: SubjectId,
        subject: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        teacher_id: Option<TeacherId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        teacher: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        course_id: Option<CourseId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        course: Option<String>,
    },
}

impl Cell {
    pub fn is_free(&self) -> bool {
        matches!(self, Cell::Free)
    }

    pub fn display_label(&self) -> String {
        match self {
            Cell::Free => FREE_LABEL.to_string(),
            Cell::Off {
                kind: PeriodKind::Lunch,
            } => "Almuerzo".to_string(),
            Cell::Off { .. } => "Recreo".to_string(),
            Cell::Blocked { activity } => activity.clone(),
            Cell::Lesson { subject, .. } => subject.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Teacher,
    Course,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerKind::Teacher => "teacher".fmt(f),
            OwnerKind::Course => "course".fmt(f),
        }
    }
}

pub type DayCells = BTreeMap<String, Cell>;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSchedule {
    pub id: String,
    pub owner_kind: OwnerKind,
    pub owner_id: String,
    pub name: String,
    pub grid: BTreeMap<String, BTreeMap<String, Cell>>,
    pub generated_at: u64,
}

impl GeneratedSchedule {
    pub fn schedule_id(owner_kind: OwnerKind, owner_id: &str) -> String {
        format!("{owner_kind}-{owner_id}")
    }

    pub fn cell(&self, day: &str, period: &str) -> Option<&Cell> {
        self.grid.get(day).and_then(|d| d.get(period))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    #[serde(default = "default_max_run_len")]
    pub max_run_len: u32,
    #[serde(default = "default_double_periods")]
    pub double_periods: bool,
}

fn default_max_run_len() -> u32 {
    2
}

fn default_double_periods() -> bool {
    true
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            max_run_len: default_max_run_len(),
            double_periods: default_double_periods(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Instance {
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    pub week: WeekConfig,
}

impl Instance {
    pub fn courses_by_id(&self) -> HashMap<&str, &Course> {
        self.courses.iter().map(|c| (c.id.0.as_str(), c)).collect()
    }

    pub fn subjects_by_id(&self) -> HashMap<&str, &Subject> {
        self.subjects.iter().map(|s| (s.id.0.as_str(), s)).collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateEnvelope {
    pub instance: Instance,
    #[serde(default)]
    pub params: GenerateParams,
    /// Millisecond timestamp stamped onto every emitted schedule. Supplied
    /// by the caller so a run is a pure function of its envelope.
    #[serde(default)]
    pub generated_at: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSummary {
    pub teacher_schedules: u32,
    pub course_schedules: u32,
    pub conflicts: u64,
    pub elapsed_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct GenerateResult {
    pub status: String,
    pub schedules: Vec<GeneratedSchedule>,
    pub summary: GenerateSummary,
    pub stats: serde_json::Value,
}

impl GenerateResult {
    pub fn schedule(&self, owner_kind: OwnerKind, owner_id: &str) -> Option<&GeneratedSchedule> {
        let id = GeneratedSchedule::schedule_id(owner_kind, owner_id);
        self.schedules.iter().find(|s| s.id == id)
    }
}
