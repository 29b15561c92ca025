use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Section name used when an allocation lists no classes.
pub const DEFAULT_SECTION: &str = "Default";

/// Which days of the week the timetable covers. Unrecognized modes read
/// the custom day list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum DaySelection {
    #[default]
    #[serde(rename = "Mon-Fri")]
    MonFri,
    #[serde(rename = "Mon-Sat")]
    MonSat,
    #[serde(other)]
    Custom,
}

/// A comma-separated list, given either as one string or as an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommaList {
    Text(String),
    Items(Vec<String>),
}

impl Default for CommaList {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl CommaList {
    /// Trimmed, non-empty entries in input order.
    pub fn entries(&self) -> Vec<String> {
        match self {
            Self::Text(text) => split_list(text),
            Self::Items(items) => items.iter().flat_map(|item| split_list(item)).collect(),
        }
    }
}

pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses the leading decimal digits of a string, ignoring leading whitespace.
pub fn leading_int(text: &str) -> Option<u32> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

// form fields arrive as numbers, numeric strings, or garbage
fn form_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && *f <= f64::from(u32::MAX))
                    .map(|f| f.trunc() as u32)
            }),
        Value::String(s) => leading_int(s),
        _ => None,
    }
}

/// Deserializes a form number leniently; anything unparseable becomes `None`.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(form_number))
}

/// One subject row of the request form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectAllocation {
    pub subject: String,
    pub classes: CommaList,
    #[serde(alias = "periods", deserialize_with = "lenient_u32")]
    pub periods_per_week: Option<u32>,
    pub allow_double: bool,
}

/// One teacher row of the request form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeacherRow {
    pub name: String,
    pub subjects: CommaList,
    #[serde(alias = "maxPeriodsPerWeek", deserialize_with = "lenient_u32")]
    pub max_periods: Option<u32>,
    pub availability: String,
}

/// Scheduling rules collected from the form. None of them are enforced.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constraints {
    pub no_double_teacher: bool,
    pub avoid_back_to_back: bool,
    pub fixed_lunch: bool,
    pub balance_load: bool,
    pub notes: String,
}

impl Constraints {
    pub fn any_requested(&self) -> bool {
        self.no_double_teacher
            || self.avoid_back_to_back
            || self.fixed_lunch
            || self.balance_load
            || !self.notes.trim().is_empty()
    }
}

/// The complete input for a generation request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimetableRequest {
    pub school_name: String,
    pub term: String,
    pub working_days: DaySelection,
    pub custom_days: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub periods_per_day: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub period_duration: Option<u32>,
    pub subject_allocations: Vec<SubjectAllocation>,
    pub teachers: Vec<TeacherRow>,
    pub start_time: String,
    pub end_time: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub lunch_break_period: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub lunch_break_duration: Option<u32>,
    pub breaks: String,
    pub classroom_numbers: CommaList,
    #[serde(deserialize_with = "lenient_u32")]
    pub total_classrooms: Option<u32>,
    pub constraints: Constraints,
}

/// One (subject, section) pair derived from an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAssignment {
    pub subject: String,
    pub section: String,
    pub periods_per_week: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub name: String,
    pub subjects: Vec<String>,
    pub max_periods_per_week: u32,
    pub availability: String,
}

/// A single slot of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Cell {
    Break,
    Lunch,
    Class {
        subject: String,
        teacher: String,
        classroom: String,
    },
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Break => write!(f, "Break"),
            Self::Lunch => write!(f, "Lunch"),
            Self::Class {
                subject,
                teacher,
                classroom,
            } => write!(f, "{subject} ({teacher}, {classroom})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRow {
    pub day: String,
    pub cells: Vec<Cell>,
}

/// Days × periods, one row per day in the requested order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub rows: Vec<DayRow>,
}

impl Grid {
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).sum()
    }

    pub fn class_cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .filter(|cell| matches!(cell, Cell::Class { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionGrid {
    pub section: String,
    pub grid: Grid,
}

/// Either one grid for the whole school, or one per section in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", content = "grids", rename_all = "camelCase")]
pub enum GridResult {
    Flat(Grid),
    Sectioned(Vec<SectionGrid>),
}

/// The final output of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableOutput {
    pub school_name: String,
    pub term: String,
    pub days: Vec<String>,
    pub time_labels: Vec<String>,
    pub subject_pool: Vec<String>,
    pub sections: Vec<SectionAssignment>,
    pub teachers: Vec<Teacher>,
    pub timetable: GridResult,
}
