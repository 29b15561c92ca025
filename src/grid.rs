use crate::allocation::SubjectTeacherMap;
use crate::data::{Cell, DEFAULT_SECTION, DayRow, Grid, GridResult, SectionAssignment, SectionGrid};
use itertools::Itertools;
use log::trace;
use std::collections::BTreeSet;

/// Subjects used when the request names none.
pub const FALLBACK_SUBJECTS: [&str; 5] = ["Math", "Science", "English", "History", "Geography"];

/// Placeholder for a subject nobody teaches, or an empty classroom pool.
pub const UNASSIGNED: &str = "TBA";

/// Everything shared by every grid of one build pass.
#[derive(Debug, Clone, Copy)]
pub struct GridPlan<'a> {
    pub days: &'a [String],
    pub periods_per_day: u32,
    pub break_periods: &'a BTreeSet<u32>,
    pub lunch_period: Option<u32>,
    pub classrooms: &'a [String],
    pub subject_teachers: &'a SubjectTeacherMap,
}

/// Builds the timetable. A request without explicit classes produces one
/// flat grid that cycles through `subject_pool`; otherwise each section gets
/// its own grid cycling through its own subjects.
pub fn build(plan: &GridPlan, sections: &[SectionAssignment], subject_pool: &[String]) -> GridResult {
    let groups: Vec<&str> = sections
        .iter()
        .map(|s| s.section.as_str())
        .unique()
        .collect();

    if groups.is_empty() || groups == [DEFAULT_SECTION] {
        return GridResult::Flat(fill_grid(plan, subject_pool));
    }

    let grids = groups
        .into_iter()
        .map(|name| {
            let subjects: Vec<String> = sections
                .iter()
                .filter(|s| s.section == name)
                .map(|s| s.subject.clone())
                .collect();
            trace!("Building grid for section {name} with {} subjects", subjects.len());
            SectionGrid {
                section: name.to_string(),
                grid: fill_grid(plan, &subjects),
            }
        })
        .collect();
    GridResult::Sectioned(grids)
}

// subject and assignment counters start at zero for every grid
fn fill_grid(plan: &GridPlan, subjects: &[String]) -> Grid {
    let fallback: Vec<String>;
    let pool: &[String] = if subjects.is_empty() {
        fallback = FALLBACK_SUBJECTS.iter().map(|s| s.to_string()).collect();
        &fallback
    } else {
        subjects
    };

    let mut subject_index = 0usize;
    let mut assignment_index = 0usize;
    let mut rows = Vec::with_capacity(plan.days.len());

    for day in plan.days {
        let mut cells = Vec::with_capacity(plan.periods_per_day as usize);
        for period in 1..=plan.periods_per_day {
            if plan.lunch_period == Some(period) {
                cells.push(Cell::Lunch);
            } else if plan.break_periods.contains(&period) {
                cells.push(Cell::Break);
            } else {
                let subject = &pool[subject_index % pool.len()];
                let classroom = pick(plan.classrooms, assignment_index);
                let teacher = plan
                    .subject_teachers
                    .get(subject)
                    .map_or(UNASSIGNED, |names| pick(names, assignment_index));
                cells.push(Cell::Class {
                    subject: subject.clone(),
                    teacher: teacher.to_string(),
                    classroom: classroom.to_string(),
                });
                subject_index += 1;
                assignment_index += 1;
            }
        }
        rows.push(DayRow {
            day: day.clone(),
            cells,
        });
    }
    Grid { rows }
}

fn pick(items: &[String], index: usize) -> &str {
    if items.is_empty() {
        UNASSIGNED
    } else {
        &items[index % items.len()]
    }
}
