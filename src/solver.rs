use crate::allocation::normalize;
use crate::classrooms::{classroom_pool, parse_breaks};
use crate::data::{DaySelection, Grid, GridResult, TimetableOutput, TimetableRequest, split_list};
use crate::grid::{GridPlan, build};
use crate::timing::{generate_labels, parse_start_time};
use log::{debug, info, trace};
use std::time::Instant;

pub const DEFAULT_PERIODS_PER_DAY: u32 = 7;
pub const DEFAULT_PERIOD_MINUTES: u32 = 45;
pub const DEFAULT_LUNCH_MINUTES: u32 = 45;
pub const DEFAULT_TOTAL_CLASSROOMS: u32 = 20;

/// Periods and lunch fit inside one day of the wrapping clock.
pub const MINUTES_PER_DAY: u32 = 24 * 60;
/// Largest room count that is synthesized; larger totals are malformed.
pub const MAX_TOTAL_CLASSROOMS: u32 = 1000;

const WEEKDAYS: [&str; 6] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Expands the day selection. An empty custom list falls back to Mon-Fri.
pub fn resolve_days(selection: DaySelection, custom: &str) -> Vec<String> {
    let weekdays = |n: usize| -> Vec<String> { WEEKDAYS[..n].iter().map(|d| d.to_string()).collect() };
    match selection {
        DaySelection::MonFri => weekdays(5),
        DaySelection::MonSat => weekdays(6),
        DaySelection::Custom => {
            let days = split_list(custom);
            if days.is_empty() { weekdays(5) } else { days }
        }
    }
}

/// Generates the timetable for a request. `subject_override`, when present
/// and non-empty, replaces the subject pool of a flat grid; sections,
/// teachers and classrooms are always derived from the request itself.
pub fn solve(input: &TimetableRequest, subject_override: Option<Vec<String>>) -> TimetableOutput {
    let start_time = Instant::now();

    let days = resolve_days(input.working_days, &input.custom_days);
    let period_minutes = bounded_or(input.period_duration, MINUTES_PER_DAY, DEFAULT_PERIOD_MINUTES);
    let periods_per_day = periods_in_day(input.periods_per_day, period_minutes);
    let lunch_period = input.lunch_break_period.filter(|p| *p > 0);
    let lunch_minutes = bounded_or(input.lunch_break_duration, MINUTES_PER_DAY, DEFAULT_LUNCH_MINUTES);
    let total_classrooms = bounded_or(
        input.total_classrooms,
        MAX_TOTAL_CLASSROOMS,
        DEFAULT_TOTAL_CLASSROOMS,
    );
    let break_periods = parse_breaks(&input.breaks);

    info!(
        "Building timetable with {} days, {} periods per day and {} subject rows...",
        days.len(),
        periods_per_day,
        input.subject_allocations.len()
    );
    if input.constraints.any_requested() {
        debug!("Scheduling rules {:?} are recorded but not enforced", input.constraints);
    }

    let allocation = normalize(&input.subject_allocations, &input.teachers);
    let classrooms = classroom_pool(
        &input.classroom_numbers.entries(),
        Some(total_classrooms),
        &allocation.subject_pool,
    );
    trace!("Classroom pool: {classrooms:?}");

    let time_labels = generate_labels(
        parse_start_time(&input.start_time),
        periods_per_day,
        period_minutes,
        lunch_period,
        lunch_minutes,
    );

    let subject_pool = match subject_override {
        Some(subjects) if !subjects.is_empty() => {
            info!("Using {} subjects supplied by the generation gateway", subjects.len());
            subjects
        }
        _ => allocation.subject_pool.clone(),
    };

    let plan = GridPlan {
        days: &days,
        periods_per_day,
        break_periods: &break_periods,
        lunch_period,
        classrooms: &classrooms,
        subject_teachers: &allocation.subject_teachers,
    };
    let timetable = build(&plan, &allocation.sections, &subject_pool);

    let grids: Vec<&Grid> = match &timetable {
        GridResult::Flat(grid) => vec![grid],
        GridResult::Sectioned(sections) => sections.iter().map(|s| &s.grid).collect(),
    };
    let cells: usize = grids.iter().map(|g| g.cell_count()).sum();
    let lessons: usize = grids.iter().map(|g| g.class_cells().count()).sum();
    info!(
        "Timetable with {} grid(s), {cells} cells and {lessons} lessons built in {:.2?}",
        grids.len(),
        start_time.elapsed()
    );

    TimetableOutput {
        school_name: input.school_name.trim().to_string(),
        term: input.term.trim().to_string(),
        days,
        time_labels,
        subject_pool,
        sections: allocation.sections,
        teachers: allocation.teachers,
        timetable,
    }
}

// zero and anything above `max` count as malformed
fn bounded_or(value: Option<u32>, max: u32, default: u32) -> u32 {
    value.filter(|v| (1..=max).contains(v)).unwrap_or(default)
}

/// Periods per day, capped by how many periods of `period_minutes` fit in a
/// day. Out-of-range requests fall back to the default, itself capped.
pub fn periods_in_day(requested: Option<u32>, period_minutes: u32) -> u32 {
    let max = (MINUTES_PER_DAY / period_minutes.max(1)).max(1);
    bounded_or(requested, max, DEFAULT_PERIODS_PER_DAY.min(max))
}
