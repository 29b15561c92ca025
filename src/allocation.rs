use crate::data::{DEFAULT_SECTION, SectionAssignment, SubjectAllocation, Teacher, TeacherRow};
use std::collections::HashMap;

pub const DEFAULT_PERIODS_PER_WEEK: u32 = 1;
pub const DEFAULT_MAX_PERIODS: u32 = 25;

/// Subject name -> teacher names, in teacher row order.
pub type SubjectTeacherMap = HashMap<String, Vec<String>>;

/// Canonical collections derived from the subject and teacher rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    /// Subjects in allocation order, duplicates kept.
    pub subject_pool: Vec<String>,
    pub sections: Vec<SectionAssignment>,
    pub teachers: Vec<Teacher>,
    pub subject_teachers: SubjectTeacherMap,
}

pub fn normalize(allocations: &[SubjectAllocation], teacher_rows: &[TeacherRow]) -> Allocation {
    let mut subject_pool = Vec::new();
    let mut sections = Vec::new();

    for allocation in allocations {
        let subject = allocation.subject.trim();
        if subject.is_empty() {
            continue;
        }
        let periods_per_week = allocation
            .periods_per_week
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PERIODS_PER_WEEK);

        subject_pool.push(subject.to_string());

        let classes = allocation.classes.entries();
        if classes.is_empty() {
            sections.push(SectionAssignment {
                subject: subject.to_string(),
                section: DEFAULT_SECTION.to_string(),
                periods_per_week,
            });
        } else {
            sections.extend(classes.into_iter().map(|class| SectionAssignment {
                subject: subject.to_string(),
                section: class,
                periods_per_week,
            }));
        }
    }

    let teachers = normalize_teachers(teacher_rows);
    let subject_teachers = subject_teacher_map(&teachers);

    Allocation {
        subject_pool,
        sections,
        teachers,
        subject_teachers,
    }
}

/// Drops nameless rows and fills in the default weekly maximum.
pub fn normalize_teachers(rows: &[TeacherRow]) -> Vec<Teacher> {
    rows.iter()
        .filter(|row| !row.name.trim().is_empty())
        .map(|row| Teacher {
            name: row.name.trim().to_string(),
            subjects: row.subjects.entries(),
            max_periods_per_week: row
                .max_periods
                .filter(|p| *p > 0)
                .unwrap_or(DEFAULT_MAX_PERIODS),
            availability: row.availability.trim().to_string(),
        })
        .collect()
}

pub fn subject_teacher_map(teachers: &[Teacher]) -> SubjectTeacherMap {
    let mut map = SubjectTeacherMap::new();
    for teacher in teachers {
        for subject in &teacher.subjects {
            map.entry(subject.clone())
                .or_default()
                .push(teacher.name.clone());
        }
    }
    map
}
