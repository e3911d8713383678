//! Eligibility filter.
//!
//! One predicate decides whether a worker and a job should hear about each
//! other. It is used in both directions: a new job looks for interested
//! workers, a new worker looks for employers owning an interested job.
//! [`crate::store::PgStore`] evaluates the same predicate in SQL.

use crate::entities::{Employer, Job, Worker, ZoneSet};
use std::collections::HashSet;

/// True if the two zone sets share at least one zone.
pub fn zones_overlap(a: &ZoneSet, b: &ZoneSet) -> bool {
    a.overlaps(b)
}

/// True if the offered salary meets the asked minimum.
pub fn salary_acceptable(offered: i32, asked: i32) -> bool {
    offered >= asked
}

pub fn is_match(worker: &Worker, job: &Job) -> bool {
    worker.is_eligible()
        && job.is_eligible()
        && zones_overlap(&worker.zones, &job.zones)
        && salary_acceptable(job.min_salary, worker.min_salary)
        && worker.employment_type == job.employment_type
}

/// Workers interested in `job`, in input order, each at most once.
pub fn find_interested_workers<'a>(job: &Job, workers: &'a [Worker]) -> Vec<&'a Worker> {
    if !job.is_eligible() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    workers
        .iter()
        .filter(|worker| is_match(worker, job))
        .filter(|worker| seen.insert(worker.id))
        .collect()
}

/// Employers owning at least one job `worker` is interested in, in
/// employer order, each at most once.
pub fn find_interested_employers<'a>(
    worker: &Worker,
    jobs: &[Job],
    employers: &'a [Employer],
) -> Vec<&'a Employer> {
    if !worker.is_eligible() {
        return Vec::new();
    }
    let owners: HashSet<_> = jobs
        .iter()
        .filter(|job| is_match(worker, job))
        .map(|job| job.employer_id)
        .collect();
    let mut seen = HashSet::new();
    employers
        .iter()
        .filter(|employer| owners.contains(&employer.id))
        .filter(|employer| seen.insert(employer.id))
        .collect()
}
