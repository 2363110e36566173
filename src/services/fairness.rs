//! Default-employee selection for merged slots.
//!
//! Advisory only: the choice pre-selects an employee in the UI, and the
//! booking write path re-checks conflicts for whoever is finally chosen.

use rand::seq::SliceRandom;

use crate::models::EmployeeRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub employee: EmployeeRef,
    /// Appointments the employee already has on the requested date.
    pub appointments_today: usize,
}

pub trait AssignmentStrategy: Send + Sync {
    fn choose<'a>(&self, candidates: &'a [Candidate]) -> Option<&'a Candidate>;
}

/// Picks among the least-booked candidates, uniformly at random on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastBooked;

impl AssignmentStrategy for LeastBooked {
    fn choose<'a>(&self, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
        let min = candidates.iter().map(|c| c.appointments_today).min()?;
        let least_booked: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.appointments_today == min)
            .collect();
        least_booked.choose(&mut rand::thread_rng()).copied()
    }
}
