pub mod builder;
pub mod form;
pub mod proposal;
pub mod validator;


use crate::error::ScheduleResult;
use crate::flight::Flight;
use crate::regulation::RegulationStore;
use crate::repository::ScheduleRepository;
use crate::schedule::proposal::ScheduleProposal;
use crate::schedule::validator::ValidationResult;
use crate::time::Timestamp;
use tracing::{debug, warn};

/// Outcome of a schedule submission that did not hit a hard failure.
#[derive(Debug, PartialEq)]
pub enum Submission {
    Scheduled(Flight),
    Rejected(ValidationResult),
}

/// Validation and scheduling over a repository that also stores regulations.
pub struct Scheduler<R> {
    repository: R,
}

impl<R> Scheduler<R>
where
    R: ScheduleRepository + RegulationStore,
{
    pub fn new(repository: R) -> Scheduler<R> {
        Scheduler { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// `schedule/validate`: reads the bounds once and checks the proposal
    /// against them. Persists nothing.
    pub fn validate(
        &self,
        proposal: &ScheduleProposal,
        now: Timestamp,
    ) -> ScheduleResult<ValidationResult> {
        let bounds = self.repository.bounds()?;
        debug!(?bounds, "regulation bounds loaded");
        Ok(validator::validate(proposal, &bounds, now))
    }

    /// `schedule`: resolves the referenced entities, validates, derives the
    /// timestamps and hands them to the repository.
    pub fn submit(&self, proposal: &ScheduleProposal, now: Timestamp) -> ScheduleResult<Submission> {
        self.repository.route(proposal.route_id)?;
        self.repository.aircraft(&proposal.aircraft_id)?;
        for stopover in &proposal.stopovers {
            self.repository.airport(&stopover.airport_id)?;
        }

        let result = self.validate(proposal, now)?;
        if !result.valid {
            warn!(
                route = proposal.route_id,
                aircraft = %proposal.aircraft_id,
                problems = result.messages().len(),
                "proposal rejected"
            );
            return Ok(Submission::Rejected(result));
        }

        let schedule = builder::build(proposal)?;
        let flight = self
            .repository
            .save(&schedule, proposal.route_id, &proposal.aircraft_id)?;
        Ok(Submission::Scheduled(flight))
    }
}
