use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::proposal::{DerivedSchedule, IntermediateLeg, ScheduleProposal};
use tracing::debug;

/// Derives every timestamp of a proposal that already passed validation.
///
/// Regulation bounds are not re-checked. A stopover without arrival time or
/// ground duration, or a schedule that does not end after it starts, is an
/// invariant violation.
pub fn build(proposal: &ScheduleProposal) -> ScheduleResult<DerivedSchedule> {
    let mut arrive_time = proposal.depart_time + proposal.flight_minutes;
    let mut legs = Vec::with_capacity(proposal.stopovers.len());

    for (i, stopover) in proposal.stopovers.iter().enumerate() {
        let (arrival_time, ground_minutes) = match (stopover.arrival_time, stopover.ground_minutes)
        {
            (Some(arrival), Some(ground)) => (arrival, ground),
            _ => {
                return Err(ScheduleError::InvariantViolation(format!(
                    "stopover {} at {} is missing its arrival time or ground duration",
                    i + 1,
                    stopover.airport_id
                )));
            }
        };

        // ground time extends the whole trip, independent of the stop's own window
        arrive_time += ground_minutes;
        legs.push(IntermediateLeg {
            airport_id: stopover.airport_id.clone(),
            arrival_time,
            departure_time: arrival_time + ground_minutes,
            order: (i + 1) as u32,
        });
    }

    if arrive_time <= proposal.depart_time {
        return Err(ScheduleError::InvariantViolation(format!(
            "flight departing {} must arrive after it departs",
            proposal.depart_time
        )));
    }

    debug!(
        depart = %proposal.depart_time,
        arrive = %arrive_time,
        legs = legs.len(),
        "derived schedule"
    );

    Ok(DerivedSchedule {
        depart_time: proposal.depart_time,
        arrive_time,
        legs,
    })
}
