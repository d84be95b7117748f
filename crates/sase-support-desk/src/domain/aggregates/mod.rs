//! Aggregates
pub mod fields;
pub mod case;
pub mod agent;
pub mod thread;

pub use fields::Record;
pub use case::{Case, CaseDecodeError};
pub use agent::{Agent, DEFAULT_MAX_CONCURRENT_CASES};
pub use thread::{Direction, EmailThread};

/// Decode a batch of case records, skipping the ones that cannot be read.
/// Returns the decoded cases and the number of skipped records.
pub fn decode_cases(records: &[Record]) -> (Vec<Case>, usize) {
    let mut skipped = 0;
    let cases = records
        .iter()
        .filter_map(|r| match Case::from_record(r) {
            Ok(case) => Some(case),
            Err(e) => {
                tracing::warn!("Skipping case record: {}", e);
                skipped += 1;
                None
            }
        })
        .collect();
    (cases, skipped)
}

pub fn decode_agents(records: &[Record]) -> (Vec<Agent>, usize) {
    let agents: Vec<Agent> = records.iter().filter_map(Agent::from_record).collect();
    let skipped = records.len() - agents.len();
    if skipped > 0 {
        tracing::warn!("Skipping {} agent records without id", skipped);
    }
    (agents, skipped)
}
