use std::fmt::{Display, Formatter};

use typed_builder::TypedBuilder;

use crate::step::Step;

/// How an episode ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EpisodeOutcome {
    /// The vehicle reached the success segment after `steps` ticks.
    Arrived { steps: Step },
    /// The vehicle could no longer be tracked; nothing is recorded.
    Lost { steps: Step, reason: String },
}

impl EpisodeOutcome {
    pub fn steps(&self) -> Step {
        match self {
            EpisodeOutcome::Arrived { steps } => *steps,
            EpisodeOutcome::Lost { steps, .. } => *steps,
        }
    }

    pub fn is_arrived(&self) -> bool {
        matches!(self, EpisodeOutcome::Arrived { .. })
    }
}

impl Display for EpisodeOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EpisodeOutcome::Arrived { steps } => write!(f, "arrived after {} steps", steps),
            EpisodeOutcome::Lost { steps, reason } => {
                write!(f, "lost after {} steps ({})", steps, reason)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, TypedBuilder)]
pub struct EpisodeRecord {
    pub seed: u64,
    pub episode: u32,
    pub steps: Step,
}

/// Travel times of the arrived episodes of one pass, in episode order.
#[derive(Clone, Debug, Default)]
pub struct TravelTimes {
    records: Vec<EpisodeRecord>,
}

impl TravelTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EpisodeRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&EpisodeRecord> {
        self.records.last()
    }

    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    pub fn episodes(&self) -> Vec<u32> {
        self.records.iter().map(|record| record.episode).collect()
    }

    pub fn steps(&self) -> Vec<u64> {
        self.records.iter().map(|record| record.steps.as_u64()).collect()
    }

    pub fn mean_steps(&self) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let total: u64 = self.records.iter().map(|record| record.steps.as_u64()).sum();
        Some(total as f64 / self.records.len() as f64)
    }
}
