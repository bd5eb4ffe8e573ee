use std::fmt::Display;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::Deserialize;

/// Number of simulation ticks. One tick is one `simulationStep` of the simulator.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Step(pub u64);

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Step {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let steps = s.parse::<u64>()?;
        Ok(Self(steps))
    }
}

impl From<u64> for Step {
    fn from(f: u64) -> Self {
        Self(f)
    }
}

impl From<u32> for Step {
    fn from(f: u32) -> Self {
        Self(u64::from(f))
    }
}

impl Step {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    pub fn increment(&mut self) {
        self.0 += 1;
    }
}

impl Add for Step {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Step {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
