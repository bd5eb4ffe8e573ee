use rand::SeedableRng;
use rand_pcg::Pcg64;

use veer_core::edge::{EdgeId, NextEdges};

/// Decides where a vehicle goes next once it enters `current`.
pub trait RoutePolicy {
    fn next_edge<'a>(&mut self, current: &EdgeId, options: &'a NextEdges) -> Option<&'a EdgeId>;
}

/// Memoryless baseline: a uniform choice among the reachable edges.
pub struct RandomPolicy {
    rng: Pcg64,
}

impl RandomPolicy {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl RoutePolicy for RandomPolicy {
    fn next_edge<'a>(&mut self, _current: &EdgeId, options: &'a NextEdges) -> Option<&'a EdgeId> {
        options.choose(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_choices() {
        let options: NextEdges = ["E1", "E2", "E3"].into_iter().map(EdgeId::from).collect();
        let current = EdgeId::from("E0");
        let mut first = RandomPolicy::seeded(11);
        let mut second = RandomPolicy::seeded(11);
        for _ in 0..20 {
            assert_eq!(
                first.next_edge(&current, &options),
                second.next_edge(&current, &options)
            );
        }
    }

    #[test]
    fn no_choice_without_options() {
        let mut policy = RandomPolicy::seeded(1);
        assert!(policy
            .next_edge(&EdgeId::from("E9"), &NextEdges::new())
            .is_none());
    }
}
