use std::path::PathBuf;

use anyhow::{bail, Result};
use log::debug;
use rand::Rng;

/// `<prefix><episodes>_<seed>.h5`, where a trained model for the same run would live.
pub fn model_path(model_prefix: &str, episodes: u32, seed: u64) -> PathBuf {
    PathBuf::from(format!("{}{}_{}.h5", model_prefix, episodes, seed))
}

/// Draws a seed in `0..limit` whose model file name is still free.
pub fn pick_seed<R: Rng + ?Sized>(
    rng: &mut R,
    model_prefix: &str,
    episodes: u32,
    limit: u64,
    attempts: u32,
) -> Result<u64> {
    for _ in 0..attempts.max(1) {
        let seed = rng.gen_range(0..limit.max(1));
        let model_file = model_path(model_prefix, episodes, seed);
        if !model_file.exists() {
            return Ok(seed);
        }
        debug!("{} exists, drawing another seed", model_file.display());
    }
    bail!(
        "no free seed below {} after {} attempts for prefix {}",
        limit,
        attempts,
        model_prefix
    )
}
