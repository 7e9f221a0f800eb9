use crate::constants::{
    DEFAULT_RANDOM_SEED, MAX_CONTROL_POINTS, NUM_INSTRUMENTS, NUM_PARTICLES, RANDOMS_PER_PARTICLE,
    TEXTURE_ROW_SIZE,
};

/// Sizes fixed for the lifetime of a renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VizConfig {
    pub num_instruments: usize,
    /// Authored points per pair are kept strictly below this.
    pub max_control_points: usize,
    pub num_particles: usize,
    pub randoms_per_particle: usize,
    pub texture_row_size: usize,
    pub random_seed: u64,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            num_instruments: NUM_INSTRUMENTS,
            max_control_points: MAX_CONTROL_POINTS,
            num_particles: NUM_PARTICLES,
            randoms_per_particle: RANDOMS_PER_PARTICLE,
            texture_row_size: TEXTURE_ROW_SIZE,
            random_seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl VizConfig {
    pub fn with_instruments(num_instruments: usize) -> Self {
        Self {
            num_instruments,
            ..Self::default()
        }
    }

    /// One texture column per ordered pair.
    pub fn texture_width(&self) -> usize {
        self.num_instruments * self.num_instruments
    }

    /// Count header, then at most `max_control_points - 1` authored points
    /// and the two endpoints.
    pub fn texture_height(&self) -> usize {
        2 + self.max_control_points
    }
}
