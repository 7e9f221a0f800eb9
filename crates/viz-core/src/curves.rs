//! Per-pair curves derived from instrument positions and authored control
//! points, kept in sync with the packed texture.

use crate::config::VizConfig;
use crate::constants::{SCATTER_POINTS_PER_PAIR, SCATTER_SPREAD};
use crate::control_points::ControlPointMap;
use crate::error::{Result, VizError};
use crate::spline;
use crate::state::State;
use crate::texture::PackedTexture;
use glam::Vec2;
use rand::Rng;

/// Owns the control points, the calculated sequences and the packed texture.
///
/// Every mutation goes through `&mut self` and finishes with a full rebuild,
/// so [`CurveField::texture`] always returns a complete snapshot.
pub struct CurveField {
    config: VizConfig,
    positions: Vec<Vec2>,
    control_points: ControlPointMap,
    calculated: Vec<Vec<Vec2>>,
    texture: PackedTexture,
}

impl CurveField {
    /// Field for `config`, with instruments laid out on the unit ring and no
    /// control points.
    pub fn new(mut config: VizConfig) -> Self {
        // at least the two endpoints must fit
        config.max_control_points = config.max_control_points.max(1);
        let n = config.num_instruments;
        let mut field = Self {
            positions: State::ring(n).positions().collect(),
            control_points: ControlPointMap::new(n),
            calculated: vec![Vec::new(); n * n],
            texture: PackedTexture::new(config.texture_width(), config.texture_height()),
            config,
        };
        field.update();
        field
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn num_instruments(&self) -> usize {
        self.config.num_instruments
    }

    /// Replace every pair's control points and rebuild.
    pub fn set_control_points(&mut self, points: ControlPointMap) {
        self.control_points = if points.num_instruments() == self.num_instruments() {
            points
        } else {
            log::warn!(
                "control points for {} instruments resized to {}",
                points.num_instruments(),
                self.num_instruments()
            );
            points.resized(self.num_instruments())
        };
        self.update();
    }

    /// Replace the control points with up to `SCATTER_POINTS_PER_PAIR` points
    /// per distinct pair, jittered sideways off the straight path.
    ///
    /// The count per pair stays below the configured cap so nothing is
    /// truncated on rebuild.
    pub fn scatter_control_points<R: Rng>(&mut self, rng: &mut R) {
        let n = self.num_instruments();
        let per_pair = SCATTER_POINTS_PER_PAIR.min(self.config.max_control_points - 1);
        let mut map = ControlPointMap::new(n);
        for (idx, pts) in map.pairs_mut().iter_mut().enumerate() {
            let (from, to) = (idx / n, idx % n);
            if from == to {
                continue;
            }
            let (a, b) = (self.positions[from], self.positions[to]);
            let normal = (b - a).perp().normalize_or_zero();
            for k in 1..=per_pair {
                let along = k as f32 / (per_pair + 1) as f32;
                let offset = rng.gen_range(-SCATTER_SPREAD..SCATTER_SPREAD);
                pts.push(a.lerp(b, along) + normal * offset);
            }
        }
        self.control_points = map;
        self.update();
    }

    pub fn control_points(&self) -> &ControlPointMap {
        &self.control_points
    }

    /// Take the instrument positions from `state` and rebuild.
    pub fn set_state(&mut self, state: &State) -> Result<()> {
        if state.len() != self.num_instruments() {
            return Err(VizError::InstrumentCountMismatch {
                expected: self.num_instruments(),
                actual: state.len(),
            });
        }
        self.positions.clear();
        self.positions.extend(state.positions());
        self.update();
        Ok(())
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    /// `[pos(from)] ++ control points ++ [pos(to)]` as of the last rebuild.
    pub fn calculated(&self, from: usize, to: usize) -> Result<&[Vec2]> {
        let idx = self.control_points.pair_index(from, to)?;
        Ok(&self.calculated[idx])
    }

    pub fn texture(&self) -> &PackedTexture {
        &self.texture
    }

    /// Point at `t` along the curve from `from` to `to`.
    pub fn interpolate(&self, from: usize, to: usize, t: f32) -> Result<Vec2> {
        spline::evaluate(self.calculated(from, to)?, t)
    }

    fn update(&mut self) {
        let n = self.num_instruments();
        let cap = self.config.max_control_points;
        self.texture.clear();
        for (idx, raw) in self.control_points.pairs_mut().iter_mut().enumerate() {
            let (from, to) = (idx / n, idx % n);
            if raw.len() >= cap {
                log::warn!(
                    "pair ({from}, {to}) has {} control points, truncating to {}",
                    raw.len(),
                    cap.saturating_sub(1)
                );
                raw.truncate(cap.saturating_sub(1));
            }

            let ps = &mut self.calculated[idx];
            ps.clear();
            ps.push(self.positions[from]);
            ps.extend_from_slice(raw);
            ps.push(self.positions[to]);

            self.texture.write_column(idx, ps);
        }
        log::trace!("rebuilt {} curves", n * n);
    }
}

impl Default for CurveField {
    fn default() -> Self {
        Self::new(VizConfig::default())
    }
}
