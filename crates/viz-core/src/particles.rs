//! CPU side of the particle pass: per-particle vertices, the random-seed
//! texture and the uniforms the shader reads alongside the packed texture.

use crate::config::VizConfig;
use crate::state::State;
use rand::prelude::*;

/// One particle as uploaded to the vertex stream.
///
/// `strength` is the connection from `from` to `to` this frame. The shader
/// uses `index` to look up the particle's random seeds.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleVertex {
    pub from: f32,
    pub to: f32,
    pub index: f32,
    pub strength: f32,
}

/// Build the vertex list for `num_particles` slots.
///
/// Slot `n` belongs to pair `(n % N, (n / N) % N)`; self-pairs are skipped, so
/// the result is shorter than `num_particles` and indices stay dense.
pub fn particle_vertices(state: &State, num_particles: usize) -> Vec<ParticleVertex> {
    let n = state.len();
    if n == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(num_particles);
    for slot in 0..num_particles {
        let from = slot % n;
        let to = (slot / n) % n;
        if from == to {
            continue;
        }
        out.push(ParticleVertex {
            from: from as f32,
            to: to as f32,
            index: out.len() as f32,
            strength: state.connection(from, to),
        });
    }
    out
}

/// Uniform block for `shaders/particles.wgsl`. Field order matches the WGSL
/// struct; keep both in step.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleUniforms {
    pub control_points_size: [f32; 2],
    pub rand_size: [f32; 2],
    pub randoms_per_particle: u32,
    pub texture_row_size: u32,
    pub time: f32,
    pub rotation: f32,
    pub aspect: f32,
    pub num_instruments: u32,
    pub _pad: [f32; 2],
}

/// Random seeds for every particle, `R` floats each.
///
/// Rows are capped at `texture_row_size`; particle `n` lives in row
/// `n % rows` and columns `(n / rows) * R .. (n / rows + 1) * R`.
#[derive(Clone, Debug)]
pub struct RandomTexture {
    width: usize,
    height: usize,
    per_particle: usize,
    row_size: usize,
    data: Vec<f32>,
}

impl RandomTexture {
    pub fn new(config: &VizConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.random_seed);
        Self::with_rng(
            config.num_particles,
            config.randoms_per_particle,
            config.texture_row_size,
            &mut rng,
        )
    }

    pub fn with_rng<R: Rng>(
        num_particles: usize,
        per_particle: usize,
        row_size: usize,
        rng: &mut R,
    ) -> Self {
        let row_size = row_size.max(1);
        let column_sets = num_particles.saturating_sub(1) / row_size + 1;
        let width = per_particle * column_sets;
        let height = num_particles.min(row_size);
        let mut data = vec![0.0; width * height];
        for particle in 0..num_particles {
            let col_set = particle / row_size;
            let row = particle % row_size;
            for k in 0..per_particle {
                let col = col_set * per_particle + k;
                data[row * width + col] = rng.gen::<f32>();
            }
        }
        Self {
            width,
            height,
            per_particle,
            row_size,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// The `k`th random of `particle`, as the shader reads it.
    pub fn get(&self, particle: usize, k: usize) -> Option<f32> {
        if k >= self.per_particle {
            return None;
        }
        let col = (particle / self.row_size) * self.per_particle + k;
        let row = particle % self.row_size;
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// All randoms of `particle`.
    pub fn particle(&self, particle: usize) -> Vec<f32> {
        (0..self.per_particle)
            .filter_map(|k| self.get(particle, k))
            .collect()
    }
}
