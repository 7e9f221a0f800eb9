//! Fixed-layout control-point texture shared with the particle shader.
//!
//! Column `from * N + to` holds one pair's calculated point sequence:
//!
//! - row 0, channel 0: number of points in the column
//! - rows `1..=count`: point x, point y, tangent x, tangent y
//!
//! The tangent is the forward difference to the next point and is zero on the
//! last point. The shader trusts the row-0 count and never reads past it.

use crate::spline;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// One RGBA32F cell.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Texel(pub [f32; 4]);

impl Texel {
    pub const ZERO: Self = Self([0.0; 4]);

    pub fn point(&self) -> Vec2 {
        Vec2::new(self.0[0], self.0[1])
    }

    pub fn tangent(&self) -> Vec2 {
        Vec2::new(self.0[2], self.0[3])
    }

    fn from_point_tangent(point: Vec2, tangent: Vec2) -> Self {
        Self([point.x, point.y, tangent.x, tangent.y])
    }
}

#[derive(Clone, Debug)]
pub struct PackedTexture {
    width: usize,
    height: usize,
    texels: Vec<Texel>,
}

impl PackedTexture {
    /// Zeroed texture of `width` columns by `height` rows, stored row-major.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            texels: vec![Texel::ZERO; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `[width, height]` as handed to the shader's `ControlPointsSize`.
    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }

    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    /// Raw row-major RGBA32F bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    pub fn bytes_per_row(&self) -> usize {
        self.width * std::mem::size_of::<Texel>()
    }

    pub fn texel(&self, column: usize, row: usize) -> Option<&Texel> {
        if column >= self.width || row >= self.height {
            return None;
        }
        self.texels.get(row * self.width + column)
    }

    pub(crate) fn clear(&mut self) {
        self.texels.fill(Texel::ZERO);
    }

    /// Number of points stored in `column`, read back from the header row.
    pub fn count(&self, column: usize) -> usize {
        self.texel(column, 0).map_or(0, |t| t.0[0] as usize)
    }

    /// Write `points` into `column`: header count then point and tangent rows.
    ///
    /// Panics if the column is out of range or the sequence does not fit; the
    /// caller sizes sequences against the texture height first.
    pub(crate) fn write_column(&mut self, column: usize, points: &[Vec2]) {
        assert!(column < self.width, "column {column} outside texture width {}", self.width);
        assert!(
            points.len() < self.height,
            "{} points do not fit {} rows",
            points.len(),
            self.height
        );
        let w = self.width;
        self.texels[column] = Texel([points.len() as f32, 0.0, 0.0, 0.0]);
        for (k, &p) in points.iter().enumerate() {
            let tangent = spline::forward_tangent(points, k);
            self.texels[(k + 1) * w + column] = Texel::from_point_tangent(p, tangent);
        }
    }

    /// Evaluate the curve stored in `column` from its packed rows only.
    ///
    /// This is the shader's view of the data: the start tangent is the baked
    /// forward difference and the end tangent `P[s+2] - P[s]` is rebuilt as
    /// the sum of two baked tangents. That sum can differ from the direct
    /// difference by float rounding, so results match
    /// [`crate::CurveField::interpolate`] to within a few ULPs, not bit for bit.
    pub fn sample(&self, column: usize, t: f32) -> crate::Result<Vec2> {
        let count = self.count(column);
        let (segment, s) = spline::locate_segment(count, t)?;
        let row = |k: usize| self.texels[(k + 1) * self.width + column];
        let start = row(segment);
        let end = row(segment + 1);
        let tangent1 = if segment + 2 < count {
            start.tangent() + end.tangent()
        } else {
            Vec2::ZERO
        };
        Ok(spline::hermite(
            start.point(),
            start.tangent(),
            end.point(),
            tangent1,
            s,
        ))
    }

    /// Rebuild a column's point sequence from its rows.
    pub fn column_points(&self, column: usize) -> Vec<Vec2> {
        (0..self.count(column))
            .filter_map(|k| self.texel(column, k + 1).map(Texel::point))
            .collect()
    }
}
