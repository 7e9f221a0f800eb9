use crate::constants::{CONNECTION_ALPHA_SCALE, CONNECTION_WIDTH_SCALE};
use crate::state::State;
use glam::Vec2;

/// A debug line between two instruments, weighted by connection strength.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionLine {
    pub from: Vec2,
    pub to: Vec2,
    pub width: f32,
    pub alpha: f32,
}

/// One line per ordered pair, self-pairs included (they have zero length).
pub fn connection_lines(state: &State) -> Vec<ConnectionLine> {
    let mut lines = Vec::with_capacity(state.len() * state.len());
    for inst in &state.instruments {
        for (i, other) in state.instruments.iter().enumerate() {
            let width = CONNECTION_WIDTH_SCALE * inst.connection(i);
            lines.push(ConnectionLine {
                from: inst.pos,
                to: other.pos,
                width,
                alpha: width.min(1.0) * CONNECTION_ALPHA_SCALE,
            });
        }
    }
    lines
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub pos: [f32; 2],
    pub alpha: f32,
    pub _pad: f32,
}

/// Line-list vertices for `lines`, skipping invisible ones.
pub fn line_vertices(lines: &[ConnectionLine]) -> Vec<LineVertex> {
    lines
        .iter()
        .filter(|l| l.alpha > 0.0)
        .flat_map(|l| {
            [l.from, l.to].map(|p| LineVertex {
                pos: p.to_array(),
                alpha: l.alpha,
                _pad: 0.0,
            })
        })
        .collect()
}
