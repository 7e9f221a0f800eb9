//! Authored control points for every ordered instrument pair.
//!
//! Pairs are stored flat at `from * N + to`, the same index the packed texture
//! uses for its columns. Self-pairs exist but are never drawn.
//!
//! Text format, one line per non-empty pair:
//!
//! ```text
//! # from to points...
//! 0 1 [0.5,0.5] [0.2,0.7]
//! ```

use crate::error::{Result, VizError};
use glam::Vec2;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub struct ControlPointMap {
    num_instruments: usize,
    pairs: Vec<Vec<Vec2>>,
}

impl ControlPointMap {
    /// Map with an empty sequence for each of the `n * n` pairs.
    pub fn new(num_instruments: usize) -> Self {
        Self {
            num_instruments,
            pairs: vec![Vec::new(); num_instruments * num_instruments],
        }
    }

    pub fn num_instruments(&self) -> usize {
        self.num_instruments
    }

    /// Flat index of `(from, to)`; also the packed texture column.
    #[inline]
    pub fn pair_index(&self, from: usize, to: usize) -> Result<usize> {
        if from >= self.num_instruments || to >= self.num_instruments {
            return Err(VizError::PairOutOfRange {
                from,
                to,
                count: self.num_instruments,
            });
        }
        Ok(from * self.num_instruments + to)
    }

    pub fn get(&self, from: usize, to: usize) -> Result<&[Vec2]> {
        let idx = self.pair_index(from, to)?;
        Ok(&self.pairs[idx])
    }

    pub fn get_mut(&mut self, from: usize, to: usize) -> Result<&mut Vec<Vec2>> {
        let idx = self.pair_index(from, to)?;
        Ok(&mut self.pairs[idx])
    }

    pub fn set(&mut self, from: usize, to: usize, points: Vec<Vec2>) -> Result<()> {
        *self.get_mut(from, to)? = points;
        Ok(())
    }

    pub fn push(&mut self, from: usize, to: usize, point: Vec2) -> Result<()> {
        self.get_mut(from, to)?.push(point);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.pairs.iter_mut().for_each(Vec::clear);
    }

    /// `(from, to, points)` for every pair in column order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &[Vec2])> + '_ {
        let n = self.num_instruments;
        self.pairs
            .iter()
            .enumerate()
            .map(move |(idx, pts)| (idx / n, idx % n, pts.as_slice()))
    }

    pub(crate) fn pairs_mut(&mut self) -> &mut [Vec<Vec2>] {
        &mut self.pairs
    }

    /// Rebuild for a different instrument count, keeping overlapping pairs.
    pub fn resized(&self, num_instruments: usize) -> Self {
        let mut out = Self::new(num_instruments);
        for (from, to, pts) in self.iter() {
            if let Ok(dst) = out.get_mut(from, to) {
                dst.extend_from_slice(pts);
            } else if !pts.is_empty() {
                log::warn!(
                    "dropping {} control points for pair ({from}, {to}): only {num_instruments} instruments",
                    pts.len()
                );
            }
        }
        out
    }
}

/// Parse a point written as `[x,y]`.
pub fn parse_point(text: &str) -> Option<Vec2> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    let (x, y) = inner.split_once(',')?;
    Some(Vec2::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
}

/// Split off the first whitespace-delimited field.
fn next_field(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    text.split_once(char::is_whitespace).unwrap_or((text, ""))
}

impl ControlPointMap {
    /// Parse the text format for an ensemble of `num_instruments`.
    pub fn parse(text: &str, num_instruments: usize) -> Result<Self> {
        let mut map = Self::new(num_instruments);
        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let parse_err = |reason: String| VizError::Parse {
                line: line_no + 1,
                reason,
            };
            let index = |what: &str, field: &str| -> Result<usize> {
                if field.is_empty() {
                    return Err(parse_err(format!("missing {what} instrument")));
                }
                field
                    .parse()
                    .map_err(|_| parse_err(format!("bad {what} instrument '{field}'")))
            };
            let (from_field, rest) = next_field(line);
            let (to_field, rest) = next_field(rest);
            let from = index("source", from_field)?;
            let to = index("target", to_field)?;
            // points may carry spaces inside their brackets
            let points = rest
                .split_inclusive(']')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(|f| parse_point(f).ok_or_else(|| parse_err(format!("bad point '{f}'"))))
                .collect::<Result<Vec<_>>>()?;
            let dst = map
                .get_mut(from, to)
                .map_err(|e| parse_err(e.to_string()))?;
            dst.extend(points);
        }
        Ok(map)
    }
}

impl FromStr for ControlPointMap {
    type Err = VizError;

    /// Parses with the default instrument count.
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, crate::constants::NUM_INSTRUMENTS)
    }
}

impl fmt::Display for ControlPointMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (from, to, pts) in self.iter().filter(|(_, _, pts)| !pts.is_empty()) {
            write!(f, "{from} {to}")?;
            for p in pts {
                write!(f, " [{},{}]", p.x, p.y)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
