//! Ensemble snapshot supplied to the renderer once per frame.
//!
//! The curve engine only reads instrument positions; connection strengths and
//! notes are consumed by the particle driver and the debug overlay.

use crate::constants::{MAX_RANDOM_NOTES, RANDOM_NOTE_MAX_AGE_SEC};
use glam::Vec2;
use rand::prelude::*;
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Note {
    /// Elapsed time (seconds) at which the note started.
    pub time: f32,
    pub intensity: f32,
}

impl Note {
    pub fn new(time: f32, intensity: f32) -> Self {
        Self { time, intensity }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instrument {
    pub name: String,
    pub pos: Vec2,
    /// Strength towards every instrument, indexed by instrument id.
    pub connections: Vec<f32>,
    pub notes: Vec<Note>,
}

impl Instrument {
    pub fn new(name: impl Into<String>, pos: Vec2, num_instruments: usize) -> Self {
        Self {
            name: name.into(),
            pos,
            connections: vec![0.0; num_instruments],
            notes: Vec::new(),
        }
    }

    /// Strength towards `other`, zero when the vector is short.
    pub fn connection(&self, other: usize) -> f32 {
        self.connections.get(other).copied().unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub narrative: f32,
    pub instruments: Vec<Instrument>,
}

impl State {
    /// Instruments evenly spaced on the unit circle, unconnected.
    pub fn ring(num_instruments: usize) -> Self {
        let instruments = (0..num_instruments)
            .map(|i| {
                let theta = i as f32 / num_instruments as f32 * std::f32::consts::TAU;
                Instrument::new(
                    format!("inst{i}"),
                    Vec2::new(theta.cos(), theta.sin()),
                    num_instruments,
                )
            })
            .collect();
        Self {
            narrative: 0.0,
            instruments,
        }
    }

    /// Ring layout with symmetric random connections and a few recent notes.
    ///
    /// Strengths are squared uniform samples so most pairs stay faint; self
    /// connections are always 1.
    pub fn random<R: Rng>(num_instruments: usize, elapsed_sec: f32, rng: &mut R) -> Self {
        let mut state = Self::ring(num_instruments);
        for i in 0..num_instruments {
            for j in 0..=i {
                let r = if i == j { 1.0 } else { rng.gen::<f32>().powi(2) };
                state.instruments[i].connections[j] = r;
                state.instruments[j].connections[i] = r;
            }
            let r: f32 = rng.gen_range(0.0..0.9999);
            let note_count = (MAX_RANDOM_NOTES as f32 * r * r * r) as usize;
            for _ in 0..note_count {
                let age = rng.gen_range(0.0..RANDOM_NOTE_MAX_AGE_SEC) * rng.gen::<f32>();
                let note = Note::new(elapsed_sec - age, rng.gen());
                state.instruments[i].notes.push(note);
            }
        }
        log::debug!("created random state:\n{state}");
        state
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.instruments.iter().map(|inst| inst.pos)
    }

    /// Strength from `from` to `to`, zero for unknown instruments.
    pub fn connection(&self, from: usize, to: usize) -> f32 {
        self.instruments
            .get(from)
            .map_or(0.0, |inst| inst.connection(to))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Note(t:{:.2},i:{:.2})", self.time, self.intensity)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Instrument(pos:[{:.2},{:.2}], conn:",
            self.pos.x, self.pos.y
        )?;
        for (i, c) in self.connections.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{i}/{c:.2}")?;
        }
        f.write_str(" notes:")?;
        for (i, note) in self.notes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{note}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "State(narr:{:.2},instruments:", self.narrative)?;
        for inst in &self.instruments {
            writeln!(f, "{inst}")?;
        }
        f.write_str(")")
    }
}
