//! Randomness for stochastic dispatch outcomes.
//!
//! The engine never calls an ambient RNG. It depends on the [`UnitDraw`]
//! capability, which production code satisfies with the seeded [`SimRng`]
//! and tests satisfy with [`ScriptedDraw`] to force either branch.

use crate::fixed::{Fixed64, clamp_unit, f64_to_fixed64};

/// A source of uniform draws over `[0, 1)`.
pub trait UnitDraw {
    /// Draw the next value in `[0, 1)`.
    fn draw(&mut self) -> Fixed64;

    /// `true` with the given probability. Odds at or below zero, or at or
    /// above one, are decided without consuming a draw.
    fn chance(&mut self, probability: Fixed64) -> bool {
        if probability <= Fixed64::ZERO {
            return false;
        }
        if probability >= Fixed64::ONE {
            return true;
        }
        self.draw() < probability
    }
}

impl<D: UnitDraw + ?Sized> UnitDraw for &mut D {
    fn draw(&mut self) -> Fixed64 {
        (**self).draw()
    }
}

impl<D: UnitDraw + ?Sized> UnitDraw for Box<D> {
    fn draw(&mut self) -> Fixed64 {
        (**self).draw()
    }
}

// ---------------------------------------------------------------------------
// Seeded generator
// ---------------------------------------------------------------------------

/// Seeded SplitMix64 stream. A given seed replays the same convoy outcomes
/// on every platform.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        let mixed = (self.state ^ (self.state >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        let mixed = (mixed ^ (mixed >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        mixed ^ (mixed >> 31)
    }

    /// Raw generator position.
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl UnitDraw for SimRng {
    fn draw(&mut self) -> Fixed64 {
        // High 32 bits as the fraction of a Q32.32 value: uniform in [0, 1).
        Fixed64::from_bits((self.next_u64() >> 32) as i64)
    }
}

// ---------------------------------------------------------------------------
// Scripted draws
// ---------------------------------------------------------------------------

/// Plays back a fixed list of draws, wrapping around at the end, so tests can
/// force a damaged convoy through or into the ditch.
///
/// Inputs are clamped into `[0, 1)`; with no inputs every draw is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedDraw {
    values: Vec<Fixed64>,
    next: usize,
    used: u64,
}

impl ScriptedDraw {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| clamp_unit(f64_to_fixed64(v)))
            .collect();
        Self {
            values,
            next: 0,
            used: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }

    /// Draws consumed so far.
    pub fn drawn(&self) -> u64 {
        self.used
    }
}

impl UnitDraw for ScriptedDraw {
    fn draw(&mut self) -> Fixed64 {
        self.used += 1;
        if self.values.is_empty() {
            return Fixed64::ZERO;
        }
        let value = self.values[self.next];
        self.next = (self.next + 1) % self.values.len();
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let a: Vec<u64> = {
            let mut rng = SimRng::new(2024);
            (0..64).map(|_| rng.next_u64()).collect()
        };
        let mut rng = SimRng::new(2024);
        assert!(a.iter().all(|&v| v == rng.next_u64()));
        assert_ne!(SimRng::new(1).next_u64(), SimRng::new(2).next_u64());
    }

    #[test]
    fn seeded_draws_are_fractions() {
        let mut rng = SimRng::new(7);
        for _ in 0..5_000 {
            let v = rng.draw();
            assert!((Fixed64::ZERO..Fixed64::ONE).contains(&v), "{v}");
        }
    }

    #[test]
    fn certain_and_impossible_odds_consume_nothing() {
        let mut script = ScriptedDraw::constant(0.0);
        assert!(!script.chance(Fixed64::ZERO));
        assert!(!script.chance(f64_to_fixed64(-0.3)));
        assert!(script.chance(Fixed64::ONE));
        assert!(script.chance(f64_to_fixed64(4.0)));
        assert_eq!(script.drawn(), 0);
    }

    #[test]
    fn even_odds_split_a_long_run() {
        let mut rng = SimRng::new(99);
        let even = f64_to_fixed64(0.5);
        let failures = (0..8_000).filter(|_| rng.chance(even)).count();
        assert!((3_400..=4_600).contains(&failures), "{failures} of 8000");
    }

    #[test]
    fn script_wraps_around() {
        let mut script = ScriptedDraw::new([0.2, 0.7]);
        let drawn: Vec<Fixed64> = (0..5).map(|_| script.draw()).collect();
        assert_eq!(drawn[0], f64_to_fixed64(0.2));
        assert_eq!(drawn[1], f64_to_fixed64(0.7));
        assert_eq!(drawn[2..4], drawn[0..2]);
        assert_eq!(drawn[4], drawn[0]);
        assert_eq!(script.drawn(), 5);
    }

    #[test]
    fn script_edge_inputs() {
        assert!(ScriptedDraw::new([3.0]).draw() < Fixed64::ONE);
        assert_eq!(ScriptedDraw::new([-1.0]).draw(), Fixed64::ZERO);
        let mut empty = ScriptedDraw::new([]);
        assert_eq!(empty.draw(), Fixed64::ZERO);
        assert_eq!(empty.drawn(), 1);
    }

    #[test]
    fn draws_through_box_and_reference() {
        let mut boxed: Box<dyn UnitDraw> = Box::new(ScriptedDraw::constant(0.25));
        assert_eq!(boxed.draw(), f64_to_fixed64(0.25));

        fn one<D: UnitDraw>(mut source: D) -> Fixed64 {
            source.draw()
        }
        let mut rng = SimRng::new(3);
        assert_eq!(one(&mut rng), SimRng::new(3).draw());
        assert_ne!(rng.state(), SimRng::new(3).state());
    }

    #[test]
    fn generator_position_survives_json() {
        let mut rng = SimRng::new(42);
        (0..10).for_each(|_| {
            rng.next_u64();
        });
        let mut restored: SimRng = serde_json::from_str(&serde_json::to_string(&rng).unwrap()).unwrap();
        assert_eq!(restored.next_u64(), rng.next_u64());
    }
}
