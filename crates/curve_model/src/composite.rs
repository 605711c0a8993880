//! Time-varying composite curves
//!
//! A [`TimeComposite`] is an ordered list of `(offset_seconds, shape)` pairs.
//! The active shape at elapsed time `t` is the last entry whose offset is
//! `<= t`. Pricing always uses the shape active at call time; an integral is
//! never split across a shape transition.

use crate::{CurveError, CurveShape, FixedPoint, Result};

/// One piece of a composite: `shape` applies from `offset` seconds after go-live
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimedShape {
    pub offset: u64,
    pub shape: CurveShape,
}

/// Piecewise-in-time curve
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<TimedShape>", into = "Vec<TimedShape>"))]
pub struct TimeComposite {
    entries: Vec<TimedShape>,
}

impl TimeComposite {
    /// Build from `(offset_seconds, shape)` pairs.
    ///
    /// Offsets must start at 0 and be strictly increasing; every shape must
    /// itself be valid.
    pub fn new(pieces: Vec<(u64, CurveShape)>) -> Result<Self> {
        let entries = pieces
            .into_iter()
            .map(|(offset, shape)| TimedShape { offset, shape })
            .collect();
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<TimedShape>) -> Result<Self> {
        match entries.first() {
            None => return Err(CurveError::InvalidCurveDefinition("empty time composite")),
            Some(first) if first.offset != 0 => {
                return Err(CurveError::InvalidCurveDefinition("first offset must be zero"))
            }
            Some(_) => {}
        }
        if entries.windows(2).any(|pair| pair[1].offset <= pair[0].offset) {
            return Err(CurveError::InvalidCurveDefinition(
                "offsets must be strictly increasing",
            ));
        }
        for entry in &entries {
            entry.shape.validate()?;
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TimedShape] {
        &self.entries
    }

    /// Index of the shape active `elapsed_seconds` after go-live.
    ///
    /// Negative elapsed time (not yet live) selects the first shape.
    pub fn active_index(&self, elapsed_seconds: i64) -> usize {
        let t = elapsed_seconds.max(0) as u64;
        // entries[0].offset == 0, so at least one entry qualifies
        self.entries.partition_point(|entry| entry.offset <= t) - 1
    }

    pub fn active_shape(&self, elapsed_seconds: i64) -> &CurveShape {
        &self.entries[self.active_index(elapsed_seconds)].shape
    }

    /// Integral under the shape active at `elapsed_seconds`
    pub fn integral(&self, elapsed_seconds: i64, from: FixedPoint, to: FixedPoint) -> Result<FixedPoint> {
        self.active_shape(elapsed_seconds).integral(from, to)
    }

    pub fn price_at(&self, elapsed_seconds: i64, supply: FixedPoint) -> Result<FixedPoint> {
        self.active_shape(elapsed_seconds).price_at(supply)
    }
}

impl From<CurveShape> for TimeComposite {
    /// A fixed shape is a composite with a single piece at offset zero
    fn from(shape: CurveShape) -> Self {
        Self {
            entries: vec![TimedShape { offset: 0, shape }],
        }
    }
}

impl TryFrom<Vec<TimedShape>> for TimeComposite {
    type Error = CurveError;

    fn try_from(entries: Vec<TimedShape>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<TimeComposite> for Vec<TimedShape> {
    fn from(composite: TimeComposite) -> Self {
        composite.entries
    }
}
