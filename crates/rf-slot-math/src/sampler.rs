//! Reel-strip window sampling
//!
//! One draw per reel picks a stop; the visible column is the `rows`
//! consecutive strip symbols starting there, wrapping at the end.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SlotResult};
use crate::grid::Grid;
use crate::random::RandomSource;
use crate::strip::ReelStrip;

/// A sampled grid with the stop drawn for each reel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledGrid {
    pub grid: Grid,
    pub stops: Vec<usize>,
}

pub struct SpinSampler;

impl SpinSampler {
    /// Sample a grid, discarding stop positions
    pub fn sample<S, R>(strips: &[S], rows: usize, rng: &mut R) -> SlotResult<Grid>
    where
        S: AsRef<ReelStrip>,
        R: RandomSource + ?Sized,
    {
        Ok(Self::sample_with_stops(strips, rows, rng)?.grid)
    }

    /// Sample a grid, one `next_index` draw per reel in reel order
    pub fn sample_with_stops<S, R>(strips: &[S], rows: usize, rng: &mut R) -> SlotResult<SampledGrid>
    where
        S: AsRef<ReelStrip>,
        R: RandomSource + ?Sized,
    {
        check_strips(strips, rows)?;
        let stops = strips
            .iter()
            .map(|s| rng.next_index(s.as_ref().len()))
            .collect::<SlotResult<Vec<_>>>()?;
        let grid = Self::window(strips, &stops, rows)?;
        Ok(SampledGrid { grid, stops })
    }

    /// Grid visible at known stops. Replays a spin without randomness.
    pub fn window<S: AsRef<ReelStrip>>(strips: &[S], stops: &[usize], rows: usize) -> SlotResult<Grid> {
        check_strips(strips, rows)?;
        if stops.len() != strips.len() {
            return Err(ConfigurationError::InvalidGeometry {
                reels: stops.len(),
                rows,
            }
            .into());
        }
        let columns = strips
            .iter()
            .zip(stops)
            .map(|(strip, &start)| {
                let strip = strip.as_ref();
                (0..rows).map(|row| strip.symbol_at(start + row)).collect()
            })
            .collect();
        Grid::from_columns(columns)
    }
}

fn check_strips<S: AsRef<ReelStrip>>(strips: &[S], rows: usize) -> SlotResult<()> {
    if strips.is_empty() || rows == 0 {
        return Err(ConfigurationError::InvalidGeometry {
            reels: strips.len(),
            rows,
        }
        .into());
    }
    if let Some(reel) = strips.iter().position(|s| s.as_ref().is_empty()) {
        return Err(ConfigurationError::ZeroWeightReel { reel }.into());
    }
    Ok(())
}
