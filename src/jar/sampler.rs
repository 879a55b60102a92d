//! Star placement — bounded rejection sampling inside the spawn mask.
//!
//! A candidate center is accepted when all four corners of its square lie on
//! mask pixels with alpha ≥ threshold AND it is strictly farther than one
//! item size from every already-placed center. After `max_attempts` misses
//! the configured fallback point is returned; placement never errors.

use rand::Rng;
use tracing::{debug, warn};

use crate::config::JarConfig;
use crate::jar::Point;
use crate::jar::mask::AlphaMask;

/// The subset of [`JarConfig`] that placement needs.
#[derive(Debug, Clone, Copy)]
pub struct SamplerParams {
    /// Placement area edge. Mask pixels at or past it never count as inside.
    pub raster_size: u32,
    pub item_size: f64,
    pub alpha_threshold: u8,
    pub max_attempts: u32,
    pub fallback: Point,
    pub shake_iterations: u32,
    pub shake_amplitude: f64,
}

impl From<&JarConfig> for SamplerParams {
    fn from(config: &JarConfig) -> Self {
        Self {
            raster_size: config.raster_size,
            item_size: config.item_size,
            alpha_threshold: config.alpha_threshold,
            max_attempts: config.max_attempts,
            fallback: config.fallback,
            shake_iterations: config.shake_iterations,
            shake_amplitude: config.shake_amplitude,
        }
    }
}

/// Result of shaking one star: every accepted intermediate point (for the
/// animation) and where it came to rest.
#[derive(Debug, Clone, PartialEq)]
pub struct ShakePath {
    pub waypoints: Vec<Point>,
    pub settled: Point,
}

pub struct PositionSampler<'m> {
    mask: Option<&'m AlphaMask>,
    params: SamplerParams,
}

impl<'m> PositionSampler<'m> {
    pub fn new(mask: Option<&'m AlphaMask>, params: SamplerParams) -> Self {
        Self { mask, params }
    }

    /// Whether a star centered at `p` sits fully inside the mask and the
    /// raster square.
    pub fn contains(&self, p: Point) -> bool {
        let Some(mask) = self.mask else {
            return false;
        };
        let half = self.params.item_size / 2.0;
        let threshold = self.params.alpha_threshold;
        let edge = self.params.raster_size as f64;
        [
            (p.x - half, p.y - half),
            (p.x + half, p.y - half),
            (p.x - half, p.y + half),
            (p.x + half, p.y + half),
        ]
        .iter()
        .all(|&(x, y)| {
            x < edge && y < edge && mask.alpha_at(x, y).is_some_and(|a| a >= threshold)
        })
    }

    fn clear_of(&self, p: Point, existing: &[Point]) -> bool {
        let min_sq = self.params.item_size * self.params.item_size;
        existing.iter().all(|e| e.distance_sq(&p) > min_sq)
    }

    /// Draw a position for a new star that avoids every point in `existing`.
    pub fn sample<R: Rng + ?Sized>(&self, existing: &[Point], rng: &mut R) -> Point {
        let Some(mask) = self.mask else {
            warn!("spawn mask not loaded, using fallback position");
            return self.params.fallback;
        };
        // A mask larger than the raster is only read inside the raster.
        let span_x = mask.width().min(self.params.raster_size);
        let span_y = mask.height().min(self.params.raster_size);
        for _ in 0..self.params.max_attempts {
            let candidate = Point::new(
                rng.gen_range(0..span_x) as f64,
                rng.gen_range(0..span_y) as f64,
            );
            if self.contains(candidate) && self.clear_of(candidate, existing) {
                return candidate;
            }
        }
        debug!(
            attempts = self.params.max_attempts,
            placed = existing.len(),
            "placement budget exhausted, using fallback position"
        );
        self.params.fallback
    }

    /// Sample one position per slot in order, each seeing all earlier ones.
    /// Must stay sequential: the non-overlap guarantee depends on it.
    pub fn sample_many<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<Point> {
        let mut placed = Vec::with_capacity(count);
        for _ in 0..count {
            let p = self.sample(&placed, rng);
            placed.push(p);
        }
        placed
    }

    /// Jiggle a star around `start`. Each step is re-checked against the mask
    /// only (stars may brush past each other while shaking); rejected steps
    /// are skipped. `None` without a mask; the star stays put.
    pub fn shake<R: Rng + ?Sized>(&self, start: Point, rng: &mut R) -> Option<ShakePath> {
        self.mask?;
        let amplitude = self.params.shake_amplitude;
        let mut current = start;
        let mut waypoints = Vec::with_capacity(self.params.shake_iterations as usize);
        for _ in 0..self.params.shake_iterations {
            let candidate = Point::new(
                current.x + (rng.r#gen::<f64>() - 0.5) * amplitude,
                current.y + (rng.r#gen::<f64>() - 0.5) * amplitude,
            );
            if !self.contains(candidate) {
                continue;
            }
            waypoints.push(candidate);
            current = candidate;
        }
        Some(ShakePath {
            waypoints,
            settled: current,
        })
    }
}
