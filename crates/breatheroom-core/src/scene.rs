//! Decorative scene: background particles and the gallery reveal.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::events::Event;

pub const DEFAULT_PARTICLE_COUNT: usize = 50;
pub const MAX_PARTICLE_SIZE_PX: f64 = 3.0;
pub const MAX_PARTICLE_LEFT_VW: f64 = 100.0;
pub const MAX_PARTICLE_DELAY_SECS: f64 = 20.0;
pub const DEFAULT_REVEAL_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Width and height in pixels.
    pub size_px: f64,
    /// Horizontal offset in viewport widths.
    pub left_vw: f64,
    /// Animation start delay in seconds.
    pub delay_secs: f64,
}

/// Generated once at startup and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Self {
        let particles = (0..count)
            .map(|_| Particle {
                size_px: rng.gen_range(0.0..MAX_PARTICLE_SIZE_PX),
                left_vw: rng.gen_range(0.0..MAX_PARTICLE_LEFT_VW),
                delay_secs: rng.gen_range(0.0..MAX_PARTICLE_DELAY_SECS),
            })
            .collect();
        Self { particles }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

/// One-shot visibility reveal for the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevealObserver {
    threshold: f64,
    visible: bool,
}

impl RevealObserver {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Report the fraction of the gallery currently on screen.
    ///
    /// Emits `GalleryRevealed` the first time the ratio reaches the
    /// threshold; later reports never hide it again.
    pub fn observe(&mut self, visible_ratio: f64) -> Option<Event> {
        if self.visible || visible_ratio <= 0.0 || visible_ratio < self.threshold {
            return None;
        }
        self.visible = true;
        Some(Event::GalleryRevealed {
            visible_ratio,
            at: Utc::now(),
        })
    }
}

impl Default for RevealObserver {
    fn default() -> Self {
        Self::new(DEFAULT_REVEAL_THRESHOLD)
    }
}
