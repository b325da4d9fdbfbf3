//! Post-processing of the assembled vertex batch.
//!
//! Finalizers run in registration order every time the batch is rebuilt,
//! after all quads have been written and before the batch is handed to the
//! render surface. They receive the vertices as a slice: colors and
//! positions may be rewritten, the vertex count may not change.
//!
//! Finalizers see [`FrameInfo`] instead of a clock. `elapsed` is the sum of
//! every `dt` the system has been updated with, so time-based effects stay
//! deterministic and pause when the host stops updating.
//!
//! # Built-in Finalizers
//!
//! | Type | Effect |
//! |------|--------|
//! | [`BeatHighlight`] | Recolors one cluster of quads per beat, cycling through the batch |
//! | [`Flash`] | Periodically recolors the whole batch |

use std::time::Duration;

use crate::vertex::VERTICES_PER_QUAD;
use crate::{Color, Vertex};

/// What a finalizer knows about the batch it is processing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Total simulated time of the owning system.
    pub elapsed: Duration,
    /// Number of quads in the batch.
    pub quads: usize,
}

/// A post-processor applied to the vertex batch before each draw.
pub trait Finalizer {
    fn finalize(&mut self, vertices: &mut [Vertex], frame: &FrameInfo);
}

impl<F> Finalizer for F
where
    F: FnMut(&mut [Vertex], &FrameInfo),
{
    fn finalize(&mut self, vertices: &mut [Vertex], frame: &FrameInfo) {
        self(vertices, frame)
    }
}

/// Keep the vertex's alpha so lifetime fading survives the recolor.
#[inline]
fn recolor(vertex: &mut Vertex, color: Color) {
    let alpha = vertex.color[3];
    vertex.set_color(color.with_alpha(alpha));
}

/// Highlights clusters of `cluster_size` consecutive quads, one cluster per
/// `beat`, sweeping from the oldest particles to the newest and wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatHighlight {
    pub cluster_size: usize,
    pub beat: Duration,
    pub color: Color,
}

impl BeatHighlight {
    pub fn new(cluster_size: usize, beat: Duration, color: Color) -> Self {
        Self {
            cluster_size: cluster_size.max(1),
            beat,
            color,
        }
    }

    /// Index of the highlighted cluster, or `None` when nothing is drawn.
    pub fn active_cluster(&self, frame: &FrameInfo) -> Option<usize> {
        if frame.quads == 0 || self.beat.is_zero() {
            return None;
        }
        let clusters = frame.quads.div_ceil(self.cluster_size);
        let beats = frame.elapsed.as_nanos() / self.beat.as_nanos();
        Some((beats % clusters as u128) as usize)
    }
}

impl Finalizer for BeatHighlight {
    fn finalize(&mut self, vertices: &mut [Vertex], frame: &FrameInfo) {
        let Some(cluster) = self.active_cluster(frame) else {
            return;
        };
        let per_cluster = self.cluster_size * VERTICES_PER_QUAD;
        let start = (cluster * per_cluster).min(vertices.len());
        let end = (start + per_cluster).min(vertices.len());
        for vertex in &mut vertices[start..end] {
            recolor(vertex, self.color);
        }
    }
}

/// Recolors every vertex for the first `duty` fraction of each `period`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flash {
    pub period: Duration,
    pub duty: f32,
    pub color: Color,
}

impl Flash {
    pub fn new(period: Duration, duty: f32, color: Color) -> Self {
        Self {
            period,
            duty: duty.clamp(0.0, 1.0),
            color,
        }
    }

    pub fn is_lit(&self, elapsed: Duration) -> bool {
        if self.period.is_zero() {
            return false;
        }
        let phase = (elapsed.as_nanos() % self.period.as_nanos()) as f64 / self.period.as_nanos() as f64;
        phase < self.duty as f64
    }
}

impl Finalizer for Flash {
    fn finalize(&mut self, vertices: &mut [Vertex], frame: &FrameInfo) {
        if !self.is_lit(frame.elapsed) {
            return;
        }
        for vertex in vertices {
            recolor(vertex, self.color);
        }
    }
}
