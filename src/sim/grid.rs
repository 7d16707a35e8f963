//! Spawn slot grid
//!
//! The arena's width is split into equal columns. A bubble near the spawn
//! edge reserves the columns its footprint covers; new bubbles are placed
//! where no reservation overlaps. Once a bubble rises out of the spawn band
//! its reservation is dropped and it is never collision-checked again.
//!
//! Placement is best-effort: when the grid is crowded the allocator relaxes
//! its check and finally places at random rather than refuse to spawn.

use std::collections::BTreeMap;
use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bubble::BubbleId;
use super::config::ArenaGeometry;
use crate::consts::*;

/// Inclusive range of grid columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub lo: usize,
    pub hi: usize,
}

impl ColumnSpan {
    pub fn overlaps(&self, other: &ColumnSpan) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    pub fn center(&self) -> usize {
        (self.lo + self.hi) / 2
    }

    pub fn columns(&self) -> impl Iterator<Item = usize> {
        self.lo..=self.hi
    }
}

/// How hard the allocator had to try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementQuality {
    /// No reservation overlaps the span
    Clear,
    /// Fallback accepted a span with a few neighbors
    Relaxed,
    /// Every attempt failed; placed at random
    Forced,
}

/// Where a new bubble goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub column: usize,
    pub span: ColumnSpan,
    /// Bubble centre, percent of arena width
    pub x: f32,
    pub quality: PlacementQuality,
}

/// A bubble's claim on the grid. Centre and size are kept so the span can
/// be recomputed when the arena width changes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Reservation {
    column: usize,
    size_px: f32,
    span: ColumnSpan,
}

/// Column reservations near the spawn edge
#[derive(Debug, Clone)]
pub struct SlotGrid {
    columns: usize,
    width_px: f32,
    scale_factor: f32,
    /// Bubbles whose reserved span covers each column
    occupancy: Vec<Vec<BubbleId>>,
    reservations: BTreeMap<BubbleId, Reservation>,
}

impl SlotGrid {
    pub fn new(geometry: &ArenaGeometry) -> Self {
        let columns = geometry.columns.max(GRID_SECTIONS);
        Self {
            columns,
            width_px: geometry.width_px,
            scale_factor: geometry.scale_factor,
            occupancy: vec![Vec::new(); columns],
            reservations: BTreeMap::new(),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn width_px(&self) -> f32 {
        self.width_px
    }

    /// Column width as percent of arena width
    pub fn column_width_pct(&self) -> f32 {
        100.0 / self.columns as f32
    }

    /// Recompute pixel-derived geometry. Every reservation keeps its centre
    /// column and is re-spanned for the new footprint.
    pub fn set_arena_width(&mut self, width_px: f32) {
        self.width_px = width_px;
        let reservations = std::mem::take(&mut self.reservations);
        for column in &mut self.occupancy {
            column.clear();
        }
        for (id, reservation) in reservations {
            let half = self.half_width(reservation.size_px);
            let span = self.span_at(reservation.column, half);
            self.reserve(id, Reservation { span, ..reservation });
        }
    }

    /// Columns either side of the centre column a bubble of `size_px` covers
    pub fn half_width(&self, size_px: f32) -> usize {
        let span = self.columns as f32 * size_px / (self.width_px * self.scale_factor);
        let half = (span / 2.0).ceil();
        if half.is_finite() && half > 0.0 {
            (half as usize).min(self.columns)
        } else {
            0
        }
    }

    pub fn span_at(&self, column: usize, half: usize) -> ColumnSpan {
        ColumnSpan {
            lo: column.saturating_sub(half),
            hi: (column + half).min(self.columns - 1),
        }
    }

    /// No reservation touches any column of `span`
    pub fn is_free(&self, span: &ColumnSpan) -> bool {
        span.columns().all(|c| self.occupancy[c].is_empty())
    }

    /// Number of distinct reservations overlapping `span`
    pub fn overlap_count(&self, span: &ColumnSpan) -> usize {
        self.reservations
            .values()
            .filter(|other| other.span.overlaps(span))
            .count()
    }

    pub fn reservation(&self, id: BubbleId) -> Option<ColumnSpan> {
        self.reservations.get(&id).map(|r| r.span)
    }

    pub fn reserved_count(&self) -> usize {
        self.reservations.len()
    }

    /// Bubbles reserving column `column`
    pub fn occupants(&self, column: usize) -> &[BubbleId] {
        self.occupancy.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find and reserve a spot for bubble `id` of diameter `size_px`
    pub fn allocate<R: Rng + ?Sized>(&mut self, id: BubbleId, size_px: f32, rng: &mut R) -> Placement {
        self.release(id);

        let half = self.half_width(size_px);
        let bounds = self.center_bounds(half);

        // Least crowded section first; ties go to the leftmost
        let sections = self.sections();
        let mut order: Vec<(usize, usize)> = sections
            .iter()
            .enumerate()
            .map(|(i, range)| (self.section_load(range), i))
            .collect();
        order.sort_unstable();

        for (_, index) in order {
            let section = &sections[index];
            let candidates = section.start.max(bounds.start)..section.end.min(bounds.end);
            if candidates.is_empty() {
                continue;
            }
            for _ in 0..SECTION_ATTEMPTS {
                let column = rng.random_range(candidates.clone());
                let span = self.span_at(column, half);
                if self.is_free(&span) {
                    return self.place(id, column, size_px, span, PlacementQuality::Clear, rng);
                }
            }
        }

        for _ in 0..FALLBACK_ATTEMPTS {
            let column = rng.random_range(bounds.clone());
            let span = self.span_at(column, half);
            if self.overlap_count(&span) <= FALLBACK_MAX_NEIGHBORS {
                log::debug!("Bubble {} placed with relaxed spacing at column {}", id, column);
                return self.place(id, column, size_px, span, PlacementQuality::Relaxed, rng);
            }
        }

        let column = rng.random_range(bounds);
        let span = self.span_at(column, half);
        log::debug!(
            "Spawn grid exhausted ({} reservations), forcing bubble {} at column {}",
            self.reservations.len(),
            id,
            column
        );
        self.place(id, column, size_px, span, PlacementQuality::Forced, rng)
    }

    /// Drop a reservation. Releasing an unknown id is a no-op.
    pub fn release(&mut self, id: BubbleId) -> bool {
        let Some(reservation) = self.reservations.remove(&id) else {
            return false;
        };
        for column in reservation.span.columns() {
            self.occupancy[column].retain(|&other| other != id);
        }
        true
    }

    /// Keep only the reservations `keep` approves of
    pub fn retain<F: FnMut(BubbleId) -> bool>(&mut self, mut keep: F) {
        let stale: Vec<BubbleId> = self
            .reservations
            .keys()
            .copied()
            .filter(|&id| !keep(id))
            .collect();
        for id in stale {
            self.release(id);
        }
    }

    pub fn clear(&mut self) {
        self.reservations.clear();
        for column in &mut self.occupancy {
            column.clear();
        }
    }

    fn reserve(&mut self, id: BubbleId, reservation: Reservation) {
        for column in reservation.span.columns() {
            self.occupancy[column].push(id);
        }
        self.reservations.insert(id, reservation);
    }

    fn place<R: Rng + ?Sized>(
        &mut self,
        id: BubbleId,
        column: usize,
        size_px: f32,
        span: ColumnSpan,
        quality: PlacementQuality,
        rng: &mut R,
    ) -> Placement {
        self.reserve(
            id,
            Reservation {
                column,
                size_px,
                span,
            },
        );
        // Wander a little inside the centre column so rows don't look gridded
        let x = (column as f32 + rng.random_range(0.25..0.75)) * self.column_width_pct();
        Placement {
            column,
            span,
            x: x.clamp(0.0, 100.0),
            quality,
        }
    }

    /// Centre columns that keep the whole footprint inside the arena. A
    /// footprint wider than the arena may be centred anywhere.
    fn center_bounds(&self, half: usize) -> Range<usize> {
        if self.columns > 2 * half {
            half..self.columns - half
        } else {
            0..self.columns
        }
    }

    /// The macro-sections; the last one absorbs any remainder
    fn sections(&self) -> Vec<Range<usize>> {
        let len = self.columns / GRID_SECTIONS;
        (0..GRID_SECTIONS)
            .map(|i| {
                let end = if i + 1 == GRID_SECTIONS {
                    self.columns
                } else {
                    (i + 1) * len
                };
                i * len..end
            })
            .collect()
    }

    fn section_load(&self, section: &Range<usize>) -> usize {
        self.reservations
            .values()
            .filter(|r| section.contains(&r.column))
            .count()
    }
}
