//! # Formation Planner
//!
//! Computes target positions for all robots given a named pattern.
//!
//! The planner is a pure function of `(pattern, ids, bounds, spacing)`:
//! the same inputs always produce the same mapping. Ids are placed in
//! ascending order, duplicates collapsed.
//!
//! ## Patterns
//!
//! - `none`: no forced target, robots roam freely
//! - `grid`: square-ish lattice, row-major by id, centered on the surface
//! - `circle`: evenly spaced ring, radius grows with fleet size
//! - `line`: horizontal rows, wrapping to more rows when the surface is full

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FleetError;
use crate::geometry::{Bounds, Position};
use crate::robot::RobotId;

/// Distance kept clear between formation targets and the surface edge.
pub const FORMATION_MARGIN: f32 = 20.0;

/// Named rule for computing target positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormationPattern {
    /// Free movement, no targets.
    #[default]
    None,
    /// Rectangular lattice.
    Grid,
    /// Evenly spaced ring.
    Circle,
    /// Horizontal rows.
    Line,
}

impl FormationPattern {
    /// All supported patterns.
    pub const ALL: [Self; 4] = [Self::None, Self::Grid, Self::Circle, Self::Line];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Grid => "grid",
            Self::Circle => "circle",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for FormationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormationPattern {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| FleetError::InvalidFormationPattern(s.to_string()))
    }
}

/// Computes formation targets inside fixed bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormationPlanner {
    bounds: Bounds,
    spacing: f32,
}

impl FormationPlanner {
    /// Creates a planner for the given surface and preferred spacing.
    ///
    /// Spacing shrinks automatically when the fleet would not fit.
    #[must_use]
    pub fn new(bounds: Bounds, spacing: f32) -> Self {
        Self {
            bounds,
            spacing: spacing.max(1.0),
        }
    }

    /// Surface bounds used for placement.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Computes the target for every id under `pattern`.
    ///
    /// `FormationPattern::None` yields an empty mapping.
    #[must_use]
    pub fn compute(&self, pattern: FormationPattern, ids: &[RobotId]) -> BTreeMap<RobotId, Position> {
        let ordered: Vec<RobotId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if ordered.is_empty() {
            return BTreeMap::new();
        }

        let n = ordered.len();
        let place: Box<dyn Fn(usize) -> Position> = match pattern {
            FormationPattern::None => return BTreeMap::new(),
            FormationPattern::Grid => {
                let cols = ((n as f32).sqrt().ceil() as usize).max(1);
                Box::new(self.lattice(n, cols))
            }
            FormationPattern::Line => {
                let cols = (self.usable_width() / self.spacing).floor() as usize + 1;
                Box::new(self.lattice(n, cols.clamp(1, n)))
            }
            FormationPattern::Circle => Box::new(self.ring(n)),
        };

        ordered
            .into_iter()
            .enumerate()
            .map(|(index, id)| (id, self.bounds.clamp(place(index))))
            .collect()
    }

    fn usable_width(&self) -> f32 {
        (self.bounds.width - 2.0 * FORMATION_MARGIN).max(1.0)
    }

    fn usable_height(&self) -> f32 {
        (self.bounds.height - 2.0 * FORMATION_MARGIN).max(1.0)
    }

    /// Row-major lattice with `cols` columns, centered. Partial last rows
    /// are centered too.
    fn lattice(&self, n: usize, cols: usize) -> impl Fn(usize) -> Position {
        let rows = n.div_ceil(cols);
        let col_step = fit_step(self.spacing, self.usable_width(), cols);
        let row_step = fit_step(self.spacing, self.usable_height(), rows);
        let center = self.bounds.center();

        move |index| {
            let row = index / cols;
            let col = index % cols;
            let in_row = (n - row * cols).min(cols);
            let x = center.x + (col as f32 - (in_row - 1) as f32 / 2.0) * col_step;
            let y = center.y + (row as f32 - (rows - 1) as f32 / 2.0) * row_step;
            Position::new(x, y)
        }
    }

    fn ring(&self, n: usize) -> impl Fn(usize) -> Position {
        let max_radius = (self.bounds.min_side() / 2.0 - FORMATION_MARGIN).max(1.0);
        let radius = (n as f32 * self.spacing / TAU).clamp(self.spacing.min(max_radius), max_radius);
        let center = self.bounds.center();

        move |index| {
            let angle = index as f32 / n as f32 * TAU;
            center.offset(radius * angle.cos(), radius * angle.sin())
        }
    }
}

/// Largest step `<= preferred` so that `count` points span at most `span`.
fn fit_step(preferred: f32, span: f32, count: usize) -> f32 {
    if count <= 1 {
        return preferred;
    }
    preferred.min(span / (count - 1) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u32) -> Vec<RobotId> {
        (0..n).map(RobotId).collect()
    }

    fn planner() -> FormationPlanner {
        FormationPlanner::new(Bounds::new(800.0, 600.0), 24.0)
    }

    fn distinct(values: impl Iterator<Item = f32>) -> usize {
        let mut v: Vec<f32> = values.collect();
        v.sort_by(f32::total_cmp);
        v.dedup_by(|a, b| (*a - *b).abs() < 1e-3);
        v.len()
    }

    #[test]
    fn test_grid_of_sixteen_is_four_by_four() {
        let targets = planner().compute(FormationPattern::Grid, &ids(16));
        assert_eq!(targets.len(), 16);
        assert_eq!(distinct(targets.values().map(|p| p.x)), 4);
        assert_eq!(distinct(targets.values().map(|p| p.y)), 4);

        let seen: Vec<Position> = targets.values().copied().collect();
        for (i, a) in seen.iter().enumerate() {
            for b in &seen[i + 1..] {
                assert!(a.distance_to(*b) > 1.0, "overlapping targets {a:?} {b:?}");
            }
        }

        // Row-major by id: ids 0..4 share the first row.
        let first_row_y = targets[&RobotId(0)].y;
        for id in 0..4 {
            assert!((targets[&RobotId(id)].y - first_row_y).abs() < 1e-3);
        }
        assert!(targets[&RobotId(4)].y > first_row_y);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let p = planner();
        for pattern in FormationPattern::ALL {
            assert_eq!(p.compute(pattern, &ids(37)), p.compute(pattern, &ids(37)));
        }
    }

    #[test]
    fn test_input_order_and_duplicates_do_not_matter() {
        let p = planner();
        let shuffled = vec![RobotId(3), RobotId(1), RobotId(2), RobotId(0), RobotId(1)];
        assert_eq!(
            p.compute(FormationPattern::Grid, &shuffled),
            p.compute(FormationPattern::Grid, &ids(4))
        );
    }

    #[test]
    fn test_none_yields_no_targets() {
        assert!(planner().compute(FormationPattern::None, &ids(10)).is_empty());
        assert!(planner().compute(FormationPattern::Grid, &[]).is_empty());
    }

    #[test]
    fn test_circle_is_equidistant_from_center() {
        let p = planner();
        let center = p.bounds().center();
        let targets = p.compute(FormationPattern::Circle, &ids(12));
        let r0 = targets[&RobotId(0)].distance_to(center);
        for pos in targets.values() {
            assert!((pos.distance_to(center) - r0).abs() < 1e-2);
        }

        let bigger = p.compute(FormationPattern::Circle, &ids(60));
        assert!(bigger[&RobotId(0)].distance_to(center) > r0);
    }

    #[test]
    fn test_line_single_row_when_it_fits() {
        let targets = planner().compute(FormationPattern::Line, &ids(10));
        assert_eq!(distinct(targets.values().map(|p| p.y)), 1);
        assert_eq!(distinct(targets.values().map(|p| p.x)), 10);
    }

    #[test]
    fn test_full_fleet_stays_in_bounds_and_distinct() {
        let p = planner();
        for pattern in [FormationPattern::Grid, FormationPattern::Line, FormationPattern::Circle] {
            let targets = p.compute(pattern, &ids(1000));
            assert_eq!(targets.len(), 1000);
            assert!(targets.values().all(|pos| p.bounds().contains(*pos)));
            let mut keys: Vec<(i64, i64)> = targets
                .values()
                .map(|pos| ((pos.x * 100.0) as i64, (pos.y * 100.0) as i64))
                .collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), 1000, "{pattern} produced overlapping targets");
        }
    }

    #[test]
    fn test_parse_pattern() {
        assert_eq!("GRID".parse::<FormationPattern>(), Ok(FormationPattern::Grid));
        assert_eq!(
            "spiral".parse::<FormationPattern>(),
            Err(FleetError::InvalidFormationPattern("spiral".to_string()))
        );
    }
}
