//! The crystal growth automaton.
//!
//! Every cell of a hexagonal disc carries an amount of water. Cells at or
//! above [`FREEZE_THRESHOLD`] are ice; those and their direct neighbours are
//! *receptive*. Each step splits the field into a diffuse part (vapour held by
//! non-receptive cells) and a receptive part, smooths the diffuse part, adds
//! `gamma` to the receptive part and sums the two back together.

use crate::coord::{hex_count, hex_disc, Cube};
use crate::error::LatticeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Water level at which a cell counts as frozen.
pub const FREEZE_THRESHOLD: f64 = 1.0;
/// Initial water of the nucleus at the origin.
pub const NUCLEUS_WATER: f64 = 1.0;
/// Fixed explicit-Euler coefficient of the diffusion step.
pub const DIFFUSION_RATE: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Background vapour density; seed value of every non-nucleus cell.
    pub beta: f64,
    /// Water deposited on each receptive cell per step.
    pub gamma: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub position: Cube,
    pub water: f64,
}

impl Cell {
    pub fn is_frozen(&self) -> bool {
        self.water >= FREEZE_THRESHOLD
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    /// 1-based number of the step just taken.
    pub iteration: u64,
    /// Cells classified receptive in the phase split of this step.
    pub receptive: usize,
    /// Cells at or above the freeze threshold after the merge.
    pub frozen: usize,
    pub total_water: f64,
}

/// Serializable copy of a lattice, handed to renderers and exporters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub radius: i32,
    pub iteration: u64,
    pub params: Params,
    pub cells: Vec<Cell>,
}

pub struct HexLattice {
    radius: i32,
    params: Params,
    iteration: u64,
    positions: Vec<Cube>,
    index: HashMap<Cube, usize>,
    // Indices of the neighbours present in the lattice, in `OFFSETS` order.
    neighbors: Vec<Vec<usize>>,
    water: Vec<f64>,
    // Scratch buffers reused across steps.
    receptive: Vec<bool>,
    diffuse: Vec<f64>,
    next: Vec<f64>,
}

impl HexLattice {
    pub fn new(radius: i32, params: Params) -> Result<Self, LatticeError> {
        if radius < 0 {
            return Err(LatticeError::NegativeRadius(radius));
        }

        let positions: Vec<Cube> = hex_disc(radius).collect();
        debug_assert_eq!(positions.len(), hex_count(radius));

        let index: HashMap<Cube, usize> = positions
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect();

        let neighbors: Vec<Vec<usize>> = positions
            .iter()
            .map(|c| {
                c.neighbors()
                    .iter()
                    .filter_map(|n| index.get(n).copied())
                    .collect()
            })
            .collect();

        let water: Vec<f64> = positions
            .iter()
            .map(|&c| if c == Cube::ORIGIN { NUCLEUS_WATER } else { params.beta })
            .collect();

        let n = positions.len();
        debug!(
            radius,
            cells = n,
            beta = params.beta,
            gamma = params.gamma,
            "built hex lattice"
        );

        Ok(Self {
            radius,
            params,
            iteration: 0,
            positions,
            index,
            neighbors,
            water,
            receptive: vec![false; n],
            diffuse: vec![0.0; n],
            next: vec![0.0; n],
        })
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn params(&self) -> Params {
        self.params
    }

    /// Number of steps taken so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, c: Cube) -> bool {
        self.index.contains_key(&c)
    }

    pub fn water_at(&self, c: Cube) -> Option<f64> {
        self.index.get(&c).map(|&i| self.water[i])
    }

    /// Neighbours of `c` that exist in this lattice.
    pub fn present_neighbors(&self, c: Cube) -> Vec<Cube> {
        match self.index.get(&c) {
            Some(&i) => self.neighbors[i].iter().map(|&j| self.positions[j]).collect(),
            None => Vec::new(),
        }
    }

    /// Whether `c` is receptive against the current state; `None` if `c` is
    /// outside the lattice.
    pub fn is_receptive(&self, c: Cube) -> Option<bool> {
        self.index.get(&c).map(|&i| self.classify(i))
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.positions
            .iter()
            .zip(&self.water)
            .map(|(&position, &water)| Cell { position, water })
    }

    pub fn total_water(&self) -> f64 {
        self.water.iter().sum()
    }

    pub fn frozen_count(&self) -> usize {
        self.water.iter().filter(|&&w| w >= FREEZE_THRESHOLD).count()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            radius: self.radius,
            iteration: self.iteration,
            params: self.params,
            cells: self.cells().collect(),
        }
    }

    fn classify(&self, i: usize) -> bool {
        self.water[i] >= FREEZE_THRESHOLD
            || self.neighbors[i]
                .iter()
                .any(|&j| self.water[j] >= FREEZE_THRESHOLD)
    }

    /// Advance the automaton by one tick.
    ///
    /// Reads only the state left by the previous step: the classification and
    /// the diffuse view are filled completely before any new value is written,
    /// and new values go to a separate buffer that replaces the field at the
    /// end.
    pub fn step(&mut self) -> StepReport {
        let receptive = self.split_phases();
        self.diffuse_and_merge();
        std::mem::swap(&mut self.water, &mut self.next);
        self.iteration += 1;

        let report = StepReport {
            iteration: self.iteration,
            receptive,
            frozen: self.frozen_count(),
            total_water: self.total_water(),
        };
        trace!(
            iteration = report.iteration,
            receptive = report.receptive,
            frozen = report.frozen,
            total_water = report.total_water,
            "step"
        );
        report
    }

    fn split_phases(&mut self) -> usize {
        let mut count = 0;
        for i in 0..self.water.len() {
            let r = self.classify(i);
            self.receptive[i] = r;
            self.diffuse[i] = if r { 0.0 } else { self.water[i] };
            count += usize::from(r);
        }
        count
    }

    fn diffuse_and_merge(&mut self) {
        let gamma = self.params.gamma;
        for i in 0..self.water.len() {
            let d = self.diffuse[i];
            let nbrs = &self.neighbors[i];
            // A lone cell (radius 0) has nothing to average with and keeps
            // its diffuse value.
            let mean = if nbrs.is_empty() {
                d
            } else {
                nbrs.iter().map(|&j| self.diffuse[j]).sum::<f64>() / nbrs.len() as f64
            };
            let diffused = d + DIFFUSION_RATE * (-d + mean);
            let deposited = if self.receptive[i] {
                self.water[i] + gamma
            } else {
                0.0
            };
            self.next[i] = deposited + diffused;
        }
    }

    /// Step `iterations` times; returns the last report, if any step was taken.
    pub fn run(&mut self, iterations: u64) -> Option<StepReport> {
        self.run_with(iterations, |_| {})
    }

    /// Like [`run`](Self::run), calling `observe` after every step.
    pub fn run_with<F>(&mut self, iterations: u64, mut observe: F) -> Option<StepReport>
    where
        F: FnMut(&StepReport),
    {
        let mut last = None;
        for _ in 0..iterations {
            let report = self.step();
            observe(&report);
            last = Some(report);
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(beta: f64, gamma: f64) -> Params {
        Params { beta, gamma }
    }

    fn cube(x: i32, y: i32, z: i32) -> Cube {
        Cube::try_from_xyz(x, y, z).unwrap()
    }

    #[test]
    fn negative_radius_is_rejected() {
        assert_eq!(
            HexLattice::new(-1, params(0.4, 0.001)).err(),
            Some(LatticeError::NegativeRadius(-1))
        );
    }

    #[test]
    fn seeds_background_and_nucleus() {
        let lat = HexLattice::new(3, params(0.25, 0.01)).unwrap();
        assert_eq!(lat.len(), 37);
        assert_eq!(lat.iteration(), 0);
        for cell in lat.cells() {
            if cell.position == Cube::ORIGIN {
                assert_eq!(cell.water, NUCLEUS_WATER);
            } else {
                assert_eq!(cell.water, 0.25);
            }
        }
        assert_eq!(lat.frozen_count(), 1);
    }

    #[test]
    fn boundary_cells_have_fewer_neighbors() {
        let lat = HexLattice::new(2, params(0.4, 0.0)).unwrap();
        assert_eq!(lat.present_neighbors(Cube::ORIGIN).len(), 6);
        assert_eq!(lat.present_neighbors(cube(2, -2, 0)).len(), 3);
        assert_eq!(lat.present_neighbors(cube(2, -1, -1)).len(), 4);
        assert!(lat.present_neighbors(cube(3, -3, 0)).is_empty());
        assert!(!lat.contains(cube(3, -3, 0)));
    }

    #[test]
    fn receptivity_spreads_from_frozen_cells() {
        let lat = HexLattice::new(2, params(0.4, 0.0)).unwrap();
        assert_eq!(lat.is_receptive(Cube::ORIGIN), Some(true));
        assert_eq!(lat.is_receptive(cube(1, -1, 0)), Some(true));
        assert_eq!(lat.is_receptive(cube(2, -1, -1)), Some(false));
        assert_eq!(lat.is_receptive(cube(5, -5, 0)), None);
    }

    #[test]
    fn first_step_matches_hand_computation() {
        // radius 2: ring-1 cells are receptive (next to the nucleus) and see
        // three ring-2 vapour cells plus three zeros in the diffuse view.
        let mut lat = HexLattice::new(2, params(0.35, 0.001)).unwrap();
        let report = lat.step();

        assert_eq!(report.iteration, 1);
        assert_eq!(report.receptive, 7);

        let origin = lat.water_at(Cube::ORIGIN).unwrap();
        assert!((origin - 1.001).abs() < 1e-12);

        let ring1 = lat.water_at(cube(0, -1, 1)).unwrap();
        assert!((ring1 - (0.35 + 0.001 + 0.5 * 0.175)).abs() < 1e-12);

        // corner of ring 2: neighbours are one ring-1 cell (0) and two ring-2 cells
        let corner = lat.water_at(cube(0, -2, 2)).unwrap();
        assert!((corner - (0.35 + 0.5 * (-0.35 + 0.7 / 3.0))).abs() < 1e-12);
    }

    #[test]
    fn single_cell_lattice_steps_without_neighbours() {
        let mut lat = HexLattice::new(0, params(0.4, 0.001)).unwrap();
        assert_eq!(lat.len(), 1);
        assert!(lat.present_neighbors(Cube::ORIGIN).is_empty());

        let report = lat.step();
        assert_eq!(report.receptive, 1);
        assert!((lat.water_at(Cube::ORIGIN).unwrap() - 1.001).abs() < 1e-12);
    }

    #[test]
    fn lone_vapour_cell_keeps_its_value() {
        // With no nucleus above threshold the single cell is pure vapour.
        let mut lat = HexLattice::new(0, params(0.4, 0.001)).unwrap();
        lat.water[0] = 0.3;
        lat.step();
        assert_eq!(lat.water_at(Cube::ORIGIN), Some(0.3));
    }

    #[test]
    fn run_reports_last_step_and_observes_each() {
        let mut lat = HexLattice::new(3, params(0.4, 0.001)).unwrap();
        let mut seen = Vec::new();
        let last = lat.run_with(4, |r| seen.push(r.iteration)).unwrap();
        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(last.iteration, 4);
        assert_eq!(lat.iteration(), 4);
        assert!(lat.run(0).is_none());
    }

    #[test]
    fn snapshot_mirrors_lattice() {
        let mut lat = HexLattice::new(2, params(0.4, 0.001)).unwrap();
        lat.run(3);
        let snap = lat.snapshot();
        assert_eq!(snap.radius, 2);
        assert_eq!(snap.iteration, 3);
        assert_eq!(snap.cells.len(), lat.len());
        for cell in &snap.cells {
            assert_eq!(lat.water_at(cell.position), Some(cell.water));
        }
    }
}
