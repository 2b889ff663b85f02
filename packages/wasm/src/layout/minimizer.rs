//! Barnes-Hut energy minimizer.
//!
//! Each iteration recomputes the barycenter, rebuilds the octree over the
//! current positions, schedules the repulsion factor, and then moves every
//! free vertex in index order along its Newton direction using a short
//! line search. Moves are patched into the octree immediately so later
//! vertices in the same iteration see an approximately current field.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

use crate::error::{Error, ObserverClosed, Result};
use crate::layout::config::LayoutConfig;
use crate::layout::energy::{EnergyModel, barycenter, repulsion_factor};
use crate::layout::model::{EdgeLengthStats, GraphModel};
use crate::spatial::{Octree, find_coincident};
use crate::vector::Vector3;

/// Multipliers for the repulsion factor, indexed by iteration modulo 20.
///
/// Raised to the power `attr_exponent - repu_exponent` before use.
pub const REPULSION_SCHEDULE: [f32; 20] = [
    0.95, 0.9, 0.85, 0.8, 0.75, 0.8, 0.85, 0.9, 0.95, 1.0, 1.1, 1.2, 1.3, 1.4, 1.5, 1.4, 1.3, 1.2,
    1.1, 1.0,
];

/// The final iterations run with the unmodulated repulsion factor.
const STEADY_ITERATIONS: u32 = 20;

/// Line search: the direction is divided into this many steps.
const STEP_DIVISOR: u32 = 32;

/// Largest multiple tried when the line search keeps improving.
const MAX_MULTIPLE: u32 = 128;

/// Shared count of iterations still to run.
///
/// Filled with the configured iteration count when the minimizer is created
/// and refilled when a run ends. The minimizer takes one unit at the top of
/// every iteration. Another thread (or the observer) can lower it to end the
/// run early, even before the run starts, or raise it to extend the run.
#[derive(Debug, Clone, Default)]
pub struct IterationBudget(Arc<AtomicU32>);

impl IterationBudget {
    pub fn new(iterations: u32) -> Self {
        Self(Arc::new(AtomicU32::new(iterations)))
    }

    pub fn remaining(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, iterations: u32) {
        self.0.store(iterations, Ordering::Release);
    }

    /// End the run after the current iteration.
    pub fn stop(&self) {
        self.set(0);
    }

    /// Consume one iteration. Returns the number left afterwards, or `None`
    /// if the budget was already exhausted.
    fn take(&self) -> Option<u32> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()
            .map(|previous| previous - 1)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
    /// All configured iterations ran.
    Completed,
    /// The iteration budget was lowered before all iterations ran.
    Cancelled,
    /// The observer asked to stop.
    ObserverClosed,
}

/// Statistics of a minimizer run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutStats {
    /// Total energy over all vertices before the first iteration.
    pub initial_energy: f32,
    /// Sum of the accepted energies of the free vertices, per iteration.
    pub iteration_energies: Vec<f32>,
    /// Unmodulated repulsion factor.
    pub repulsion_factor: f32,
    pub iterations_run: u32,
    pub termination: Termination,
    pub edge_lengths_before: EdgeLengthStats,
    pub edge_lengths_after: EdgeLengthStats,
}

/// Energy minimizer over a fixed graph model.
#[derive(Debug, Clone)]
pub struct Minimizer {
    model: GraphModel,
    config: LayoutConfig,
    energy: EnergyModel,
    repulsion_factor: f32,
    budget: IterationBudget,
}

impl Minimizer {
    /// Create a minimizer. Fails if `config` does not validate.
    pub fn new(model: GraphModel, config: LayoutConfig) -> Result<Self> {
        config.validate()?;

        let repulsion_factor = repulsion_factor(&model, config.attr_exponent, config.repu_exponent);
        let mut energy = EnergyModel::new(&config);
        energy.repulsion_factor = repulsion_factor;

        Ok(Self {
            budget: IterationBudget::new(config.iterations),
            model,
            config,
            energy,
            repulsion_factor,
        })
    }

    /// Handle for cancelling or extending a run from outside.
    pub fn budget(&self) -> IterationBudget {
        self.budget.clone()
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Repulsion factor without the pulsing modulation.
    pub fn repulsion_factor(&self) -> f32 {
        self.repulsion_factor
    }

    /// Run the minimizer on `positions` without an observer.
    pub fn minimize_energy(&mut self, positions: &mut [Vector3]) -> Result<LayoutStats> {
        self.minimize_energy_with(positions, || Ok(()))
    }

    /// Run the minimizer on `positions`, calling `observer` once after the
    /// initial energy and once after every iteration.
    ///
    /// An observer error ends the run; moves from completed iterations are
    /// kept. With fewer than two vertices nothing is done and the observer
    /// is never called.
    pub fn minimize_energy_with<F>(
        &mut self,
        positions: &mut [Vector3],
        mut observer: F,
    ) -> Result<LayoutStats>
    where
        F: FnMut() -> std::result::Result<(), ObserverClosed>,
    {
        let n = self.model.vertex_count();
        if positions.len() != n {
            return Err(Error::PositionCountMismatch {
                expected: n,
                actual: positions.len(),
            });
        }

        let edge_lengths_before = self.model.edge_length_stats(positions);
        let mut stats = LayoutStats {
            initial_energy: 0.0,
            iteration_energies: Vec::new(),
            repulsion_factor: self.repulsion_factor,
            iterations_run: 0,
            termination: Termination::Completed,
            edge_lengths_before,
            edge_lengths_after: edge_lengths_before,
        };
        if n <= 1 {
            return Ok(stats);
        }

        if let Some(v) = positions.iter().position(|p| !p.is_finite()) {
            return Err(Error::NonFinitePosition(v as u32));
        }
        if let Some((first, second)) = find_coincident(positions) {
            return Err(Error::CoincidentVertices { first, second });
        }

        log::info!(
            vertices = n,
            iterations = self.config.iterations,
            attr_exponent = self.config.attr_exponent,
            repu_exponent = self.config.repu_exponent;
            "Starting energy minimization"
        );
        log_edge_lengths(&edge_lengths_before);

        self.energy.repulsion_factor = self.repulsion_factor;
        self.energy.barycenter = barycenter(positions);

        let tree = Octree::build(positions, self.model.repulsion_weights());
        stats.initial_energy = (0..n)
            .map(|v| self.energy.energy(&self.model, &tree, positions, v))
            .sum();
        log::info!(
            energy = stats.initial_energy,
            repulsion = self.repulsion_factor;
            "Initial energy"
        );

        if let Err(closed) = observer() {
            log::info!(reason = closed.reason.as_str(); "Layout observer closed");
            stats.termination = Termination::ObserverClosed;
        } else {
            while let Some(remaining) = self.budget.take() {
                let step = stats.iterations_run + 1;
                let energy = self.iterate(positions, step, remaining);

                stats.iterations_run = step;
                stats.iteration_energies.push(energy);
                log::debug!(
                    iteration = step,
                    energy = energy,
                    repulsion = self.energy.repulsion_factor;
                    "Iteration finished"
                );

                if let Err(closed) = observer() {
                    log::info!(reason = closed.reason.as_str(); "Layout observer closed");
                    stats.termination = Termination::ObserverClosed;
                    break;
                }
            }
        }

        if stats.termination == Termination::Completed
            && stats.iterations_run < self.config.iterations
        {
            stats.termination = Termination::Cancelled;
        }
        // Refill for the next run
        self.budget.set(self.config.iterations);

        stats.edge_lengths_after = self.model.edge_length_stats(positions);
        log::info!(
            iterations_run = stats.iterations_run,
            termination:? = stats.termination;
            "Energy minimization finished"
        );
        log_edge_lengths(&stats.edge_lengths_after);

        Ok(stats)
    }

    /// One pass over all free vertices. Returns the summed energy of the
    /// moved vertices at their accepted positions.
    fn iterate(&mut self, positions: &mut [Vector3], step: u32, remaining: u32) -> f32 {
        self.energy.barycenter = barycenter(positions);
        let mut tree = Octree::build(positions, self.model.repulsion_weights());

        self.energy.repulsion_factor = if remaining > STEADY_ITERATIONS {
            let pulse = REPULSION_SCHEDULE[step as usize % REPULSION_SCHEDULE.len()];
            self.repulsion_factor
                * pulse.powf(self.config.attr_exponent - self.config.repu_exponent)
        } else {
            self.repulsion_factor
        };

        let mut energy = 0.0;
        for v in 0..self.model.vertex_count() {
            if !self.model.is_fixed(v) {
                energy += self.relax_vertex(&mut tree, positions, v);
            }
        }
        energy
    }

    /// Move vertex `v` by the best tried multiple of its direction and
    /// return its energy there. Multiple 0 (staying put) is always a
    /// candidate, so the energy never increases.
    fn relax_vertex(&self, tree: &mut Octree, positions: &mut [Vector3], v: usize) -> f32 {
        let step = self.energy.direction(&self.model, tree, positions, v) / STEP_DIVISOR as f32;
        let old = positions[v];

        let mut best_energy = self.energy.energy(&self.model, tree, positions, v);
        let mut best_multiple = 0;

        // Halve while nothing helps yet or the last halving helped
        let mut multiple = STEP_DIVISOR;
        while multiple >= 1 && (best_multiple == 0 || best_multiple / 2 == multiple) {
            let energy = self.energy_at(tree, positions, v, old + step * multiple as f32);
            if energy < best_energy {
                best_energy = energy;
                best_multiple = multiple;
            }
            multiple /= 2;
        }

        // Double while the largest multiple so far is still the best
        let mut multiple = STEP_DIVISOR * 2;
        while multiple <= MAX_MULTIPLE && best_multiple == multiple / 2 {
            let energy = self.energy_at(tree, positions, v, old + step * multiple as f32);
            if energy < best_energy {
                best_energy = energy;
                best_multiple = multiple;
            }
            multiple *= 2;
        }

        if best_multiple == 0 {
            positions[v] = old;
        } else {
            positions[v] = old + step * best_multiple as f32;
            tree.move_vertex(old, positions[v], self.model.repulsion(v));
        }
        best_energy
    }

    fn energy_at(&self, tree: &Octree, positions: &mut [Vector3], v: usize, position: Vector3) -> f32 {
        positions[v] = position;
        self.energy.energy(&self.model, tree, positions, v)
    }
}

fn log_edge_lengths(stats: &EdgeLengthStats) {
    log::info!(
        vertices = stats.vertex_count,
        total_attraction = stats.total_attraction,
        arithmetic_mean = stats.arithmetic_mean,
        geometric_mean = stats.geometric_mean;
        "Edge lengths"
    );
}
