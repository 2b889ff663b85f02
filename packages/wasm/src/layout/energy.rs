//! Per-vertex energy and Newton-normalized move direction.
//!
//! The energy of vertex `v` has three parts:
//! - repulsion from every other vertex, approximated through the octree:
//!   `-repulsion_factor * weight(node) * repulsion(v) * f_r(dist)`
//! - attraction along its edges: `weight(edge) * f_a(dist)`
//! - gravitation toward the barycenter of all vertices:
//!   `gravitation_factor * repulsion_factor * repulsion(v) * f_a(dist)`
//!
//! where `f_e(d) = d^e / e`, and `f_0(d) = ln d` (the limit of the power law
//! as the exponent goes to 0).

use crate::layout::config::LayoutConfig;
use crate::layout::model::GraphModel;
use crate::spatial::Octree;
use crate::vector::Vector3;

/// Distance potential `dist^exponent / exponent`, or `ln(dist)` for a zero
/// exponent.
#[inline]
pub fn potential(dist: f32, exponent: f32) -> f32 {
    if exponent == 0.0 {
        dist.ln()
    } else {
        dist.powf(exponent) / exponent
    }
}

/// Repulsion factor that makes unit-weight edges settle near unit length.
///
/// `attraction / repulsion² * repulsion^((a - r) / 2)` over the model's
/// totals, or 1.0 if either total is zero.
pub fn repulsion_factor(model: &GraphModel, attr_exponent: f32, repu_exponent: f32) -> f32 {
    let attraction = model.total_attraction();
    let repulsion = model.total_repulsion();
    if attraction > 0.0 && repulsion > 0.0 {
        attraction / (repulsion * repulsion)
            * repulsion.powf(0.5 * (attr_exponent - repu_exponent))
    } else {
        1.0
    }
}

/// Unweighted mean of all positions; the origin for an empty slice.
pub fn barycenter(positions: &[Vector3]) -> Vector3 {
    if positions.is_empty() {
        return Vector3::ZERO;
    }
    let sum = positions.iter().fold(Vector3::ZERO, |acc, &p| acc + p);
    sum / positions.len() as f32
}

/// Energy model parameters plus the per-iteration state (current repulsion
/// factor and barycenter).
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyModel {
    pub attr_exponent: f32,
    pub repu_exponent: f32,
    pub gravitation_factor: f32,
    pub repulsion_factor: f32,
    pub barycenter: Vector3,
}

impl EnergyModel {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            attr_exponent: config.attr_exponent,
            repu_exponent: config.repu_exponent,
            gravitation_factor: config.gravitation_factor,
            repulsion_factor: 1.0,
            barycenter: Vector3::ZERO,
        }
    }

    /// Energy of vertex `v` at its current position in `positions`.
    pub fn energy(&self, model: &GraphModel, tree: &Octree, positions: &[Vector3], v: usize) -> f32 {
        let position = positions[v];
        let weight = model.repulsion(v);
        let mut energy = 0.0;

        if weight > 0.0 {
            let scale = -self.repulsion_factor * weight;
            tree.for_each_accepted(v as u32, position, |node, dist| {
                energy += scale * node.weight() * potential(dist, self.repu_exponent);
            });
        }

        for (n, w) in model.attractions(v) {
            let dist = position.distance(positions[n]);
            energy += w * potential(dist, self.attr_exponent);
        }

        let gravitation = self.gravitation_factor * self.repulsion_factor * weight;
        if gravitation > 0.0 {
            let dist = position.distance(self.barycenter);
            energy += gravitation * potential(dist, self.attr_exponent);
        }

        energy
    }

    /// Direction in which vertex `v` should move.
    ///
    /// The summed force is divided by the summed absolute second
    /// derivatives (stiffness) and then clamped to an eighth of the tree
    /// width. Zero if the stiffness vanishes or the result is not finite.
    pub fn direction(
        &self,
        model: &GraphModel,
        tree: &Octree,
        positions: &[Vector3],
        v: usize,
    ) -> Vector3 {
        let position = positions[v];
        let weight = model.repulsion(v);
        let mut dir = Vector3::ZERO;
        let mut stiffness = 0.0;

        if weight > 0.0 {
            let scale = self.repulsion_factor * weight;
            let curvature = (self.repu_exponent - 1.0).abs();
            tree.for_each_accepted(v as u32, position, |node, dist| {
                if dist == 0.0 {
                    return;
                }
                let tmp = scale * node.weight() * dist.powf(self.repu_exponent - 2.0);
                dir -= (node.position() - position) * tmp;
                stiffness += tmp * curvature;
            });
        }

        let curvature = (self.attr_exponent - 1.0).abs();
        for (n, w) in model.attractions(v) {
            let offset = positions[n] - position;
            let dist = offset.length();
            if dist == 0.0 {
                continue;
            }
            let tmp = w * dist.powf(self.attr_exponent - 2.0);
            dir += offset * tmp;
            stiffness += tmp * curvature;
        }

        let gravitation = self.gravitation_factor * self.repulsion_factor * weight;
        if gravitation > 0.0 {
            let offset = self.barycenter - position;
            let dist = offset.length();
            if dist > 0.0 {
                let tmp = gravitation * dist.powf(self.attr_exponent - 2.0);
                dir += offset * tmp;
                stiffness += tmp * curvature;
            }
        }

        if stiffness <= 0.0 {
            return Vector3::ZERO;
        }
        dir /= stiffness;
        if !dir.is_finite() {
            return Vector3::ZERO;
        }

        let limit = tree.width() / 8.0;
        let length = dir.length();
        if length > limit {
            dir *= limit / length;
        }
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use float_cmp::assert_approx_eq;

    fn lin_log(repulsion_factor: f32, gravitation_factor: f32) -> EnergyModel {
        EnergyModel {
            attr_exponent: 1.0,
            repu_exponent: 0.0,
            gravitation_factor,
            repulsion_factor,
            barycenter: Vector3::ZERO,
        }
    }

    #[test]
    fn test_zero_exponent_is_logarithm() {
        assert_eq!(potential(2.0, 0.0), 2.0f32.ln());
        assert_eq!(potential(1.0, 0.0), 0.0);

        // d^e / e - 1 / e approaches ln d as e goes to 0
        let e = 1e-3;
        let shifted = potential(2.0, e) - 1.0 / e;
        assert_approx_eq!(f32, shifted, 2.0f32.ln(), epsilon = 1e-2);
    }

    #[test]
    fn test_power_potential() {
        assert_approx_eq!(f32, potential(2.0, 3.0), 8.0 / 3.0, epsilon = 1e-6);
        assert_approx_eq!(f32, potential(4.0, 1.0), 4.0, epsilon = 1e-6);
        assert_approx_eq!(f32, potential(4.0, -1.0), -0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_repulsion_factor() {
        let model = GraphModel::new(2, &[Edge::new(0u32, 1u32, 1.0)], true, false).unwrap();
        // attraction 2, repulsion 2
        assert_approx_eq!(f32, repulsion_factor(&model, 1.0, 0.0), 0.5 * 2.0f32.sqrt(), epsilon = 1e-6);

        let isolated = GraphModel::new(3, &[], true, false).unwrap();
        assert_eq!(repulsion_factor(&isolated, 1.0, 0.0), 1.0);
    }

    #[test]
    fn test_barycenter_is_unweighted_mean() {
        let positions = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 4.0, 0.0),
            Vector3::new(4.0, 2.0, 3.0),
        ];
        assert_eq!(barycenter(&positions), Vector3::new(2.0, 2.0, 1.0));
        assert_eq!(barycenter(&[]), Vector3::ZERO);
    }

    #[test]
    fn test_energy_of_connected_pair() {
        let positions = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0)];
        let model = GraphModel::new(2, &[Edge::new(0u32, 1u32, 1.0)], true, false).unwrap();
        let tree = Octree::build(&positions, model.repulsion_weights());

        let energy = lin_log(1.0, 0.0).energy(&model, &tree, &positions, 0);
        assert_approx_eq!(f32, energy, 2.0 - 2.0f32.ln(), epsilon = 1e-5);
    }

    #[test]
    fn test_gravitation_energy() {
        let positions = [Vector3::new(3.0, 4.0, 0.0)];
        let model = GraphModel::new(1, &[], true, false).unwrap();
        let tree = Octree::build(&positions, model.repulsion_weights());

        let energy = lin_log(2.0, 0.5).energy(&model, &tree, &positions, 0);
        assert_approx_eq!(f32, energy, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_direction_is_clamped_to_eighth_of_width() {
        let positions = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0)];
        let model = GraphModel::new(2, &[Edge::new(0u32, 1u32, 1.0)], true, false).unwrap();
        let tree = Octree::build(&positions, model.repulsion_weights());

        // Unclamped the Newton step would be (90, 0, 0)
        let dir = lin_log(1.0, 0.0).direction(&model, &tree, &positions, 0);
        assert_approx_eq!(f32, dir.x, 1.25, epsilon = 1e-5);
        assert_eq!(dir.y, 0.0);
        assert_eq!(dir.z, 0.0);
    }

    #[test]
    fn test_direction_toward_equilibrium() {
        // Repulsion 1/d against attraction 1: equilibrium at distance 1.
        let model = GraphModel::new(2, &[Edge::new(0u32, 1u32, 1.0)], true, false).unwrap();
        let energy = lin_log(1.0, 0.0);

        let near = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.5, 0.0, 0.0)];
        let tree = Octree::build(&near, model.repulsion_weights());
        assert!(energy.direction(&model, &tree, &near, 1).x > 0.0);

        let far = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(4.0, 0.0, 0.0)];
        let tree = Octree::build(&far, model.repulsion_weights());
        assert!(energy.direction(&model, &tree, &far, 1).x < 0.0);
    }

    #[test]
    fn test_direction_without_stiffness_is_zero() {
        // Edge repulsion: the isolated vertex has weight 0 and, with linear
        // attraction, no curvature at all.
        let positions = [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(5.0, 5.0, 0.0),
        ];
        let model = GraphModel::new(3, &[Edge::new(0u32, 1u32, 1.0)], false, false).unwrap();
        let tree = Octree::build(&positions, model.repulsion_weights());

        let energy = lin_log(1.0, 0.001);
        assert_eq!(energy.direction(&model, &tree, &positions, 2), Vector3::ZERO);
        assert_eq!(energy.energy(&model, &tree, &positions, 2), 0.0);
    }
}
