/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
use crate::errors::Result;
use crate::funcs::{distance, movable_joint_limits};
use crate::sampling::halton_joint_positions;
use k::{InverseKinematicsSolver, SerialChain};
use log::*;
use nalgebra as na;

/// Solutions closer than this are considered the same branch.
const SOLUTION_DEDUP_TOLERANCE: f64 = 1.0e-2;

/// Deterministic restarts for a wrapped IK solver.
///
/// The wrapped solver runs first from the arm's current configuration, so a
/// nearby solution is preferred. When that fails, the arm is re-seeded from
/// the Halton sequence over the joint limits and the solver retried. The
/// same inputs always visit the same seeds in the same order, so the result
/// is reproducible.
pub struct SeededIkSolver<I>
where
    I: InverseKinematicsSolver<f64>,
{
    pub solver: I,
    pub num_seeds: usize,
}

impl<I> SeededIkSolver<I>
where
    I: InverseKinematicsSolver<f64>,
{
    pub fn new(solver: I, num_seeds: usize) -> Self {
        SeededIkSolver { solver, num_seeds }
    }

    /// All distinct solutions found across the seeds, sorted by distance
    /// from the arm's current configuration.
    ///
    /// The arm is restored to its current configuration before returning.
    pub fn solutions(
        &self,
        arm: &SerialChain<f64>,
        target_pose: &na::Isometry3<f64>,
    ) -> Result<Vec<Vec<f64>>> {
        let initial = arm.joint_positions();
        let limits = movable_joint_limits(arm);
        let mut found: Vec<Vec<f64>> = Vec::new();
        for index in 0..=self.num_seeds {
            let seed = if index == 0 {
                initial.clone()
            } else {
                halton_joint_positions(&limits, index - 1)
            };
            arm.set_joint_positions(&seed)?;
            if self.solver.solve(arm, target_pose).is_ok() {
                let solution = arm.joint_positions();
                if !found
                    .iter()
                    .any(|other| distance(other, &solution) < SOLUTION_DEDUP_TOLERANCE)
                {
                    found.push(solution);
                }
            }
        }
        arm.set_joint_positions(&initial)?;
        found.sort_by(|a, b| {
            distance(a, &initial)
                .partial_cmp(&distance(b, &initial))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        debug!("{} ik solutions at the target pose", found.len());
        Ok(found)
    }
}

impl<I> InverseKinematicsSolver<f64> for SeededIkSolver<I>
where
    I: InverseKinematicsSolver<f64>,
{
    fn solve(
        &self,
        arm: &SerialChain<f64>,
        target_pose: &na::Isometry3<f64>,
    ) -> std::result::Result<(), k::Error> {
        self.solve_with_constraints(arm, target_pose, &k::Constraints::default())
    }

    fn solve_with_constraints(
        &self,
        arm: &SerialChain<f64>,
        target_pose: &na::Isometry3<f64>,
        constraints: &k::Constraints,
    ) -> std::result::Result<(), k::Error> {
        let initial = arm.joint_positions();
        let mut result = self
            .solver
            .solve_with_constraints(arm, target_pose, constraints);
        if result.is_ok() {
            return result;
        }
        let limits = movable_joint_limits(arm);
        for index in 0..self.num_seeds {
            let seed = halton_joint_positions(&limits, index);
            if let Err(err) = arm.set_joint_positions(&seed) {
                warn!("failed to seed joint positions: {}", err);
                continue;
            }
            result = self
                .solver
                .solve_with_constraints(arm, target_pose, constraints);
            if result.is_ok() {
                return result;
            }
        }
        // no seed converged: put the arm back where it was
        if let Err(err) = arm.set_joint_positions(&initial) {
            warn!("failed to restore joint positions: {}", err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_arm() -> k::SerialChain<f64> {
        let urdf_robot = urdf_rs::read_file("sample.urdf").unwrap();
        let robot = k::Chain::<f64>::from(&urdf_robot);
        k::SerialChain::from_end(robot.find("j6").unwrap())
    }

    #[test]
    fn seeded_solver_reaches_forward_kinematics_pose() {
        let arm = sample_arm();
        arm.set_joint_positions(&[0.2, 0.6, -0.5, 0.3, 0.4, -0.2])
            .unwrap();
        let target_pose = arm.end_transform();

        let start = vec![0.1, 0.3, -0.2, 0.1, 0.2, 0.0];
        arm.set_joint_positions(&start).unwrap();
        let solver = SeededIkSolver::new(k::JacobianIkSolver::default(), 8);
        solver.solve(&arm, &target_pose).unwrap();

        let reached = arm.end_transform();
        assert!((reached.translation.vector - target_pose.translation.vector).norm() < 0.01);
        assert!(reached.rotation.angle_to(&target_pose.rotation) < 0.05);
    }

    #[test]
    fn solutions_are_sorted_deduplicated_and_restore_the_arm() {
        let arm = sample_arm();
        arm.set_joint_positions(&[0.2, 0.6, -0.5, 0.3, 0.4, -0.2])
            .unwrap();
        let target_pose = arm.end_transform();

        let start = vec![0.1, 0.3, -0.2, 0.1, 0.2, 0.0];
        arm.set_joint_positions(&start).unwrap();
        let solver = SeededIkSolver::new(k::JacobianIkSolver::default(), 8);
        let solutions = solver.solutions(&arm, &target_pose).unwrap();

        assert!(!solutions.is_empty());
        assert_eq!(arm.joint_positions(), start);
        let distances: Vec<f64> = solutions
            .iter()
            .map(|solution| distance(solution, &start))
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
        for (i, a) in solutions.iter().enumerate() {
            for b in solutions.iter().skip(i + 1) {
                assert!(distance(a, b) >= SOLUTION_DEDUP_TOLERANCE);
            }
        }
    }

    #[test]
    fn unreachable_pose_yields_no_solutions() {
        let arm = sample_arm();
        let target_pose = na::Isometry3::from_parts(
            na::Translation3::new(1.5, 0.0, 0.1),
            na::UnitQuaternion::identity(),
        );
        let solver = SeededIkSolver::new(k::JacobianIkSolver::default(), 4);
        assert!(solver.solve(&arm, &target_pose).is_err());
        assert!(solver.solutions(&arm, &target_pose).unwrap().is_empty());
    }
}
