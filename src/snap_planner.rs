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
use crate::collision::{CollisionChecker, CollisionReport, SelfCollisionReport};
use crate::errors::*;
use crate::funcs::{
    check_joint_limits, modify_to_nearest_angle, movable_joint_limits, movable_joint_names,
};
use crate::ik::SeededIkSolver;
use crate::sampling::{linear_collision_check_points, SampleOrder};
use crate::trajectory::{ConfigurationSpec, Interpolation, JointTrajectory, TrajectoryTags};
use k::InverseKinematicsSolver;
use log::*;
use nalgebra as na;
use ncollide3d::shape::Compound;
use std::path::Path;

/// default spacing between collision checked configurations
pub const DEFAULT_RESOLUTION: f64 = 0.02;
/// default tolerance under which the goal counts as already reached
pub const DEFAULT_GOAL_TOLERANCE: f64 = 1.0e-8;
/// default collision check margin
pub const DEFAULT_COLLISION_CHECK_MARGIN: f64 = 0.01;

/// Straight-line "snap" planner.
///
/// Checks the straight-line joint-space path to the goal and fails
/// immediately with a typed error when it is not collision free, instead of
/// falling back to a full motion planner. Intended as a short circuit in
/// front of one: a nearby goal resolves with a handful of collision checks.
pub struct SnapPlanner {
    /// Robot model used for collision checking. Planning always runs on
    /// this private model, never on a caller's live robot.
    pub collision_check_robot: k::Chain<f64>,
    /// Collision checker for the robot
    pub collision_checker: CollisionChecker,
    /// Joint name pairs checked for self collision
    pub self_collision_pairs: Vec<(String, String)>,
    /// Uniform per-joint check resolution
    pub resolution: f64,
    /// Per-joint resolutions overriding `resolution` when set
    pub joint_resolutions: Option<Vec<f64>>,
    /// A goal within this distance of the start, per joint, is treated as
    /// already reached and the goal waypoint is omitted
    pub goal_tolerance: f64,
    /// Ordering of the straight-line collision checks
    pub sample_order: SampleOrder,
}

impl SnapPlanner {
    pub fn new(collision_check_robot: k::Chain<f64>, collision_checker: CollisionChecker) -> Self {
        SnapPlanner {
            collision_check_robot,
            collision_checker,
            self_collision_pairs: Vec::new(),
            resolution: DEFAULT_RESOLUTION,
            joint_resolutions: None,
            goal_tolerance: DEFAULT_GOAL_TOLERANCE,
            sample_order: SampleOrder::VanDerCorput,
        }
    }

    /// Create a planner owning a robot model and checker built from `urdf_robot`.
    pub fn from_urdf_robot(urdf_robot: &urdf_rs::Robot, collision_check_margin: f64) -> Self {
        let collision_check_robot = k::Chain::from(urdf_robot);
        let collision_checker = CollisionChecker::from_urdf_robot(urdf_robot, collision_check_margin);
        Self::new(collision_check_robot, collision_checker)
    }

    /// Serial chain of this planner's own robot model ending at `end_joint_name`.
    ///
    /// The chain shares state with `collision_check_robot`, so positions set
    /// on it move the collision model.
    pub fn serial_chain(&self, end_joint_name: &str) -> Result<k::SerialChain<f64>> {
        let end = self
            .collision_check_robot
            .find(end_joint_name)
            .ok_or_else(|| Error::JointNotFound {
                joint_name: end_joint_name.to_owned(),
            })?;
        Ok(k::SerialChain::from_end(end))
    }

    /// Check if the robot in its current configuration collides with `objects`.
    pub fn has_any_colliding(&self, objects: &Compound<f64>) -> bool {
        self.collision_checker
            .has_environment_collision(&self.collision_check_robot, objects)
    }

    /// Names of the robot parts colliding with `objects`.
    pub fn environment_collision_report(&self, objects: &Compound<f64>) -> CollisionReport {
        self.collision_checker
            .environment_collision_report(&self.collision_check_robot, objects)
    }

    /// First self colliding pair among `self_collision_pairs`, if any.
    pub fn self_collision_report(&self) -> Result<SelfCollisionReport> {
        self.collision_checker
            .self_collision_report(&self.collision_check_robot, &self.self_collision_pairs)
    }

    /// Plan a straight-line trajectory from the current configuration of
    /// `using_joints` to `goal`.
    ///
    /// Joint limits are validated before any collision check runs. The
    /// straight line is then sampled at the resolution norm and each sample
    /// collision checked; the first collision aborts planning. On success
    /// the trajectory is tagged smooth and deterministic. The robot model is
    /// restored to the start configuration on every exit path.
    pub fn plan_to_joint_positions(
        &mut self,
        using_joints: &k::SerialChain<f64>,
        goal: &[f64],
        obstacles: &Compound<f64>,
    ) -> Result<JointTrajectory> {
        let start = using_joints.joint_positions();
        let result = self.snap(using_joints, &start, goal, obstacles);
        using_joints.set_joint_positions(&start)?;
        result
    }

    pub(crate) fn snap(
        &mut self,
        using_joints: &k::SerialChain<f64>,
        start: &[f64],
        goal: &[f64],
        obstacles: &Compound<f64>,
    ) -> Result<JointTrajectory> {
        let joint_names = movable_joint_names(using_joints);
        if goal.len() != joint_names.len() {
            return Err(Error::DofMismatch {
                input: goal.len(),
                dof: joint_names.len(),
            });
        }
        check_joint_limits(using_joints, start)?;
        check_joint_limits(using_joints, goal)?;

        let mut trajectory = JointTrajectory::new(ConfigurationSpec::new(
            joint_names.clone(),
            Interpolation::Linear,
        ));
        trajectory.push(start.to_vec())?;
        let reached = start
            .iter()
            .zip(goal.iter())
            .all(|(s, g)| (s - g).abs() <= self.goal_tolerance);
        if !reached {
            trajectory.push(goal.to_vec())?;
        }

        let resolutions = self.check_resolutions(joint_names.len())?;
        let checks =
            linear_collision_check_points(start, goal, &resolutions, self.sample_order)?;
        debug!("snap: checking {} configurations", checks.len());

        let scope = self.collision_checker.scoped_active_joints(joint_names);
        for positions in &checks {
            using_joints.set_joint_positions(positions)?;
            let report =
                scope.environment_collision_report(&self.collision_check_robot, obstacles);
            if !report.is_empty() {
                debug!("snap: environment collision at {:?}", positions);
                return Err(Error::EnvironmentCollision { report });
            }
            let report = scope
                .self_collision_report(&self.collision_check_robot, &self.self_collision_pairs)?;
            if !report.is_empty() {
                debug!("snap: self collision at {:?}", positions);
                return Err(Error::SelfCollision { report });
            }
        }

        trajectory.tags = TrajectoryTags {
            smooth: true,
            deterministic_trajectory: true,
            deterministic_endpoint: true,
        };
        Ok(trajectory)
    }

    fn check_resolutions(&self, dof: usize) -> Result<Vec<f64>> {
        match &self.joint_resolutions {
            Some(resolutions) => {
                if resolutions.len() != dof {
                    return Err(Error::DofMismatch {
                        input: resolutions.len(),
                        dof,
                    });
                }
                Ok(resolutions.clone())
            }
            None => Ok(vec![self.resolution; dof]),
        }
    }
}

/// Builder for [`SnapPlanner`]
pub struct SnapPlannerBuilder {
    urdf_robot: urdf_rs::Robot,
    collision_check_margin: f64,
    resolution: f64,
    joint_resolutions: Option<Vec<f64>>,
    goal_tolerance: f64,
    sample_order: SampleOrder,
    self_collision_pairs: Vec<(String, String)>,
}

impl SnapPlannerBuilder {
    pub fn from_urdf_robot(urdf_robot: urdf_rs::Robot) -> Self {
        SnapPlannerBuilder {
            urdf_robot,
            collision_check_margin: DEFAULT_COLLISION_CHECK_MARGIN,
            resolution: DEFAULT_RESOLUTION,
            joint_resolutions: None,
            goal_tolerance: DEFAULT_GOAL_TOLERANCE,
            sample_order: SampleOrder::VanDerCorput,
            self_collision_pairs: Vec::new(),
        }
    }

    pub fn try_from_urdf_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self::from_urdf_robot(urdf_rs::read_file(path)?))
    }

    pub fn collision_check_margin(mut self, margin: f64) -> Self {
        self.collision_check_margin = margin;
        self
    }

    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn joint_resolutions(mut self, resolutions: Vec<f64>) -> Self {
        self.joint_resolutions = Some(resolutions);
        self
    }

    pub fn goal_tolerance(mut self, tolerance: f64) -> Self {
        self.goal_tolerance = tolerance;
        self
    }

    pub fn sample_order(mut self, order: SampleOrder) -> Self {
        self.sample_order = order;
        self
    }

    pub fn self_collision_pairs(mut self, pairs: Vec<(String, String)>) -> Self {
        self.self_collision_pairs = pairs;
        self
    }

    pub fn finalize(self) -> SnapPlanner {
        let mut planner =
            SnapPlanner::from_urdf_robot(&self.urdf_robot, self.collision_check_margin);
        planner.resolution = self.resolution;
        planner.joint_resolutions = self.joint_resolutions;
        planner.goal_tolerance = self.goal_tolerance;
        planner.sample_order = self.sample_order;
        planner.self_collision_pairs = self.self_collision_pairs;
        planner
    }
}

/// [`SnapPlanner`] with pose goals resolved by deterministic seeded IK.
pub struct SnapPlannerWithIk<I>
where
    I: InverseKinematicsSolver<f64>,
{
    pub planner: SnapPlanner,
    pub ik_solver: SeededIkSolver<I>,
}

impl<I> SnapPlannerWithIk<I>
where
    I: InverseKinematicsSolver<f64>,
{
    pub fn new(planner: SnapPlanner, ik_solver: SeededIkSolver<I>) -> Self {
        SnapPlannerWithIk { planner, ik_solver }
    }

    /// Plan a straight-line trajectory to a goal configuration.
    pub fn plan_to_joint_positions(
        &mut self,
        using_joints: &k::SerialChain<f64>,
        goal: &[f64],
        obstacles: &Compound<f64>,
    ) -> Result<JointTrajectory> {
        self.planner
            .plan_to_joint_positions(using_joints, goal, obstacles)
    }

    /// Solve IK on the planner's own model, without collision filtering.
    pub fn solve_ik(
        &mut self,
        using_joints: &k::SerialChain<f64>,
        target_pose: &na::Isometry3<f64>,
    ) -> Result<()> {
        Ok(self.ik_solver.solve(using_joints, target_pose)?)
    }

    /// Plan a straight-line trajectory to an end-effector pose.
    ///
    /// The pose is resolved to the collision-free IK solution closest to the
    /// current configuration and snapped there. When every solution
    /// collides, the failure names the reason: an environment collision, a
    /// self collision, or no solution at all.
    pub fn plan_to_end_effector_pose(
        &mut self,
        using_joints: &k::SerialChain<f64>,
        target_pose: &na::Isometry3<f64>,
        obstacles: &Compound<f64>,
    ) -> Result<JointTrajectory> {
        let start = using_joints.joint_positions();
        let result = self.snap_to_pose(using_joints, &start, target_pose, obstacles);
        using_joints.set_joint_positions(&start)?;
        result
    }

    fn snap_to_pose(
        &mut self,
        using_joints: &k::SerialChain<f64>,
        start: &[f64],
        target_pose: &na::Isometry3<f64>,
        obstacles: &Compound<f64>,
    ) -> Result<JointTrajectory> {
        let solutions = self.ik_solver.solutions(using_joints, target_pose)?;
        let limits = movable_joint_limits(using_joints);
        for solution in &solutions {
            if self.is_collision_free(using_joints, solution, obstacles)? {
                let mut goal = solution.clone();
                modify_to_nearest_angle(start, &mut goal, &limits);
                return self.planner.snap(using_joints, start, &goal, obstacles);
            }
        }
        let error = self.diagnose_goal_failure(using_joints, &solutions, obstacles)?;
        Err(error)
    }

    fn is_collision_free(
        &self,
        using_joints: &k::SerialChain<f64>,
        positions: &[f64],
        obstacles: &Compound<f64>,
    ) -> Result<bool> {
        using_joints.set_joint_positions(positions)?;
        if self.planner.has_any_colliding(obstacles) {
            return Ok(false);
        }
        Ok(self.planner.self_collision_report()?.is_empty())
    }

    /// Explain why no IK solution was usable: the first collision found
    /// wins, with its report; no solutions at all means the pose is out of
    /// reach.
    fn diagnose_goal_failure(
        &self,
        using_joints: &k::SerialChain<f64>,
        solutions: &[Vec<f64>],
        obstacles: &Compound<f64>,
    ) -> Result<Error> {
        for solution in solutions {
            using_joints.set_joint_positions(solution)?;
            let report = self.planner.environment_collision_report(obstacles);
            if !report.is_empty() {
                return Ok(Error::EnvironmentCollision { report });
            }
            let report = self.planner.self_collision_report()?;
            if !report.is_empty() {
                return Ok(Error::SelfCollision { report });
            }
        }
        Ok(Error::NoIkSolution)
    }
}
