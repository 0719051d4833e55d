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
//! # Snap motion planning
//!
//! Plan the straight-line joint trajectory to a goal and collision check it
//! with `ncollide3d`; fail immediately with a typed error when the line is
//! blocked. This crate is a short circuit in front of a full motion planner,
//! not a planner itself: nearby goals resolve with a handful of collision
//! checks, everything else is reported as `EnvironmentCollision`,
//! `SelfCollision`, `JointLimitViolation` or `NoIkSolution` so the caller
//! can escalate.
//!
//! Pose goals are resolved with deterministic seeded inverse kinematics
//! built on the `k` crate; every outcome of planning is reproducible.
//!
//! # Example
//!
//! ```no_run
//! use nalgebra as na;
//! use ncollide3d::shape::{Compound, Cuboid, ShapeHandle};
//!
//! // Create the planner from a URDF file
//! let planner = snap_planner::SnapPlannerBuilder::try_from_urdf_file("sample.urdf")
//!     .unwrap()
//!     .collision_check_margin(0.01)
//!     .resolution(0.02)
//!     .finalize();
//! // Deterministic seeded restarts around the Jacobian IK solver
//! let solver = snap_planner::SeededIkSolver::new(snap_planner::JacobianIkSolver::default(), 16);
//! let mut planner = snap_planner::SnapPlannerWithIk::new(planner, solver);
//! let arm = planner.planner.serial_chain("j6").unwrap();
//!
//! // Obstacles
//! let obstacles = Compound::new(vec![(
//!     na::Isometry3::new(na::Vector3::new(0.6, 0.0, 0.2), na::zero()),
//!     ShapeHandle::new(Cuboid::new(na::Vector3::new(0.1, 0.1, 0.1))),
//! )]);
//!
//! // Snap to an end-effector pose
//! let target_pose = na::Isometry3::from_parts(
//!     na::Translation3::new(0.3, 0.1, 0.5),
//!     na::UnitQuaternion::from_euler_angles(0.0, 0.5, 0.0),
//! );
//! match planner.plan_to_end_effector_pose(&arm, &target_pose, &obstacles) {
//!     Ok(trajectory) => println!("snapped through {} waypoints", trajectory.len()),
//!     Err(err) => println!("snap failed: {}", err),
//! }
//! ```

mod errors;
pub use crate::errors::*;

mod collision;
pub use crate::collision::*;

mod funcs;
pub use crate::funcs::*;

mod sampling;
pub use crate::sampling::*;

mod trajectory;
pub use crate::trajectory::*;

mod ik;
pub use crate::ik::*;

mod snap_planner;
pub use crate::snap_planner::*;

// re-export k::IK modules
pub use k::{InverseKinematicsSolver, JacobianIkSolver};
