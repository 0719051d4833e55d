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
use crate::collision::{CollisionReport, SelfCollisionReport};
use std::io;
use thiserror::Error;

/// Error for `snap-planner`
#[derive(Debug, Error)]
pub enum Error {
    /// A start or goal position is outside the joint limits. Raised before
    /// any collision check runs.
    #[error("joint {joint_name}: position {position} is out of limits [{min_limit}, {max_limit}]")]
    JointLimitViolation {
        joint_name: String,
        position: f64,
        min_limit: f64,
        max_limit: f64,
    },
    #[error("no inverse kinematics solution reaches the goal pose")]
    NoIkSolution,
    #[error("environment collision: {report}")]
    EnvironmentCollision { report: CollisionReport },
    #[error("self collision: {report}")]
    SelfCollision { report: SelfCollisionReport },
    #[error("dof mismatch: input len = {input}, dof = {dof}")]
    DofMismatch { input: usize, dof: usize },
    #[error("joint {joint_name} not found in the robot model")]
    JointNotFound { joint_name: String },
    #[error("kinematics error: {0}")]
    Kinematics(#[from] k::Error),
    #[error("URDF error: {0}")]
    Urdf(#[from] urdf_rs::UrdfError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(String),
}

/// Result for `snap-planner`
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether re-running with identical inputs reproduces this failure.
    ///
    /// True for every planning failure: the snap pipeline contains no
    /// randomized sampling, so limit, collision and IK outcomes repeat.
    pub fn is_deterministic(&self) -> bool {
        matches!(
            self,
            Error::JointLimitViolation { .. }
                | Error::NoIkSolution
                | Error::EnvironmentCollision { .. }
                | Error::SelfCollision { .. }
        )
    }
}

impl<'a> From<&'a str> for Error {
    fn from(err: &'a str) -> Error {
        Error::Other(err.to_owned())
    }
}

impl From<String> for Error {
    fn from(error: String) -> Error {
        Error::Other(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planning_failures_are_deterministic() {
        assert!(Error::NoIkSolution.is_deterministic());
        assert!(Error::JointLimitViolation {
            joint_name: "j1".to_owned(),
            position: 2.0,
            min_limit: -1.0,
            max_limit: 1.0,
        }
        .is_deterministic());
        assert!(!Error::from("not a planning failure").is_deterministic());
    }
}
