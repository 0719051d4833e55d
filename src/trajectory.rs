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
use crate::errors::*;
use serde::{Deserialize, Serialize};

/// How consecutive waypoints are interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Linear,
    Cubic,
}

/// Describes how waypoint data maps onto the robot: which joints, in which
/// order, and the interpolation between waypoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSpec {
    pub joint_names: Vec<String>,
    pub interpolation: Interpolation,
}

impl ConfigurationSpec {
    pub fn new(joint_names: Vec<String>, interpolation: Interpolation) -> Self {
        ConfigurationSpec {
            joint_names,
            interpolation,
        }
    }

    pub fn dof(&self) -> usize {
        self.joint_names.len()
    }
}

/// Tags consumed by downstream trajectory processing.
///
/// A snapped trajectory is a single straight segment, so retiming passes may
/// skip their smoothing step when `smooth` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryTags {
    pub smooth: bool,
    pub deterministic_trajectory: bool,
    pub deterministic_endpoint: bool,
}

/// Joint-space trajectory: an ordered list of waypoints under one spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointTrajectory {
    pub spec: ConfigurationSpec,
    pub waypoints: Vec<Vec<f64>>,
    pub tags: TrajectoryTags,
}

impl JointTrajectory {
    pub fn new(spec: ConfigurationSpec) -> Self {
        JointTrajectory {
            spec,
            waypoints: Vec::new(),
            tags: TrajectoryTags::default(),
        }
    }

    /// Append a waypoint. Its length must match the spec.
    pub fn push(&mut self, waypoint: Vec<f64>) -> Result<()> {
        if waypoint.len() != self.spec.dof() {
            return Err(Error::DofMismatch {
                input: waypoint.len(),
                dof: self.spec.dof(),
            });
        }
        self.waypoints.push(waypoint);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_joint_trajectory() -> JointTrajectory {
        let spec = ConfigurationSpec::new(
            vec!["j1".to_owned(), "j2".to_owned()],
            Interpolation::Linear,
        );
        let mut trajectory = JointTrajectory::new(spec);
        trajectory.push(vec![0.0, 0.0]).unwrap();
        trajectory.push(vec![0.5, -0.25]).unwrap();
        trajectory.tags = TrajectoryTags {
            smooth: true,
            deterministic_trajectory: true,
            deterministic_endpoint: true,
        };
        trajectory
    }

    #[test]
    fn push_rejects_wrong_dof() {
        let mut trajectory = two_joint_trajectory();
        assert!(matches!(
            trajectory.push(vec![0.0; 3]),
            Err(Error::DofMismatch { input: 3, dof: 2 })
        ));
        assert_eq!(trajectory.len(), 2);
    }

    #[test]
    fn serialized_round_trip_preserves_structure() {
        let trajectory = two_joint_trajectory();
        let json = serde_json::to_string(&trajectory).unwrap();
        let restored: JointTrajectory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, trajectory);
        assert_eq!(restored.spec.joint_names, trajectory.spec.joint_names);
        assert_eq!(restored.waypoints, trajectory.waypoints);
        assert!(restored.tags.smooth);
    }
}
