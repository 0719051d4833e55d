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
use k::joint::Range;
use std::f64::consts::TAU;

/// Names of the movable joints of `chain`, in joint-position order.
pub fn movable_joint_names(chain: &k::SerialChain<f64>) -> Vec<String> {
    chain
        .iter()
        .filter_map(|node| {
            let joint = node.joint();
            if joint.is_movable() {
                Some(joint.name.clone())
            } else {
                None
            }
        })
        .collect()
}

/// Limits of the movable joints of `chain`, in joint-position order.
///
/// `None` means the joint is unlimited.
pub fn movable_joint_limits(chain: &k::SerialChain<f64>) -> Vec<Option<Range<f64>>> {
    chain
        .iter()
        .filter_map(|node| {
            let joint = node.joint();
            if joint.is_movable() {
                Some(joint.limits.clone())
            } else {
                None
            }
        })
        .collect()
}

/// Validate `positions` against the joint limits of `chain`.
///
/// Runs before any collision query so that limit violations fail fast.
pub fn check_joint_limits(chain: &k::SerialChain<f64>, positions: &[f64]) -> Result<()> {
    let names = movable_joint_names(chain);
    let limits = movable_joint_limits(chain);
    if positions.len() != limits.len() {
        return Err(Error::DofMismatch {
            input: positions.len(),
            dof: limits.len(),
        });
    }
    for ((name, range), position) in names.iter().zip(limits.iter()).zip(positions.iter()) {
        if let Some(range) = range {
            if *position < range.min || *position > range.max {
                return Err(Error::JointLimitViolation {
                    joint_name: name.clone(),
                    position: *position,
                    min_limit: range.min,
                    max_limit: range.max,
                });
            }
        }
    }
    Ok(())
}

/// Find the nearest equivalent angles for the joints without limits
pub fn modify_to_nearest_angle(
    reference: &[f64],
    target: &mut [f64],
    limits: &[Option<Range<f64>>],
) {
    assert_eq!(reference.len(), target.len());
    for i in 0..reference.len() {
        if limits[i].is_none() {
            let diff = target[i] - reference[i];
            if diff.abs() > TAU * 0.5 {
                target[i] -= (diff / TAU).round() * TAU;
            }
        }
    }
}

/// Euclidean distance between two joint configurations
pub(crate) fn distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
