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
use std::f64::consts::PI;

/// Radical inverse of `index` in `base`: the van der Corput sequence.
pub fn radical_inverse(mut index: usize, base: usize) -> f64 {
    let b = base as f64;
    let mut inv_base = 1.0 / b;
    let mut result = 0.0;
    while index > 0 {
        result += (index % base) as f64 * inv_base;
        index /= base;
        inv_base /= b;
    }
    result
}

/// Ordering of the straight-line collision checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    /// Endpoints first, then recursive bisection: collisions show up after
    /// few checks.
    VanDerCorput,
    /// Naive start-to-goal stepping.
    Linear,
}

/// Permutation of `0..=n` visiting the endpoints first, then the midpoint,
/// then the quarter points, following the base-2 van der Corput sequence.
pub fn van_der_corput_order(n: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(n + 1);
    let mut seen = vec![false; n + 1];
    order.push(0);
    seen[0] = true;
    if n > 0 {
        order.push(n);
        seen[n] = true;
    }
    let mut denominator: usize = 2;
    while order.len() <= n {
        let mut numerator = 1;
        while numerator < denominator {
            let index = ((numerator as f64 / denominator as f64) * n as f64).round() as usize;
            if !seen[index] {
                seen[index] = true;
                order.push(index);
            }
            numerator += 2;
        }
        denominator = match denominator.checked_mul(2) {
            Some(denominator) => denominator,
            None => break,
        };
    }
    order
}

/// Configurations to check along the straight line from `start` to `goal`.
///
/// The spacing is the per-joint `resolutions` 2-norm: `n` intervals with
/// `n = ceil(norm((goal - start) / resolutions))`. A goal within resolution
/// of the start yields the start configuration only.
pub fn linear_collision_check_points(
    start: &[f64],
    goal: &[f64],
    resolutions: &[f64],
    order: SampleOrder,
) -> Result<Vec<Vec<f64>>> {
    if goal.len() != start.len() {
        return Err(Error::DofMismatch {
            input: goal.len(),
            dof: start.len(),
        });
    }
    if resolutions.len() != start.len() {
        return Err(Error::DofMismatch {
            input: resolutions.len(),
            dof: start.len(),
        });
    }
    if resolutions.iter().any(|resolution| *resolution <= 0.0) {
        return Err("joint resolutions must be positive".into());
    }
    let steps = start
        .iter()
        .zip(goal.iter())
        .zip(resolutions.iter())
        .map(|((s, g), resolution)| ((g - s) / resolution).powi(2))
        .sum::<f64>()
        .sqrt();
    let n = steps.ceil() as usize;
    let indices = match order {
        SampleOrder::VanDerCorput => van_der_corput_order(n),
        SampleOrder::Linear => (0..=n).collect(),
    };
    Ok(indices
        .into_iter()
        .map(|index| {
            let t = if n == 0 { 0.0 } else { index as f64 / n as f64 };
            start
                .iter()
                .zip(goal.iter())
                .map(|(s, g)| s + (g - s) * t)
                .collect()
        })
        .collect())
}

/// Deterministic joint-space sample inside `limits`: point `index` of the
/// Halton sequence, one prime base per joint.
///
/// If the limit is None, `[-PI, PI)` is used.
pub fn halton_joint_positions(limits: &[Option<Range<f64>>], index: usize) -> Vec<f64> {
    const PRIMES: [usize; 16] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];
    limits
        .iter()
        .enumerate()
        .map(|(dim, range)| {
            let t = radical_inverse(index + 1, PRIMES[dim % PRIMES.len()]);
            match range {
                Some(range) => range.min + (range.max - range.min) * t,
                None => (t - 0.5) * 2.0 * PI,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1.0e-8;

    #[test]
    fn radical_inverse_base_two() {
        assert!((radical_inverse(0, 2) - 0.0).abs() < TOLERANCE);
        assert!((radical_inverse(1, 2) - 0.5).abs() < TOLERANCE);
        assert!((radical_inverse(2, 2) - 0.25).abs() < TOLERANCE);
        assert!((radical_inverse(3, 2) - 0.75).abs() < TOLERANCE);
        assert!((radical_inverse(1, 3) - 1.0 / 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn van_der_corput_checks_endpoints_then_midpoints() {
        assert_eq!(van_der_corput_order(0), vec![0]);
        assert_eq!(van_der_corput_order(1), vec![0, 1]);
        assert_eq!(van_der_corput_order(4), vec![0, 4, 2, 1, 3]);
    }

    #[test]
    fn van_der_corput_is_a_permutation() {
        let mut order = van_der_corput_order(33);
        assert_eq!(order.len(), 34);
        order.sort_unstable();
        assert_eq!(order, (0..=33).collect::<Vec<_>>());
    }

    #[test]
    fn check_points_cover_the_segment() {
        let points = linear_collision_check_points(
            &[0.0, 0.0],
            &[1.0, 0.0],
            &[0.1, 0.1],
            SampleOrder::VanDerCorput,
        )
        .unwrap();
        assert_eq!(points.len(), 11);
        assert_eq!(points[0], vec![0.0, 0.0]);
        assert_eq!(points[1], vec![1.0, 0.0]);

        // identical start and goal: only the start is checked
        let points = linear_collision_check_points(
            &[0.2, 0.3],
            &[0.2, 0.3],
            &[0.1, 0.1],
            SampleOrder::VanDerCorput,
        )
        .unwrap();
        assert_eq!(points, vec![vec![0.2, 0.3]]);

        // linear ordering walks from start to goal
        let points = linear_collision_check_points(
            &[0.0, 0.0],
            &[1.0, 0.0],
            &[0.1, 0.1],
            SampleOrder::Linear,
        )
        .unwrap();
        assert_eq!(points[1], vec![0.1, 0.0]);
        assert_eq!(points[10], vec![1.0, 0.0]);
    }

    #[test]
    fn check_points_are_deterministic() {
        let make = || {
            linear_collision_check_points(
                &[0.0, -0.4],
                &[1.3, 0.9],
                &[0.02, 0.02],
                SampleOrder::VanDerCorput,
            )
            .unwrap()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn halton_positions_respect_limits() {
        let limits = vec![Some(Range::new(-1.0, 1.0)), Some(Range::new(0.0, 0.1)), None];
        for index in 0..100 {
            let positions = halton_joint_positions(&limits, index);
            assert_eq!(positions.len(), limits.len());
            assert!(positions[0] >= -1.0 && positions[0] < 1.0);
            assert!(positions[1] >= 0.0 && positions[1] < 0.1);
            assert!(positions[2] >= -PI && positions[2] < PI);
        }
        // deterministic
        assert_eq!(
            halton_joint_positions(&limits, 7),
            halton_joint_positions(&limits, 7)
        );
    }
}
