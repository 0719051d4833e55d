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
use super::urdf::urdf_geometry_to_shape_handle;
use crate::errors::*;
use log::*;
use nalgebra as na;
use ncollide3d::{
    query,
    shape::{Compound, Shape, ShapeHandle},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt,
    ops::Deref,
    path::Path,
};

type NameShapeMap = HashMap<String, Vec<(ShapeHandle<f64>, na::Isometry3<f64>)>>;

/// Identifies the robot parts found colliding with the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionReport {
    /// joint names whose collision models hit the obstacle set
    pub joint_names: Vec<String>,
}

impl CollisionReport {
    pub fn is_empty(&self) -> bool {
        self.joint_names.is_empty()
    }
}

impl fmt::Display for CollisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.joint_names.join(", "))
    }
}

/// Identifies the pairs of robot parts found in self collision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfCollisionReport {
    pub pairs: Vec<(String, String)>,
}

impl SelfCollisionReport {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for SelfCollisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self
            .pairs
            .iter()
            .map(|(j1, j2)| format!("{} x {}", j1, j2))
            .collect::<Vec<_>>();
        write!(f, "[{}]", pairs.join(", "))
    }
}

#[derive(Clone)]
/// Collision checker for a robot
pub struct CollisionChecker {
    name_collision_model_map: NameShapeMap,
    /// margin length for collision check
    pub prediction: f64,
    active_joints: Option<HashSet<String>>,
}

impl CollisionChecker {
    /// Create CollisionChecker from HashMap
    pub fn new(name_collision_model_map: NameShapeMap, prediction: f64) -> Self {
        CollisionChecker {
            name_collision_model_map,
            prediction,
            active_joints: None,
        }
    }

    /// Create CollisionChecker from `urdf_rs::Robot`
    pub fn from_urdf_robot(urdf_robot: &urdf_rs::Robot, prediction: f64) -> Self {
        let mut name_collision_model_map = HashMap::new();
        let link_joint_map = k::urdf::link_to_joint_map(urdf_robot);
        for l in &urdf_robot.links {
            let col_pose_vec = l
                .collision
                .iter()
                .filter_map(|collision| {
                    urdf_geometry_to_shape_handle(&collision.geometry)
                        .map(|col| (col, k::urdf::isometry_from(&collision.origin)))
                })
                .collect::<Vec<_>>();
            debug!("name={}, ln={}", l.name, col_pose_vec.len());
            if !col_pose_vec.is_empty() {
                if let Some(joint_name) = link_joint_map.get(&l.name) {
                    name_collision_model_map.insert(joint_name.to_owned(), col_pose_vec);
                }
            }
        }
        Self::new(name_collision_model_map, prediction)
    }

    /// Restrict checks to `joints` until the returned scope is dropped.
    ///
    /// The previous restriction is restored on drop, whatever the exit path.
    pub fn scoped_active_joints<I>(&mut self, joints: I) -> ActiveJointScope<'_>
    where
        I: IntoIterator<Item = String>,
    {
        let saved = self
            .active_joints
            .replace(joints.into_iter().collect::<HashSet<_>>());
        ActiveJointScope {
            saved,
            checker: self,
        }
    }

    fn is_active(&self, joint_name: &str) -> bool {
        self.active_joints
            .as_ref()
            .map_or(true, |active| active.contains(joint_name))
    }

    /// Check if there are any colliding links
    pub fn has_any_colliding(
        &self,
        robot: &k::Chain<f64>,
        target_shape: &dyn Shape<f64>,
        target_pose: &na::Isometry3<f64>,
    ) -> bool {
        !self
            .colliding_link_names_with_first_return_flag(robot, target_shape, target_pose, true)
            .is_empty()
    }

    /// Returns the names which is colliding with the target shape/pose
    pub fn colliding_link_names(
        &self,
        robot: &k::Chain<f64>,
        target_shape: &dyn Shape<f64>,
        target_pose: &na::Isometry3<f64>,
    ) -> Vec<String> {
        self.colliding_link_names_with_first_return_flag(robot, target_shape, target_pose, false)
    }

    /// Check collision and return the names of the link(joint) names
    ///
    /// robot: robot model
    /// target_shape: Check collision with this shape and the robot
    /// target_pose: Check collision with this shape in this pose and the robot
    /// first_return: if true the function returns immediately when it found a collision.
    /// This flag is to make it fast.
    pub fn colliding_link_names_with_first_return_flag(
        &self,
        robot: &k::Chain<f64>,
        target_shape: &dyn Shape<f64>,
        target_pose: &na::Isometry3<f64>,
        first_return: bool,
    ) -> Vec<String> {
        let mut names = Vec::new();
        robot.update_transforms();
        for node in robot.iter() {
            let trans = node.world_transform().unwrap();
            let joint = node.joint();
            let joint_name = &joint.name;
            if !self.is_active(joint_name) {
                continue;
            }
            match self.name_collision_model_map.get(joint_name) {
                Some(obj_vec) => {
                    for obj in obj_vec {
                        // proximity and prediction does not work for meshes.
                        let dist =
                            query::distance(&(trans * obj.1), &*obj.0, target_pose, target_shape);
                        if dist < self.prediction {
                            debug!("name: {}, dist={}", joint_name, dist);
                            names.push(joint_name.to_owned());
                            if first_return {
                                return names;
                            } else {
                                break;
                            }
                        }
                    }
                }
                None => {
                    debug!("collision model {} not found", joint_name);
                }
            }
        }
        names
    }

    /// Check the robot against every obstacle in `objects`, stopping at the
    /// first collision.
    pub fn has_environment_collision(
        &self,
        robot: &k::Chain<f64>,
        objects: &Compound<f64>,
    ) -> bool {
        objects
            .shapes()
            .iter()
            .any(|shape| self.has_any_colliding(robot, &*shape.1, &shape.0))
    }

    /// Report of the robot parts colliding with `objects`; empty when free.
    pub fn environment_collision_report(
        &self,
        robot: &k::Chain<f64>,
        objects: &Compound<f64>,
    ) -> CollisionReport {
        for shape in objects.shapes() {
            let joint_names = self.colliding_link_names(robot, &*shape.1, &shape.0);
            if !joint_names.is_empty() {
                return CollisionReport { joint_names };
            }
        }
        CollisionReport::default()
    }

    /// Check if there are any self colliding links
    pub fn has_self_collision(
        &self,
        collision_check_robot: &k::Chain<f64>,
        self_collision_pairs: &[(String, String)],
    ) -> Result<bool> {
        Ok(!self
            .self_colliding_pairs_with_first_return_flag(
                collision_check_robot,
                self_collision_pairs,
                true,
            )?
            .is_empty())
    }

    /// Report of the first self colliding pair; empty when free.
    pub fn self_collision_report(
        &self,
        collision_check_robot: &k::Chain<f64>,
        self_collision_pairs: &[(String, String)],
    ) -> Result<SelfCollisionReport> {
        Ok(SelfCollisionReport {
            pairs: self.self_colliding_pairs_with_first_return_flag(
                collision_check_robot,
                self_collision_pairs,
                true,
            )?,
        })
    }

    /// Check self collision and return the colliding pairs of link(joint) names
    ///
    /// collision_check_robot: robot model
    /// self_collision_pairs: pairs of the names of the link(joint)
    /// first_return: if true the function returns immediately when it found a collision.
    /// This flag is to make it fast.
    pub fn self_colliding_pairs_with_first_return_flag(
        &self,
        collision_check_robot: &k::Chain<f64>,
        self_collision_pairs: &[(String, String)],
        first_return: bool,
    ) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        collision_check_robot.update_transforms();
        for (j1, j2) in self_collision_pairs {
            if !self.is_active(j1) && !self.is_active(j2) {
                continue;
            }
            let obj_vec1 = match self.name_collision_model_map.get(j1) {
                Some(obj_vec) => obj_vec,
                None => continue,
            };
            let obj_vec2 = match self.name_collision_model_map.get(j2) {
                Some(obj_vec) => obj_vec,
                None => continue,
            };
            let node1 = collision_check_robot
                .find(j1)
                .ok_or_else(|| Error::JointNotFound {
                    joint_name: j1.to_owned(),
                })?;
            let node2 = collision_check_robot
                .find(j2)
                .ok_or_else(|| Error::JointNotFound {
                    joint_name: j2.to_owned(),
                })?;
            let trans1 = node1.world_transform().unwrap();
            let trans2 = node2.world_transform().unwrap();
            'models: for obj1 in obj_vec1 {
                for obj2 in obj_vec2 {
                    // proximity and predict does not work correctly for mesh
                    let dist = query::distance(
                        &(trans1 * obj1.1),
                        &*obj1.0,
                        &(trans2 * obj2.1),
                        &*obj2.0,
                    );
                    if dist < self.prediction {
                        debug!("name: {}, name: {} dist={}", j1, j2, dist);
                        pairs.push((j1.to_owned(), j2.to_owned()));
                        if first_return {
                            return Ok(pairs);
                        }
                        break 'models;
                    }
                }
            }
        }
        Ok(pairs)
    }
}

/// Scopes collision checking to a set of joints, restoring the checker when
/// dropped.
pub struct ActiveJointScope<'a> {
    checker: &'a mut CollisionChecker,
    saved: Option<HashSet<String>>,
}

impl<'a> Deref for ActiveJointScope<'a> {
    type Target = CollisionChecker;

    fn deref(&self) -> &CollisionChecker {
        self.checker
    }
}

impl<'a> Drop for ActiveJointScope<'a> {
    fn drop(&mut self) {
        self.checker.active_joints = self.saved.take();
    }
}

pub trait FromUrdf {
    fn from_urdf_robot(robot: &urdf_rs::Robot) -> Self;
    fn from_urdf_file<P>(path: P) -> Result<Self>
    where
        Self: Sized,
        P: AsRef<Path>,
    {
        Ok(Self::from_urdf_robot(&urdf_rs::read_file(path)?))
    }
}

/// Create `ncollide3d::shape::Compound` from URDF file
///
/// The `<link>` elements are used as obstacles. set the origin/geometry of
/// `<visual>` and `<collision>`. You can skip `<inertia>`.
impl FromUrdf for Compound<f64> {
    fn from_urdf_robot(urdf_obstacle: &urdf_rs::Robot) -> Self {
        let compound_data = urdf_obstacle
            .links
            .iter()
            .flat_map(|l| {
                l.collision
                    .iter()
                    .filter_map(|collision| {
                        urdf_geometry_to_shape_handle(&collision.geometry)
                            .map(|col| (k::urdf::isometry_from(&collision.origin), col))
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        Compound::new(compound_data)
    }
}

pub fn parse_colon_separated_pairs(pair_strs: &[String]) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for pair_str in pair_strs {
        let mut sp = pair_str.split(':');
        if let Some(p1) = sp.next() {
            if let Some(p2) = sp.next() {
                pairs.push((p1.to_owned(), p2.to_owned()));
            } else {
                return Err(format!("failed to parse {}", pair_str).into());
            }
        } else {
            return Err(format!("failed to parse {}", pair_str).into());
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Isometry3, Vector3};
    use ncollide3d::shape::Cuboid;

    fn sample_robot() -> (urdf_rs::Robot, k::Chain<f64>) {
        let urdf_robot = urdf_rs::read_file("sample.urdf").unwrap();
        let robot = k::Chain::<f64>::from(&urdf_robot);
        (urdf_robot, robot)
    }

    #[test]
    fn test_parse_colon_separated_pairs() {
        let pairs =
            parse_colon_separated_pairs(&["j0:j1".to_owned(), "j2:j0".to_owned()]).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "j0");
        assert_eq!(pairs[0].1, "j1");
        assert_eq!(pairs[1].0, "j2");
        assert_eq!(pairs[1].1, "j0");
        assert!(parse_colon_separated_pairs(&["j0".to_owned()]).is_err());
    }

    #[test]
    fn overlapping_cuboid_collides_with_arm_links() {
        let (urdf_robot, robot) = sample_robot();
        let checker = CollisionChecker::from_urdf_robot(&urdf_robot, 0.01);

        let target = Cuboid::new(Vector3::new(0.1, 0.1, 0.1));
        let near = Isometry3::new(Vector3::new(0.0, 0.0, 0.26), nalgebra::zero());
        let names = checker.colliding_link_names(&robot, &target, &near);
        assert_eq!(names, vec!["j2".to_owned(), "j3".to_owned()]);

        let far = Isometry3::new(Vector3::new(5.0, 0.0, 0.0), nalgebra::zero());
        assert!(checker
            .colliding_link_names(&robot, &target, &far)
            .is_empty());
    }

    #[test]
    fn folded_arm_self_collides_on_configured_pair() {
        let (urdf_robot, robot) = sample_robot();
        let checker = CollisionChecker::from_urdf_robot(&urdf_robot, 0.01);
        let pairs = vec![("j1".to_owned(), "j2".to_owned())];

        robot.set_joint_positions(&[0.0; 6]).unwrap();
        assert!(!checker.has_self_collision(&robot, &pairs).unwrap());

        robot
            .set_joint_positions(&[0.0, -3.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        assert!(checker.has_self_collision(&robot, &pairs).unwrap());
        let report = checker.self_collision_report(&robot, &pairs).unwrap();
        assert_eq!(report.pairs, pairs);
    }

    #[test]
    fn active_joint_scope_filters_and_restores() {
        let (urdf_robot, robot) = sample_robot();
        let mut checker = CollisionChecker::from_urdf_robot(&urdf_robot, 0.01);

        let target = Cuboid::new(Vector3::new(0.1, 0.1, 0.1));
        let near = Isometry3::new(Vector3::new(0.0, 0.0, 0.26), nalgebra::zero());
        {
            let scope = checker.scoped_active_joints(vec!["j5".to_owned()]);
            assert!(scope.colliding_link_names(&robot, &target, &near).is_empty());
        }
        assert!(!checker
            .colliding_link_names(&robot, &target, &near)
            .is_empty());
    }

    #[test]
    fn obstacle_compound_from_urdf() {
        let compound = Compound::<f64>::from_urdf_file("sample.urdf").unwrap();
        // one collision model per link in the fixture
        assert_eq!(compound.shapes().len(), 7);
    }
}
