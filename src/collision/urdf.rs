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
use log::*;
use nalgebra as na;
use ncollide3d::shape::{Ball, Compound, Cuboid, Cylinder, ShapeHandle};
use std::f64::consts::FRAC_PI_2;

/// Convert a URDF collision geometry into an `ncollide3d` shape handle.
///
/// Mesh geometry is skipped with a warning: snap planning only carries the
/// primitive shapes, so no mesh importer is linked in.
pub fn urdf_geometry_to_shape_handle(
    collision_geometry: &urdf_rs::Geometry,
) -> Option<ShapeHandle<f64>> {
    match *collision_geometry {
        urdf_rs::Geometry::Box { ref size } => {
            let cube = Cuboid::new(na::Vector3::new(
                size[0] * 0.5,
                size[1] * 0.5,
                size[2] * 0.5,
            ));
            Some(ShapeHandle::new(cube))
        }
        urdf_rs::Geometry::Cylinder { radius, length } => {
            // ncollide cylinders are y-up, URDF cylinders are z-up
            let y_cylinder = Cylinder::new(length * 0.5, radius);
            let z_up = na::Isometry3::from_parts(
                na::Translation3::new(0.0, 0.0, 0.0),
                na::UnitQuaternion::from_euler_angles(FRAC_PI_2, 0.0, 0.0),
            );
            Some(ShapeHandle::new(Compound::new(vec![(
                z_up,
                ShapeHandle::new(y_cylinder),
            )])))
        }
        urdf_rs::Geometry::Sphere { radius } => Some(ShapeHandle::new(Ball::new(radius))),
        ref unsupported => {
            warn!(
                "unsupported collision geometry {:?}: skipping",
                unsupported
            );
            None
        }
    }
}
