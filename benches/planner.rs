use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra as na;
use ncollide3d::shape::{Compound, Cuboid, ShapeHandle};
use snap_planner::{SeededIkSolver, SnapPlannerBuilder, SnapPlannerWithIk};

fn obstacles() -> Compound<f64> {
    Compound::new(vec![(
        na::Isometry3::new(na::Vector3::new(2.0, 0.0, 0.0), na::zero()),
        ShapeHandle::new(Cuboid::new(na::Vector3::new(0.2, 0.4, 0.1))),
    )])
}

fn bench_snap_to_joint_positions(c: &mut Criterion) {
    let mut planner = SnapPlannerBuilder::try_from_urdf_file("sample.urdf")
        .unwrap()
        .finalize();
    let arm = planner.serial_chain("j6").unwrap();
    let obstacles = obstacles();
    let goal = vec![0.3, 0.5, -0.4, 0.2, 0.6, -0.1];
    c.bench_function("snap_to_joint_positions", |b| {
        b.iter(|| {
            arm.set_joint_positions(&[0.0; 6]).unwrap();
            planner
                .plan_to_joint_positions(&arm, &goal, &obstacles)
                .unwrap()
        })
    });
}

fn bench_snap_to_end_effector_pose(c: &mut Criterion) {
    let planner = SnapPlannerBuilder::try_from_urdf_file("sample.urdf")
        .unwrap()
        .finalize();
    let mut planner = SnapPlannerWithIk::new(
        planner,
        SeededIkSolver::new(snap_planner::JacobianIkSolver::default(), 16),
    );
    let arm = planner.planner.serial_chain("j6").unwrap();
    let obstacles = obstacles();

    arm.set_joint_positions(&[0.3, 0.5, -0.4, 0.2, 0.6, -0.1])
        .unwrap();
    let target_pose = arm.end_transform();
    let start = [0.2, 0.4, -0.3, 0.1, 0.5, 0.0];
    c.bench_function("snap_to_end_effector_pose", |b| {
        b.iter(|| {
            arm.set_joint_positions(&start).unwrap();
            planner
                .plan_to_end_effector_pose(&arm, &target_pose, &obstacles)
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_snap_to_joint_positions,
    bench_snap_to_end_effector_pose
);
criterion_main!(benches);
