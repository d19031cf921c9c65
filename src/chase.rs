//! Camera that follows a projectile from behind.
//!
//! The camera sits `min_clearance` behind the projectile along its travel direction plus a
//! cinematic offset. It must never end up ahead of the projectile, where the view ray would
//! pass through it. The offset is dropped for any frame it would put the camera ahead. A
//! final guard re-places the camera if the damped move still lands ahead.

use bevy::prelude::*;

use crate::framing::damping_factor;
use crate::trajectory::TrajectoryAnimator;

#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct ChaseCameraConfig {
    /// Clearance per unit of projectile scale.
    pub clearance_per_scale: f32,
    /// Absolute clearance floor.
    pub min_clearance:       f32,
    pub cinematic_offset:    Vec3,
    pub damping_rate:        f32,
}

impl Default for ChaseCameraConfig {
    fn default() -> Self {
        Self {
            clearance_per_scale: 6.0,
            min_clearance:       1.5,
            cinematic_offset:    Vec3::new(0.0, 1.0, 2.5),
            damping_rate:        3.0,
        }
    }
}

impl ChaseCameraConfig {
    pub fn clearance_for(&self, scale: f32) -> f32 {
        (scale * self.clearance_per_scale).max(self.min_clearance)
    }
}

/// Follows the projectile entity `target`.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct ChaseCamera {
    pub target: Entity,
    settled:    bool,
}

impl ChaseCamera {
    pub const fn new(target: Entity) -> Self {
        Self {
            target,
            settled: false,
        }
    }
}

/// How far `camera` is ahead of `object` along `direction`. Positive means ahead.
pub fn ahead_distance(camera: Vec3, object: Vec3, direction: Vec3) -> f32 {
    (camera - object).dot(direction)
}

/// Desired camera position: behind the object by `clearance` plus `offset`, or without
/// the offset if it would put the camera ahead.
pub fn desired_chase_position(object: Vec3, direction: Vec3, clearance: f32, offset: Vec3) -> Vec3 {
    let behind = object - direction * clearance;
    let framed = behind + offset;
    if ahead_distance(framed, object, direction) > 0.0 {
        behind
    } else {
        framed
    }
}

/// Final guard: keeps `camera` unless it is ahead of the object.
pub fn keep_behind(camera: Vec3, object: Vec3, direction: Vec3, clearance: f32) -> Vec3 {
    if ahead_distance(camera, object, direction) > 0.0 {
        object - direction * clearance
    } else {
        camera
    }
}

pub fn follow_projectiles(
    time: Res<Time>,
    config: Res<ChaseCameraConfig>,
    mut cameras: Query<(&mut ChaseCamera, &mut Transform), Without<TrajectoryAnimator>>,
    targets: Query<(&Transform, &TrajectoryAnimator)>,
) {
    let factor = damping_factor(config.damping_rate, time.delta_secs());

    for (mut chase, mut transform) in &mut cameras {
        let Ok((target_transform, animator)) = targets.get(chase.target) else {
            continue;
        };
        if !animator.is_armed() {
            continue;
        }
        let Some(direction) = animator.direction() else {
            continue;
        };

        let object = target_transform.translation;
        let clearance = config.clearance_for(animator.size());
        let desired = desired_chase_position(object, direction, clearance, config.cinematic_offset);

        let position = if chase.settled {
            transform.translation.lerp(desired, factor)
        } else {
            chase.settled = true;
            desired
        };

        transform.translation = keep_behind(position, object, direction, clearance);
        transform.look_at(object, Vec3::Y);
    }
}
