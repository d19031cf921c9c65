//! Projectile fly-in.
//!
//! An armed projectile travels from the configured start to end point along an ease-out
//! path. Its duration shrinks with speed and its visual size grows with diameter. Heat and
//! tail appearance ramp with raw progress. `TrajectoryEnd` fires once per arming.

use bevy::math::curve::Curve;
use bevy::math::curve::easing::EaseFunction;
use bevy::prelude::*;

use crate::events::ArmTrajectory;
use crate::events::DisarmTrajectory;
use crate::events::TrajectoryEnd;

/// Calibration for duration, size and path. Tuned by eye.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct TrajectoryConfig {
    pub base_duration_secs:  f32,
    pub reference_speed_kms: f32,
    pub min_speed_factor:    f32,
    pub max_speed_factor:    f32,
    /// Diameter (km) that maps to a visual size of 1.
    pub size_divisor_km:     f32,
    pub min_size:            f32,
    pub max_size:            f32,
    pub start:               Vec3,
    pub end:                 Vec3,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            base_duration_secs:  2.8,
            reference_speed_kms: 25.0,
            min_speed_factor:    0.6,
            max_speed_factor:    1.8,
            size_divisor_km:     1.5,
            min_size:            0.05,
            max_size:            0.8,
            start:               Vec3::new(-4.2, 2.9, 0.0),
            end:                 Vec3::new(0.2, -2.5, -0.5),
        }
    }
}

impl TrajectoryConfig {
    /// Flight time in seconds. Speeds below 1 km/s count as 1.
    pub fn duration_secs(&self, velocity_kms: f32) -> f32 {
        let factor = (self.reference_speed_kms / velocity_kms.max(1.0))
            .clamp(self.min_speed_factor, self.max_speed_factor);
        self.base_duration_secs * factor
    }

    pub fn visual_size(&self, diameter_km: f32) -> f32 {
        (diameter_km / self.size_divisor_km).clamp(self.min_size, self.max_size)
    }
}

/// Per-arming progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect)]
pub struct ProjectileState {
    pub start_time: Option<f64>,
    pub progress:   f64,
    pub finished:   bool,
}

/// Material-facing appearance derived from progress. The host maps these onto its own
/// materials; `hue` is an HSL hue in [0, 1].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ProjectileAppearance {
    pub heat:         f32,
    pub hue:          f32,
    pub tail_scale:   f32,
    pub tail_opacity: f32,
}

impl Default for ProjectileAppearance {
    fn default() -> Self { Self::at(0.0) }
}

impl ProjectileAppearance {
    pub fn at(t: f32) -> Self {
        Self {
            heat:         1.1f32.mul_add(t, 0.5),
            hue:          0.08f32.mul_add(t, 0.04),
            tail_scale:   (-0.8f32).mul_add(t, 1.4),
            tail_opacity: (-0.65f32).mul_add(t, 0.85),
        }
    }
}

/// One frame of an active trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySample {
    pub position:   Vec3,
    pub rotation:   Quat,
    /// Normalized travel direction.
    pub direction:  Vec3,
    pub progress:   f32,
    pub appearance: ProjectileAppearance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrajectoryStep {
    /// Disarmed or already finished.
    Idle,
    Moving(TrajectorySample),
    /// The frame progress reached 1. Returned once per arming.
    Finished,
}

/// Drives one projectile entity. `Transform` scale is the visual size.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(Transform, ProjectileAppearance)]
pub struct TrajectoryAnimator {
    armed:         bool,
    state:         ProjectileState,
    duration_secs: f32,
    size:          f32,
    start:         Vec3,
    end:           Vec3,
}

impl TrajectoryAnimator {
    /// Armed animator; the clock starts on the first advanced frame.
    pub fn armed(config: &TrajectoryConfig, diameter_km: f32, velocity_kms: f32) -> Self {
        Self {
            armed:         true,
            state:         ProjectileState::default(),
            duration_secs: config.duration_secs(velocity_kms),
            size:          config.visual_size(diameter_km),
            start:         config.start,
            end:           config.end,
        }
    }

    pub fn rearm(&mut self, config: &TrajectoryConfig, diameter_km: f32, velocity_kms: f32) {
        *self = Self::armed(config, diameter_km, velocity_kms);
    }

    pub const fn disarm(&mut self) { self.armed = false; }

    pub const fn is_armed(&self) -> bool { self.armed }

    pub const fn state(&self) -> ProjectileState { self.state }

    pub const fn duration_secs(&self) -> f32 { self.duration_secs }

    pub const fn size(&self) -> f32 { self.size }

    /// Normalized start-to-end direction, or `None` for a degenerate path.
    pub fn direction(&self) -> Option<Vec3> { (self.end - self.start).try_normalize() }

    pub fn advance(&mut self, now_secs: f64) -> TrajectoryStep {
        if !self.armed || self.state.finished {
            return TrajectoryStep::Idle;
        }
        let start_time = *self.state.start_time.get_or_insert(now_secs);
        let t = if self.duration_secs > 0.0 {
            (now_secs - start_time) / f64::from(self.duration_secs)
        } else {
            1.0
        };

        if t >= 1.0 {
            self.state.progress = 1.0;
            self.state.finished = true;
            return TrajectoryStep::Finished;
        }

        let t = t.max(self.state.progress);
        self.state.progress = t;
        let t = t as f32;

        let eased = EaseFunction::CubicOut.sample_unchecked(t);
        let direction = self.direction().unwrap_or(Vec3::NEG_Y);
        TrajectoryStep::Moving(TrajectorySample {
            position: self.start.lerp(self.end, eased),
            rotation: Quat::from_rotation_arc(Vec3::Y, direction),
            direction,
            progress: t,
            appearance: ProjectileAppearance::at(t),
        })
    }
}

pub fn on_arm_trajectory(
    arm: On<ArmTrajectory>,
    mut commands: Commands,
    config: Res<TrajectoryConfig>,
    mut projectiles: Query<Option<&mut TrajectoryAnimator>>,
) {
    let entity = arm.projectile_entity;
    let Ok(animator) = projectiles.get_mut(entity) else {
        warn!("ArmTrajectory: projectile {entity} does not exist, ignoring");
        return;
    };
    if let Some(mut animator) = animator {
        animator.rearm(&config, arm.diameter_km, arm.velocity_kms);
    } else {
        commands.entity(entity).try_insert(TrajectoryAnimator::armed(
            &config,
            arm.diameter_km,
            arm.velocity_kms,
        ));
    }
    debug!(
        "Armed projectile {entity}: {} km at {} km/s, {:.2}s",
        arm.diameter_km,
        arm.velocity_kms,
        config.duration_secs(arm.velocity_kms)
    );
}

pub fn on_disarm_trajectory(
    disarm: On<DisarmTrajectory>,
    mut animators: Query<&mut TrajectoryAnimator>,
) {
    if let Ok(mut animator) = animators.get_mut(disarm.projectile_entity) {
        animator.disarm();
    }
}

pub fn advance_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut projectiles: Query<(
        Entity,
        &mut TrajectoryAnimator,
        &mut Transform,
        &mut ProjectileAppearance,
    )>,
) {
    let now = time.elapsed_secs_f64();
    for (entity, mut animator, mut transform, mut appearance) in &mut projectiles {
        match animator.advance(now) {
            TrajectoryStep::Idle => {},
            TrajectoryStep::Moving(sample) => {
                transform.translation = sample.position;
                transform.rotation = sample.rotation;
                transform.scale = Vec3::splat(animator.size());
                *appearance = sample.appearance;
            },
            TrajectoryStep::Finished => {
                info!("Projectile {entity} reached the end of its trajectory");
                commands.trigger(TrajectoryEnd {
                    projectile_entity: entity,
                });
            },
        }
    }
}
