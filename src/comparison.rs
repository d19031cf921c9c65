//! Size comparison scene: a user-sized meteor next to a fixed reference body, framed by a
//! `PanOrbitCamera` that pulls back smoothly as the meteor grows.

use bevy::prelude::*;
use bevy_panorbit_camera::PanOrbitCamera;

use crate::framing::ComparisonLayout;
use crate::framing::PerspectiveParams;
use crate::framing::clip_planes;
use crate::framing::damping_factor;
use crate::framing::label_clearance;

/// Radius floor so a zero diameter still yields a valid scene.
const MIN_SUBJECT_RADIUS: f32 = 1e-6;

#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct FramingConfig {
    /// Primary radius at which framing starts including the reference body.
    pub blend_low:             f32,
    /// Primary radius at which both bodies are fully framed.
    pub blend_high:            f32,
    /// Exponential approach rate for camera radius and focus, per second.
    pub damping_rate:          f32,
    /// Chicxulub impactor by default.
    pub reference_diameter_km: f32,
    pub reference_label:       String,
    pub fallback_fov_rad:      f32,
    pub fallback_aspect:       f32,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            blend_low:             5.0,
            blend_high:            10.0,
            damping_rate:          3.0,
            reference_diameter_km: 10.0,
            reference_label:       "Chicxulub impactor (≈10 km)".to_owned(),
            fallback_fov_rad:      60.0_f32.to_radians(),
            fallback_aspect:       16.0 / 9.0,
        }
    }
}

/// Drives a `PanOrbitCamera` to frame a meteor of `diameter_km` next to the reference body.
/// The host updates `diameter_km` and `velocity_kms`; everything else follows.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct ComparisonRig {
    pub primary:      Entity,
    pub reference:    Entity,
    pub diameter_km:  f32,
    pub velocity_kms: f32,
    settled:          bool,
}

impl ComparisonRig {
    pub const fn new(primary: Entity, reference: Entity, diameter_km: f32, velocity_kms: f32) -> Self {
        Self {
            primary,
            reference,
            diameter_km,
            velocity_kms,
            settled: false,
        }
    }

    pub fn primary_radius(&self) -> f32 { (self.diameter_km * 0.5).max(MIN_SUBJECT_RADIUS) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum SubjectRole {
    Primary,
    Reference,
}

/// Label data for a comparison subject. The host renders `label` at `label_height` above
/// the subject's center.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct ComparisonSubject {
    pub role:         SubjectRole,
    pub label:        String,
    pub label_height: f32,
}

/// Continuous rotation in radians per second, applied about local Y then local X.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct Spin {
    pub yaw_rate:   f32,
    pub pitch_rate: f32,
}

impl Spin {
    /// Tumble of the user's meteor; faster meteors spin faster.
    pub fn meteor(velocity_kms: f32) -> Self {
        let rate = 0.02f32.mul_add(velocity_kms, 0.25);
        Self {
            yaw_rate:   rate,
            pitch_rate: rate * 0.35,
        }
    }

    /// Slow turn of the reference body.
    pub fn reference(velocity_kms: f32) -> Self {
        Self {
            yaw_rate:   0.01f32.mul_add(velocity_kms, 0.15),
            pitch_rate: 0.0,
        }
    }
}

/// Per-frame comparison framing. Layout and blend are recomputed from the current diameter
/// every frame; only the camera approaches its target over time.
pub fn update_comparison_rigs(
    time: Res<Time>,
    config: Res<FramingConfig>,
    mut rigs: Query<(&mut ComparisonRig, &mut PanOrbitCamera, Option<&mut Projection>)>,
    mut subjects: Query<
        (&mut Transform, Option<&mut Spin>, Option<&mut ComparisonSubject>),
        Without<ComparisonRig>,
    >,
) {
    let factor = damping_factor(config.damping_rate, time.delta_secs());

    for (mut rig, mut pan_orbit, projection) in &mut rigs {
        let primary_radius = rig.primary_radius();
        let reference_radius = (config.reference_diameter_km * 0.5).max(MIN_SUBJECT_RADIUS);
        let layout =
            ComparisonLayout::new(primary_radius, reference_radius, config.blend_low, config.blend_high);

        let params = match projection.as_deref() {
            Some(Projection::Perspective(perspective)) => PerspectiveParams::from_projection(perspective),
            _ => PerspectiveParams::new(config.fallback_fov_rad, config.fallback_aspect),
        };
        let distance = layout.fit_distance(params);
        let focus = layout.focus();

        if rig.settled {
            let radius = pan_orbit.target_radius;
            pan_orbit.target_radius = (distance - radius).mul_add(factor, radius);
            pan_orbit.target_focus = pan_orbit.target_focus.lerp(focus, factor);
        } else {
            pan_orbit.target_radius = distance;
            pan_orbit.target_focus = focus;
            rig.settled = true;
        }
        pan_orbit.force_update = true;

        if let Some(mut projection) = projection
            && let Projection::Perspective(perspective) = &mut *projection
        {
            let (near, far) = clip_planes(distance);
            perspective.near = near;
            perspective.far = far;
        }

        if let Ok((mut transform, spin, subject)) = subjects.get_mut(rig.primary) {
            transform.translation = Vec3::ZERO;
            transform.scale = Vec3::splat(primary_radius);
            if let Some(mut spin) = spin {
                *spin = Spin::meteor(rig.velocity_kms);
            }
            if let Some(mut subject) = subject {
                subject.label = format!("Custom meteor ({:.1} km)", rig.diameter_km);
                subject.label_height = primary_radius + label_clearance(primary_radius);
            }
        }

        if let Ok((mut transform, spin, subject)) = subjects.get_mut(rig.reference) {
            transform.translation = layout.reference_position();
            transform.scale = Vec3::splat(reference_radius);
            if let Some(mut spin) = spin {
                *spin = Spin::reference(rig.velocity_kms);
            }
            if let Some(mut subject) = subject {
                subject.label.clone_from(&config.reference_label);
                subject.label_height = reference_radius + label_clearance(reference_radius);
            }
        }
    }
}

pub fn spin_subjects(time: Res<Time>, mut spinning: Query<(&Spin, &mut Transform)>) {
    let dt = time.delta_secs();
    for (spin, mut transform) in &mut spinning {
        transform.rotate_local_y(spin.yaw_rate * dt);
        transform.rotate_local_x(spin.pitch_rate * dt);
    }
}
