//! Camera flights over the globe.
//!
//! `ShowFootprint` stores the footprint on the surface and flies the surface's
//! `PanOrbitCamera` to an orbit above it. A flight interpolates focus, radius, yaw and pitch
//! with an easing curve over a fixed duration.

use std::f32::consts::PI;
use std::f32::consts::TAU;

use bevy::math::curve::Curve;
use bevy::math::curve::easing::EaseFunction;
use bevy::prelude::*;
use bevy_panorbit_camera::PanOrbitCamera;

use crate::components::FootprintOverlay;
use crate::events::FlightBegin;
use crate::events::FlightEnd;
use crate::events::ShowFootprint;
use crate::footprint::DEFAULT_SEGMENTS;
use crate::footprint::FootprintSpec;
use crate::footprint::build_footprint;
use crate::framing::FRAMING_SAFETY;
use crate::framing::PerspectiveParams;
use crate::framing::required_distance;
use crate::smoothness::SmoothnessStash;
use crate::surface::GlobeSurface;
use crate::surface::OrbitView;

#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct FlightConfig {
    pub duration_ms:        f32,
    pub easing:             EaseFunction,
    /// Ring resolution for footprints shown through `ShowFootprint`.
    pub footprint_segments: u32,
    /// Projection assumed when the camera has no perspective projection.
    pub fallback_fov_rad:   f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            duration_ms:        1500.0,
            easing:             EaseFunction::CubicInOut,
            footprint_segments: DEFAULT_SEGMENTS,
            fallback_fov_rad:   PI / 4.0,
        }
    }
}

/// Where a flight ends up.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct FlightPlan {
    pub target:      OrbitView,
    pub duration_ms: f32,
    pub easing:      EaseFunction,
}

#[derive(Clone, Copy, Reflect, Default, Debug)]
enum FlightState {
    InProgress {
        elapsed_ms:   f32,
        start_focus:  Vec3,
        start_yaw:    f32,
        start_pitch:  f32,
        start_radius: f32,
    },
    #[default]
    Ready,
}

/// An in-flight camera move. Removed when the destination is reached.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct GlobeFlight {
    pub plan: FlightPlan,
    state:    FlightState,
}

impl GlobeFlight {
    pub const fn new(plan: FlightPlan) -> Self {
        Self {
            plan,
            state: FlightState::Ready,
        }
    }
}

/// Shortest signed angle from `from` to `to`, in [-π, π).
fn unwrapped_delta(from: f32, to: f32) -> f32 {
    let diff = to - from;
    TAU.mul_add(-((diff + PI) / TAU).floor(), diff)
}

/// Orbit that frames a footprint of `radius_km` around `center` on `surface`.
pub fn footprint_view(
    surface: &GlobeSurface,
    spec: &FootprintSpec,
    params: PerspectiveParams,
) -> OrbitView {
    let radius_scene = (spec.radius_km() * 1000.0 * surface.units_per_meter) as f32;
    let fit = required_distance(params, radius_scene, radius_scene) * FRAMING_SAFETY;
    surface.orbit_view(spec.center(), f64::from(fit) / surface.units_per_meter)
}

/// Observer for `ShowFootprint`: replaces the surface's footprint and flies its camera over
/// it.
pub fn on_show_footprint(
    show: On<ShowFootprint>,
    mut commands: Commands,
    config: Res<FlightConfig>,
    surfaces: Query<&GlobeSurface>,
    cameras: Query<Option<&Projection>, With<PanOrbitCamera>>,
) {
    let surface_entity = show.surface_entity;
    let Ok(surface) = surfaces.get(surface_entity) else {
        return;
    };
    if !surface.is_live() {
        return;
    }

    let spec = match FootprintSpec::new(show.center, show.radius_km, config.footprint_segments) {
        Ok(spec) => spec,
        Err(error) => {
            warn!("ShowFootprint on surface {surface_entity} rejected: {error}");
            return;
        },
    };

    commands.entity(surface_entity).insert(FootprintOverlay {
        center:     spec.center(),
        radius_km:  spec.radius_km(),
        collection: build_footprint(&spec),
    });
    info!(
        "Footprint of {} km at lat {:.4} lon {:.4} on surface {surface_entity}",
        spec.radius_km(),
        spec.center().latitude_deg,
        spec.center().longitude_deg
    );

    let camera_entity = surface.camera;
    let Ok(projection) = cameras.get(camera_entity) else {
        debug!("Surface {surface_entity} camera {camera_entity} has no PanOrbitCamera, not flying");
        return;
    };

    let params = match projection {
        Some(Projection::Perspective(perspective)) => PerspectiveParams::from_projection(perspective),
        _ => PerspectiveParams::new(config.fallback_fov_rad, 1.0),
    };

    let plan = FlightPlan {
        target:      footprint_view(surface, &spec, params),
        duration_ms: config.duration_ms,
        easing:      config.easing,
    };

    commands.entity(camera_entity).insert(GlobeFlight::new(plan));
}

/// Advances every active flight. The first frame captures the start parameters; the final
/// frame lands exactly on the target and removes the flight.
pub fn advance_globe_flights(
    mut commands: Commands,
    time: Res<Time>,
    mut cameras: Query<(
        Entity,
        &mut PanOrbitCamera,
        &mut GlobeFlight,
        Has<SmoothnessStash>,
    )>,
) {
    for (entity, mut pan_orbit, mut flight, stashed) in &mut cameras {
        let plan = flight.plan;
        match &mut flight.state {
            FlightState::Ready => {
                // A stash already present holds the host's values (earlier flight or rig).
                if stashed {
                    pan_orbit.zoom_smoothness = 0.0;
                    pan_orbit.pan_smoothness = 0.0;
                    pan_orbit.orbit_smoothness = 0.0;
                } else {
                    let stash = SmoothnessStash::take_from(&mut pan_orbit);
                    commands.entity(entity).insert(stash);
                }

                flight.state = FlightState::InProgress {
                    elapsed_ms:   0.0,
                    start_focus:  pan_orbit.target_focus,
                    start_yaw:    pan_orbit.target_yaw,
                    start_pitch:  pan_orbit.target_pitch,
                    start_radius: pan_orbit.target_radius,
                };
                commands.trigger(FlightBegin {
                    camera_entity: entity,
                });
            },
            FlightState::InProgress {
                elapsed_ms,
                start_focus,
                start_yaw,
                start_pitch,
                start_radius,
            } => {
                *elapsed_ms += time.delta_secs() * 1000.0;
                let t = if plan.duration_ms > 0.0 {
                    (*elapsed_ms / plan.duration_ms).min(1.0)
                } else {
                    1.0
                };
                let eased = plan.easing.sample_unchecked(t);
                let target = plan.target;

                let yaw_diff = unwrapped_delta(*start_yaw, target.yaw);
                let pitch_diff = target.pitch - *start_pitch;

                pan_orbit.target_focus = start_focus.lerp(target.focus, eased);
                pan_orbit.target_radius = (target.radius - *start_radius).mul_add(eased, *start_radius);
                pan_orbit.target_yaw = yaw_diff.mul_add(eased, *start_yaw);
                pan_orbit.target_pitch = pitch_diff.mul_add(eased, *start_pitch);
                pan_orbit.force_update = true;

                if t >= 1.0 {
                    // Remove before triggering so an observer can start the next flight.
                    commands.entity(entity).remove::<GlobeFlight>();
                    commands.trigger(FlightEnd {
                        camera_entity: entity,
                    });
                }
            },
        }
    }
}
