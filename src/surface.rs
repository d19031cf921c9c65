//! Globe surface lifecycle.
//!
//! A surface is an owned handle: `OpenGlobe` creates it (once per camera), `CloseGlobe`
//! tears it down. Every deferred callback in the crate checks [`GlobeSurface::is_live`]
//! before touching it.

use std::f32::consts::FRAC_PI_2;

use bevy::math::DVec3;
use bevy::prelude::*;
use bevy::time::Real;
use bevy_panorbit_camera::PanOrbitCamera;

use crate::components::GlobeSurfaceLink;
use crate::components::MarkerSlot;
use crate::events::CloseGlobe;
use crate::events::GlobeOpened;
use crate::events::OpenGlobe;
use crate::flight::GlobeFlight;
use crate::framing::clip_planes;
use crate::geodesy::Ellipsoid;
use crate::geodesy::GeoPoint;
use crate::geodesy::ecef_to_scene;
use crate::tile_load::TileLoadConfig;
use crate::tile_load::TileLoadMonitor;
use crate::tile_load::on_tile_load_progress;

/// Environment variable read by [`GlobeConfig::from_env`].
pub const ACCESS_TOKEN_ENV_VAR: &str = "IMPACT_GLOBE_ACCESS_TOKEN";

/// Orbit pitch is kept this far from the poles so yaw stays meaningful.
const POLE_MARGIN_RAD: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum TerrainProvider {
    /// Streamed world terrain; needs an access token.
    WorldTerrain,
    /// Bare reference ellipsoid.
    Ellipsoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ImageryProvider {
    /// Token-authenticated imagery.
    Ion,
    /// Imagery that works without credentials.
    Default,
}

/// Camera view over a geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct GlobeView {
    pub center:      GeoPoint,
    pub altitude_km: f64,
}

impl Default for GlobeView {
    fn default() -> Self {
        Self {
            center:      GeoPoint::new(23.6, -102.0),
            altitude_km: 2000.0,
        }
    }
}

/// Globe setup. `units_per_meter` is the scene scale; the default makes one scene unit a
/// kilometre.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct GlobeConfig {
    pub access_token:    Option<String>,
    pub ellipsoid:       Ellipsoid,
    pub units_per_meter: f64,
    pub initial_view:    GlobeView,
    pub near_clip:       f32,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            access_token:    None,
            ellipsoid:       Ellipsoid::WGS84,
            units_per_meter: 1e-3,
            initial_view:    GlobeView::default(),
            near_clip:       0.1,
        }
    }
}

impl GlobeConfig {
    /// Default config with the access token taken from [`ACCESS_TOKEN_ENV_VAR`].
    pub fn from_env() -> Self {
        Self {
            access_token: std::env::var(ACCESS_TOKEN_ENV_VAR).ok(),
            ..default()
        }
    }

    /// Terrain and imagery for this config. Without a usable token both fall back to
    /// providers that need no credentials.
    pub fn providers(&self) -> (TerrainProvider, ImageryProvider) {
        match self.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => (TerrainProvider::WorldTerrain, ImageryProvider::Ion),
            _ => (TerrainProvider::Ellipsoid, ImageryProvider::Default),
        }
    }
}

/// Orbit parameters for a `PanOrbitCamera` centred on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OrbitView {
    pub focus:  Vec3,
    pub yaw:    f32,
    pub pitch:  f32,
    pub radius: f32,
}

impl OrbitView {
    /// Camera position this orbit resolves to (same convention as `PanOrbitCamera`).
    pub fn translation(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.focus
            + Vec3::new(
                self.radius * cos_pitch * sin_yaw,
                self.radius * sin_pitch,
                self.radius * cos_pitch * cos_yaw,
            )
    }
}

/// Handle for an open globe.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(Transform, MarkerSlot)]
pub struct GlobeSurface {
    pub camera:          Entity,
    pub ellipsoid:       Ellipsoid,
    pub units_per_meter: f64,
    pub terrain:         TerrainProvider,
    pub imagery:         ImageryProvider,
    live:                bool,
}

impl GlobeSurface {
    pub fn new(camera: Entity, config: &GlobeConfig) -> Self {
        let (terrain, imagery) = config.providers();
        Self {
            camera,
            ellipsoid: config.ellipsoid,
            units_per_meter: config.units_per_meter,
            terrain,
            imagery,
            live: true,
        }
    }

    pub const fn is_live(&self) -> bool { self.live }

    /// ECEF meters to the surface's local scene frame.
    pub fn scene_point(&self, ecef: DVec3) -> Vec3 {
        (ecef_to_scene(ecef) * self.units_per_meter).as_vec3()
    }

    /// Orbit looking straight down at `center` from `altitude_m` above the ellipsoid.
    ///
    /// Yaw follows longitude (offset by a quarter turn because the scene's +Z is ECEF -Y)
    /// and pitch follows latitude, clamped short of the poles.
    pub fn orbit_view(&self, center: GeoPoint, altitude_m: f64) -> OrbitView {
        let max_pitch = FRAC_PI_2 - POLE_MARGIN_RAD;
        let position = self.ellipsoid.to_cartesian(center, altitude_m);
        OrbitView {
            focus:  Vec3::ZERO,
            yaw:    center.longitude_rad() as f32 + FRAC_PI_2,
            pitch:  (center.latitude_rad() as f32).clamp(-max_pitch, max_pitch),
            radius: (position.length() * self.units_per_meter) as f32,
        }
    }
}

/// Observer for `OpenGlobe`: spawns the surface, its progress listener, and places the
/// camera at the initial view.
pub fn on_open_globe(
    open: On<OpenGlobe>,
    mut commands: Commands,
    config: Res<GlobeConfig>,
    tile_config: Res<TileLoadConfig>,
    real_time: Res<Time<Real>>,
    mut cameras: Query<(
        Option<&GlobeSurfaceLink>,
        &mut Transform,
        Option<&mut PanOrbitCamera>,
        Option<&mut Projection>,
    )>,
) {
    let camera_entity = open.camera_entity;
    let Ok((link, mut transform, pan_orbit, projection)) = cameras.get_mut(camera_entity) else {
        warn!("OpenGlobe: camera {camera_entity} has no Transform, ignoring");
        return;
    };
    if let Some(GlobeSurfaceLink(existing)) = link {
        debug!("OpenGlobe: camera {camera_entity} already views surface {existing}");
        return;
    }

    let surface = GlobeSurface::new(camera_entity, &config);
    if surface.terrain == TerrainProvider::Ellipsoid {
        warn!(
            "No access token in {ACCESS_TOKEN_ENV_VAR}; using ellipsoid terrain and default imagery"
        );
    }

    let initial = config.initial_view;
    let view = surface.orbit_view(initial.center, initial.altitude_km * 1000.0);

    let surface_entity = commands.spawn_empty().id();
    let listener = commands
        .spawn(Observer::new(on_tile_load_progress).with_entity(surface_entity))
        .id();
    let mut monitor = TileLoadMonitor::new(real_time.elapsed(), &tile_config);
    monitor.attach_listener(listener);

    commands
        .entity(surface_entity)
        .insert((surface, monitor, Name::new("Globe surface")));

    *transform = Transform::from_translation(view.translation()).looking_at(view.focus, Vec3::Y);
    if let Some(mut pan_orbit) = pan_orbit {
        pan_orbit.target_focus = view.focus;
        pan_orbit.target_yaw = view.yaw;
        pan_orbit.target_pitch = view.pitch;
        pan_orbit.target_radius = view.radius;
        pan_orbit.force_update = true;
    }
    if let Some(mut projection) = projection
        && let Projection::Perspective(perspective) = &mut *projection
    {
        perspective.near = config.near_clip;
        perspective.far = clip_planes(view.radius).1;
    }

    commands
        .entity(camera_entity)
        .insert(GlobeSurfaceLink(surface_entity));

    info!(
        "Opened globe surface {surface_entity} for camera {camera_entity} at lat {:.2} lon {:.2}, {} km",
        initial.center.latitude_deg, initial.center.longitude_deg, initial.altitude_km
    );

    commands.trigger(GlobeOpened {
        surface_entity,
        camera_entity,
    });
}

/// Observer for `CloseGlobe`. Idempotent: a surface that is already closing is left alone.
pub fn on_close_globe(
    close: On<CloseGlobe>,
    mut commands: Commands,
    mut surfaces: Query<(&mut GlobeSurface, &mut TileLoadMonitor, &mut MarkerSlot)>,
    links: Query<&GlobeSurfaceLink>,
) {
    let surface_entity = close.surface_entity;
    let Ok((mut surface, mut monitor, mut slot)) = surfaces.get_mut(surface_entity) else {
        return;
    };
    if !surface.live {
        return;
    }
    surface.live = false;

    if let Some(listener) = monitor.cancel() {
        commands.entity(listener).try_despawn();
    }
    if let Some(marker) = slot.0.take() {
        commands.entity(marker).try_despawn();
    }

    let camera_entity = surface.camera;
    if matches!(links.get(camera_entity), Ok(GlobeSurfaceLink(linked)) if *linked == surface_entity) {
        commands
            .entity(camera_entity)
            .try_remove::<(GlobeSurfaceLink, GlobeFlight)>();
    }

    commands.entity(surface_entity).despawn();
    info!("Closed globe surface {surface_entity}");
}
