//! Gizmo overlay for footprints and pick markers.
//!
//! Draws the footprint ring, its epicenter and the pick marker of every live surface. Uses
//! Bevy's `GizmoConfigGroup` pattern; disabled until toggled through
//! `GizmoConfigStore::config_mut::<FootprintGizmo>().enabled`.

use bevy::prelude::*;

use crate::components::FootprintOverlay;
use crate::components::GlobeMarker;
use crate::components::MarkerSlot;
use crate::geodesy::GeoPoint;
use crate::surface::GlobeSurface;

#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct FootprintGizmo {}

#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct FootprintVisualizationConfig {
    pub stroke_color:    Color,
    pub epicenter_color: Color,
    pub marker_color:    Color,
    /// Marker sphere radius, scene units.
    pub marker_radius:   f32,
    pub line_width:      f32,
    /// Height above the ellipsoid the ring is drawn at, so it isn't hidden by the surface.
    pub lift_m:          f64,
}

impl Default for FootprintVisualizationConfig {
    fn default() -> Self {
        Self {
            stroke_color:    Color::WHITE,
            epicenter_color: Color::srgba(1.0, 0.0, 0.0, 0.35),
            marker_color:    Color::srgb(1.0, 0.0, 0.0),
            marker_radius:   12.0,
            line_width:      2.0,
            lift_m:          500.0,
        }
    }
}

pub struct FootprintVisualizationPlugin;

impl Plugin for FootprintVisualizationPlugin {
    fn build(&self, app: &mut App) {
        app.init_gizmo_group::<FootprintGizmo>()
            .init_resource::<FootprintVisualizationConfig>()
            .add_systems(Startup, init_footprint_gizmo)
            .add_systems(Update, (sync_line_width, draw_globe_overlays).chain());
    }
}

fn init_footprint_gizmo(
    mut config_store: ResMut<GizmoConfigStore>,
    viz_config: Res<FootprintVisualizationConfig>,
) {
    let (config, _) = config_store.config_mut::<FootprintGizmo>();
    config.enabled = false;
    config.line.width = viz_config.line_width;
    config.depth_bias = -1.0;
}

fn sync_line_width(
    mut config_store: ResMut<GizmoConfigStore>,
    viz_config: Res<FootprintVisualizationConfig>,
) {
    if !viz_config.is_changed() {
        return;
    }
    let (config, _) = config_store.config_mut::<FootprintGizmo>();
    config.line.width = viz_config.line_width;
}

fn world_point(
    surface: &GlobeSurface,
    transform: &GlobalTransform,
    point: GeoPoint,
    height_m: f64,
) -> Vec3 {
    let ecef = surface.ellipsoid.to_cartesian(point, height_m);
    transform.transform_point(surface.scene_point(ecef))
}

fn draw_globe_overlays(
    mut gizmos: Gizmos<FootprintGizmo>,
    config: Res<FootprintVisualizationConfig>,
    surfaces: Query<(
        &GlobeSurface,
        &GlobalTransform,
        &MarkerSlot,
        Option<&FootprintOverlay>,
    )>,
    markers: Query<(&GlobeMarker, &GlobalTransform)>,
) {
    for (surface, transform, slot, overlay) in &surfaces {
        if !surface.is_live() {
            continue;
        }

        if let Some(overlay) = overlay {
            if let Some(ring) = overlay.collection.ring() {
                gizmos.linestrip(
                    ring.iter()
                        .map(|p| world_point(surface, transform, *p, config.lift_m)),
                    config.stroke_color,
                );
            }
            if let Some(epicenter) = overlay.collection.epicenter() {
                gizmos.sphere(
                    Isometry3d::from_translation(world_point(
                        surface,
                        transform,
                        epicenter,
                        config.lift_m,
                    )),
                    config.marker_radius * 0.5,
                    config.epicenter_color,
                );
            }
        }

        if let Some((_, marker_transform)) = slot.get().and_then(|e| markers.get(e).ok()) {
            gizmos.sphere(
                Isometry3d::from_translation(marker_transform.translation()),
                config.marker_radius,
                config.marker_color,
            );
        }
    }
}
