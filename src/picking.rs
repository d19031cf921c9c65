//! Coordinate picking on a globe surface.
//!
//! A left click (press and release without dragging) casts a ray from the surface's camera,
//! intersects it with the ellipsoid and places the single pick marker. A right click clears
//! it. Drags are left to the orbit controller.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy::window::RequestRedraw;

use crate::components::GlobeMarker;
use crate::components::MarkerSlot;
use crate::events::ClearPick;
use crate::events::GlobePicked;
use crate::events::PrimaryPick;
use crate::geodesy::screen_ray_to_surface_point;
use crate::surface::GlobeSurface;

#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct PickConfig {
    /// Cursor travel between press and release, in logical pixels, above which a click is
    /// treated as a drag.
    pub drag_tolerance_px: f32,
    pub primary_button:    MouseButton,
    pub clear_button:      MouseButton,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            drag_tolerance_px: 4.0,
            primary_button:    MouseButton::Left,
            clear_button:      MouseButton::Right,
        }
    }
}

/// Cursor positions at the last press of each button.
#[derive(Default)]
pub struct PressOrigins {
    primary: Option<Vec2>,
    clear:   Option<Vec2>,
}

/// Clicks completed on one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerClicks {
    /// Cursor position of a completed primary click.
    pub primary: Option<Vec2>,
    pub clear:   bool,
}

impl PressOrigins {
    /// Records presses and resolves releases at `cursor`. A release further than the drag
    /// tolerance from its press is a drag and produces nothing.
    pub fn update(
        &mut self,
        config: &PickConfig,
        buttons: &ButtonInput<MouseButton>,
        cursor: Vec2,
    ) -> PointerClicks {
        if buttons.just_pressed(config.primary_button) {
            self.primary = Some(cursor);
        }
        if buttons.just_pressed(config.clear_button) {
            self.clear = Some(cursor);
        }

        let mut clicks = PointerClicks::default();
        if buttons.just_released(config.primary_button)
            && is_click(self.primary.take(), cursor, config.drag_tolerance_px)
        {
            clicks.primary = Some(cursor);
        }
        if buttons.just_released(config.clear_button) {
            clicks.clear = is_click(self.clear.take(), cursor, config.drag_tolerance_px);
        }
        clicks
    }

    /// Forgets pending presses, e.g. when the cursor leaves the window.
    pub const fn reset(&mut self) {
        self.primary = None;
        self.clear = None;
    }
}

fn is_click(origin: Option<Vec2>, release: Vec2, tolerance: f32) -> bool {
    origin.is_some_and(|press| press.distance(release) <= tolerance)
}

/// Turns mouse clicks over the primary window into pick events for every live surface.
pub fn pointer_pick_input(
    mut commands: Commands,
    config: Res<PickConfig>,
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    surfaces: Query<(Entity, &GlobeSurface)>,
    mut origins: Local<PressOrigins>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        origins.reset();
        return;
    };

    let clicks = origins.update(&config, &buttons, cursor);

    if let Some(cursor) = clicks.primary {
        for (surface_entity, surface) in &surfaces {
            if !surface.is_live() {
                continue;
            }
            let Ok((camera, camera_transform)) = cameras.get(surface.camera) else {
                continue;
            };
            let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
                debug!("No ray for cursor {cursor} through camera {}", surface.camera);
                continue;
            };
            commands.trigger(PrimaryPick {
                surface_entity,
                ray,
            });
        }
    }

    if clicks.clear {
        for (surface_entity, surface) in &surfaces {
            if surface.is_live() {
                commands.trigger(ClearPick { surface_entity });
            }
        }
    }
}

/// Resolves a primary pick. A miss changes nothing; a hit upserts the marker, then
/// notifies the host.
pub fn on_primary_pick(
    pick: On<PrimaryPick>,
    mut commands: Commands,
    mut surfaces: Query<(&GlobeSurface, &GlobalTransform, &mut MarkerSlot)>,
    mut markers: Query<(&mut GlobeMarker, &mut Transform)>,
    mut redraw: MessageWriter<RequestRedraw>,
) {
    let surface_entity = pick.surface_entity;
    let Ok((surface, surface_transform, mut slot)) = surfaces.get_mut(surface_entity) else {
        return;
    };
    if !surface.is_live() {
        return;
    }

    // Into the surface's local frame, where the ellipsoid is centred at the origin.
    let world_to_local = surface_transform.affine().inverse();
    let local_direction = world_to_local.transform_vector3(*pick.ray.direction);
    let Ok(direction) = Dir3::new(local_direction) else {
        return;
    };
    let local_ray = Ray3d::new(world_to_local.transform_point3(pick.ray.origin), direction);

    let Some(hit) =
        screen_ray_to_surface_point(local_ray, &surface.ellipsoid, surface.units_per_meter)
    else {
        debug!("Pick on surface {surface_entity} missed the globe");
        return;
    };

    let point = surface.ellipsoid.to_geographic(hit).normalized();
    let marker = GlobeMarker::new(point);
    let translation = surface.scene_point(hit);

    let existing = slot.get().and_then(|entity| {
        markers
            .get_mut(entity)
            .ok()
            .map(|(mut current, mut transform)| {
                *current = marker.clone();
                transform.translation = translation;
                entity
            })
    });
    if existing.is_none() {
        let entity = commands
            .spawn((
                marker,
                Transform::from_translation(translation),
                Name::new("Pick marker"),
                ChildOf(surface_entity),
            ))
            .id();
        slot.0 = Some(entity);
    }

    redraw.write(RequestRedraw);
    debug!(
        "Picked lat {:.4} lon {:.4} on surface {surface_entity}",
        point.latitude_deg, point.longitude_deg
    );
    commands.trigger(GlobePicked {
        surface_entity,
        point,
    });
}

/// Removes the marker if present; otherwise nothing happens.
pub fn on_clear_pick(
    clear: On<ClearPick>,
    mut commands: Commands,
    mut surfaces: Query<(&GlobeSurface, &mut MarkerSlot)>,
    mut redraw: MessageWriter<RequestRedraw>,
) {
    let surface_entity = clear.surface_entity;
    let Ok((surface, mut slot)) = surfaces.get_mut(surface_entity) else {
        return;
    };
    if !surface.is_live() {
        return;
    }
    let Some(marker) = slot.0.take() else {
        return;
    };

    commands.entity(marker).try_despawn();
    redraw.write(RequestRedraw);
    debug!("Cleared pick marker on surface {surface_entity}");
}
