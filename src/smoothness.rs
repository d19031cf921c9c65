use bevy::prelude::*;
use bevy_panorbit_camera::PanOrbitCamera;

use crate::comparison::ComparisonRig;
use crate::flight::GlobeFlight;

/// Smoothness values a `PanOrbitCamera` had before the crate started driving it.
///
/// Flights and the comparison rig interpolate the camera themselves, so its own smoothing is
/// zeroed while they run and put back by the observers below when their component goes away.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct SmoothnessStash {
    pub zoom:  f32,
    pub pan:   f32,
    pub orbit: f32,
}

impl SmoothnessStash {
    /// Records the camera's smoothness and zeroes it.
    pub const fn take_from(camera: &mut PanOrbitCamera) -> Self {
        let stash = Self {
            zoom:  camera.zoom_smoothness,
            pan:   camera.pan_smoothness,
            orbit: camera.orbit_smoothness,
        };
        camera.zoom_smoothness = 0.0;
        camera.pan_smoothness = 0.0;
        camera.orbit_smoothness = 0.0;
        stash
    }

    pub const fn restore(&self, camera: &mut PanOrbitCamera) {
        camera.zoom_smoothness = self.zoom;
        camera.pan_smoothness = self.pan;
        camera.orbit_smoothness = self.orbit;
    }
}

/// Stashes smoothness when a comparison rig takes over a camera.
pub fn stash_smoothness_on_rig_added(
    add: On<Add, ComparisonRig>,
    mut commands: Commands,
    mut query: Query<&mut PanOrbitCamera, Without<SmoothnessStash>>,
) {
    let entity = add.entity;
    let Ok(mut camera) = query.get_mut(entity) else {
        return;
    };
    let stash = SmoothnessStash::take_from(&mut camera);
    commands.entity(entity).insert(stash);
}

/// Observer that restores smoothness when a globe flight finishes or is cancelled.
pub fn restore_smoothness_on_flight_end(
    remove: On<Remove, GlobeFlight>,
    commands: Commands,
    query: Query<(&SmoothnessStash, &mut PanOrbitCamera), Without<ComparisonRig>>,
) {
    restore(remove.entity, commands, query);
}

/// Observer that restores smoothness when a comparison rig is removed.
pub fn restore_smoothness_on_rig_removed(
    remove: On<Remove, ComparisonRig>,
    commands: Commands,
    query: Query<(&SmoothnessStash, &mut PanOrbitCamera), Without<GlobeFlight>>,
) {
    restore(remove.entity, commands, query);
}

fn restore<F: bevy::ecs::query::QueryFilter>(
    entity: Entity,
    mut commands: Commands,
    mut query: Query<(&SmoothnessStash, &mut PanOrbitCamera), F>,
) {
    let Ok((stash, mut camera)) = query.get_mut(entity) else {
        return;
    };
    stash.restore(&mut camera);
    commands.entity(entity).remove::<SmoothnessStash>();
}
