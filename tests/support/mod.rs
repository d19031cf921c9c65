//! Headless app harness shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_impact_globe::GlobeSurfaceLink;
use bevy_impact_globe::ImpactGlobePlugin;
use bevy_impact_globe::OpenGlobe;
use bevy_panorbit_camera::PanOrbitCamera;

/// Simulated time per `App::update`.
pub const FRAME: Duration = Duration::from_millis(100);

/// `MinimalPlugins` + the crate plugin with a fixed frame step.
pub fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .add_plugins(ImpactGlobePlugin);
    app
}

pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

pub fn spawn_orbit_camera(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((Transform::default(), PanOrbitCamera::default()))
        .id()
}

/// Opens a globe for a new orbit camera and returns `(camera, surface)`.
pub fn open_globe(app: &mut App) -> (Entity, Entity) {
    let camera = spawn_orbit_camera(app);
    app.world_mut().trigger(OpenGlobe {
        camera_entity: camera,
    });
    app.world_mut().flush();
    let surface = app
        .world()
        .get::<GlobeSurfaceLink>(camera)
        .map(|link| link.0)
        .expect("OpenGlobe links the camera to a surface");
    (camera, surface)
}

/// Collects values emitted by an observer.
#[derive(Resource)]
pub struct Log<T: Send + Sync + 'static>(pub Vec<T>);

impl<T: Send + Sync + 'static> Default for Log<T> {
    fn default() -> Self { Self(Vec::new()) }
}

pub fn log<T: Send + Sync + 'static>(app: &App) -> &[T] {
    app.world()
        .get_resource::<Log<T>>()
        .map_or(&[], |log| log.0.as_slice())
}
