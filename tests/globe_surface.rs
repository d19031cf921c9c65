mod support;

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy::time::Virtual;
use bevy_impact_globe::CloseGlobe;
use bevy_impact_globe::GlobeOpened;
use bevy_impact_globe::GlobeSurface;
use bevy_impact_globe::GlobeSurfaceLink;
use bevy_impact_globe::ImageryProvider;
use bevy_impact_globe::OpenGlobe;
use bevy_impact_globe::ReadyReason;
use bevy_impact_globe::SurfaceReady;
use bevy_impact_globe::TerrainProvider;
use bevy_impact_globe::TileLoadMonitor;
use bevy_impact_globe::TileLoadProgress;
use bevy_panorbit_camera::PanOrbitCamera;
use support::Log;
use support::log;
use support::open_globe;
use support::run_frames;
use support::test_app;

fn app_logging_ready() -> App {
    let mut app = test_app();
    app.init_resource::<Log<ReadyReason>>().add_observer(
        |ready: On<SurfaceReady>, mut log: ResMut<Log<ReadyReason>>| log.0.push(ready.reason),
    );
    app
}

fn listener_of(app: &App, surface: Entity) -> Entity {
    app.world()
        .get::<TileLoadMonitor>(surface)
        .and_then(TileLoadMonitor::listener)
        .expect("open surface has a progress listener")
}

#[test]
fn progress_reaching_zero_fires_ready_once() {
    let mut app = app_logging_ready();
    let (_, surface) = open_globe(&mut app);
    let listener = listener_of(&app, surface);

    run_frames(&mut app, 2);
    for pending in [40, 12, 3, 0] {
        app.world_mut().trigger(TileLoadProgress {
            surface_entity: surface,
            pending,
        });
    }
    app.update();

    assert_eq!(log::<ReadyReason>(&app), [ReadyReason::Progress]);
    assert!(app.world().get_entity(listener).is_err(), "listener unregistered");

    // Neither late progress nor the deadlines fire again.
    app.world_mut().trigger(TileLoadProgress {
        surface_entity: surface,
        pending: 0,
    });
    run_frames(&mut app, 100);
    assert_eq!(log::<ReadyReason>(&app), [ReadyReason::Progress]);
}

#[test]
fn short_deadline_fires_without_progress() {
    let mut app = app_logging_ready();
    let (_, surface) = open_globe(&mut app);
    let listener = listener_of(&app, surface);

    app.world_mut().trigger(TileLoadProgress {
        surface_entity: surface,
        pending: 25,
    });
    run_frames(&mut app, 25);
    assert!(log::<ReadyReason>(&app).is_empty());

    run_frames(&mut app, 15);
    assert_eq!(log::<ReadyReason>(&app), [ReadyReason::ShortTimeout]);
    assert!(app.world().get_entity(listener).is_err());

    run_frames(&mut app, 60);
    assert_eq!(log::<ReadyReason>(&app).len(), 1);
}

#[test]
fn short_deadline_follows_wall_clock_through_long_frames() {
    let mut app = app_logging_ready();
    // One-second frames: virtual time is clamped to a quarter of that per frame.
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs(1)));
    open_globe(&mut app);

    // The first update only starts the real clock, so this is 2 s of wall time.
    run_frames(&mut app, 3);
    assert!(log::<ReadyReason>(&app).is_empty());

    run_frames(&mut app, 2);
    assert_eq!(log::<ReadyReason>(&app), [ReadyReason::ShortTimeout]);
    let virtual_secs = app.world().resource::<Time<Virtual>>().elapsed_secs();
    assert!(virtual_secs < 3.0, "virtual clock {virtual_secs}s should lag behind");
}

#[test]
fn deadlines_fire_while_virtual_time_is_paused() {
    let mut app = app_logging_ready();
    app.world_mut().resource_mut::<Time<Virtual>>().pause();
    open_globe(&mut app);

    run_frames(&mut app, 40);
    assert_eq!(log::<ReadyReason>(&app), [ReadyReason::ShortTimeout]);
    assert_eq!(app.world().resource::<Time<Virtual>>().elapsed(), Duration::ZERO);
}

#[test]
fn close_unregisters_everything_and_never_fires() {
    let mut app = app_logging_ready();
    let (camera, surface) = open_globe(&mut app);
    let listener = listener_of(&app, surface);

    app.world_mut().trigger(CloseGlobe {
        surface_entity: surface,
    });
    app.update();

    assert!(app.world().get_entity(surface).is_err());
    assert!(app.world().get_entity(listener).is_err());
    assert!(app.world().get::<GlobeSurfaceLink>(camera).is_none());

    run_frames(&mut app, 100);
    assert!(log::<ReadyReason>(&app).is_empty());

    // Closing twice is harmless.
    app.world_mut().trigger(CloseGlobe {
        surface_entity: surface,
    });
    app.update();
}

#[test]
fn open_is_guarded_per_camera() {
    let mut app = test_app();
    app.init_resource::<Log<Entity>>().add_observer(
        |opened: On<GlobeOpened>, mut log: ResMut<Log<Entity>>| log.0.push(opened.surface_entity),
    );
    let (camera, surface) = open_globe(&mut app);

    app.world_mut().trigger(OpenGlobe {
        camera_entity: camera,
    });
    app.update();

    let surfaces = app
        .world_mut()
        .query::<&GlobeSurface>()
        .iter(app.world())
        .count();
    assert_eq!(surfaces, 1);
    assert_eq!(log::<Entity>(&app), [surface]);
}

#[test]
fn camera_can_reopen_after_close() {
    let mut app = test_app();
    let (camera, surface) = open_globe(&mut app);
    app.world_mut().trigger(CloseGlobe {
        surface_entity: surface,
    });
    app.update();

    app.world_mut().trigger(OpenGlobe {
        camera_entity: camera,
    });
    app.update();
    let reopened = app.world().get::<GlobeSurfaceLink>(camera).map(|link| link.0);
    assert!(reopened.is_some_and(|entity| entity != surface));
}

#[test]
fn missing_token_falls_back_to_ellipsoid() {
    let mut app = test_app();
    let (_, surface) = open_globe(&mut app);
    let surface = app.world().get::<GlobeSurface>(surface).expect("surface");
    assert!(surface.is_live());
    assert_eq!(surface.terrain, TerrainProvider::Ellipsoid);
    assert_eq!(surface.imagery, ImageryProvider::Default);
}

#[test]
fn camera_starts_over_the_initial_view() {
    let mut app = test_app();
    let (camera, _) = open_globe(&mut app);

    let pan_orbit = app.world().get::<PanOrbitCamera>(camera).expect("camera");
    assert!((pan_orbit.target_pitch - 23.6_f32.to_radians()).abs() < 1e-5);
    assert!((pan_orbit.target_yaw - ((-102.0_f32).to_radians() + std::f32::consts::FRAC_PI_2)).abs() < 1e-5);
    // Roughly Earth radius plus 2000 km, in kilometre scene units.
    assert!((pan_orbit.target_radius - 8375.0).abs() < 10.0, "{}", pan_orbit.target_radius);

    let transform = app.world().get::<Transform>(camera).expect("transform");
    assert!((transform.translation.length() - pan_orbit.target_radius).abs() < 1.0);
}
