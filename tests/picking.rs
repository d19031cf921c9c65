mod support;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_impact_globe::ClearPick;
use bevy_impact_globe::CloseGlobe;
use bevy_impact_globe::GeoPoint;
use bevy_impact_globe::GlobeMarker;
use bevy_impact_globe::GlobePicked;
use bevy_impact_globe::MarkerSlot;
use bevy_impact_globe::PrimaryPick;
use support::Log;
use support::log;
use support::open_globe;
use support::test_app;

fn pick(app: &mut App, surface: Entity, origin: Vec3, direction: Dir3) {
    app.world_mut().trigger(PrimaryPick {
        surface_entity: surface,
        ray:            Ray3d::new(origin, direction),
    });
    app.update();
}

fn marker_of(app: &App, surface: Entity) -> Option<Entity> {
    app.world().get::<MarkerSlot>(surface).and_then(MarkerSlot::get)
}

fn picked_app() -> App {
    let mut app = test_app();
    app.init_resource::<Log<GeoPoint>>().add_observer(
        |picked: On<GlobePicked>, mut log: ResMut<Log<GeoPoint>>| log.0.push(picked.point),
    );
    app
}

#[test]
fn pick_places_and_moves_a_single_marker() {
    let mut app = picked_app();
    let (_, surface) = open_globe(&mut app);

    // Straight down onto the north pole (scene +Y is ECEF +Z).
    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::NEG_Y);
    let marker = marker_of(&app, surface).expect("hit places a marker");
    let placed = app.world().get::<GlobeMarker>(marker).expect("marker component");
    assert!((placed.position.latitude_deg - 90.0).abs() < 1e-6);
    assert!(placed.label.starts_with("Lat: 90.0000\nLon: "));
    assert_eq!(app.world().get::<ChildOf>(marker).map(ChildOf::parent), Some(surface));

    // Onto lat 0, lon 0 from the +X side: the same marker moves.
    pick(&mut app, surface, Vec3::new(20_000.0, 0.0, 0.0), Dir3::NEG_X);
    assert_eq!(marker_of(&app, surface), Some(marker));
    let moved = app.world().get::<GlobeMarker>(marker).expect("marker component");
    assert!(moved.position.latitude_deg.abs() < 1e-6);
    assert!(moved.position.longitude_deg.abs() < 1e-6);

    let transform = app.world().get::<Transform>(marker).expect("transform");
    assert!((transform.translation.x - 6378.137).abs() < 1e-2);

    let picks = log::<GeoPoint>(&app);
    assert_eq!(picks.len(), 2);
    assert!((picks[0].latitude_deg - 90.0).abs() < 1e-6);
}

#[test]
fn miss_changes_nothing() {
    let mut app = picked_app();
    let (_, surface) = open_globe(&mut app);

    // Parallel to the globe, well clear of it.
    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::X);
    assert!(marker_of(&app, surface).is_none());

    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::NEG_Y);
    let marker = marker_of(&app, surface);
    assert!(marker.is_some());

    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::Y);
    assert_eq!(marker_of(&app, surface), marker);
    assert_eq!(log::<GeoPoint>(&app).len(), 1);
}

#[test]
fn clear_removes_marker_and_is_idempotent() {
    let mut app = test_app();
    let (_, surface) = open_globe(&mut app);
    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::NEG_Y);
    let marker = marker_of(&app, surface).expect("marker");

    app.world_mut().trigger(ClearPick {
        surface_entity: surface,
    });
    app.update();
    assert!(marker_of(&app, surface).is_none());
    assert!(app.world().get_entity(marker).is_err());

    app.world_mut().trigger(ClearPick {
        surface_entity: surface,
    });
    app.update();
    assert!(marker_of(&app, surface).is_none());
}

#[test]
fn marker_exists_before_host_is_notified() {
    let mut app = test_app();
    app.init_resource::<Log<bool>>().add_observer(
        |picked: On<GlobePicked>,
         slots: Query<&MarkerSlot>,
         markers: Query<&GlobeMarker>,
         mut log: ResMut<Log<bool>>| {
            let present = slots
                .get(picked.surface_entity)
                .ok()
                .and_then(MarkerSlot::get)
                .is_some_and(|marker| markers.contains(marker));
            log.0.push(present);
        },
    );
    let (_, surface) = open_globe(&mut app);

    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::NEG_Y);
    pick(&mut app, surface, Vec3::new(20_000.0, 0.0, 0.0), Dir3::NEG_X);
    assert_eq!(log::<bool>(&app), [true, true]);
}

#[test]
fn closed_surface_ignores_picks() {
    let mut app = picked_app();
    let (_, surface) = open_globe(&mut app);
    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::NEG_Y);
    let marker = marker_of(&app, surface).expect("marker");

    app.world_mut().trigger(CloseGlobe {
        surface_entity: surface,
    });
    app.update();
    assert!(app.world().get_entity(marker).is_err());

    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::NEG_Y);
    assert_eq!(log::<GeoPoint>(&app).len(), 1);
}

fn spawn_window(app: &mut App) -> Entity {
    let mut window = Window::default();
    window.set_cursor_position(Some(Vec2::new(400.0, 300.0)));
    app.world_mut().spawn((window, PrimaryWindow)).id()
}

fn move_cursor(app: &mut App, window: Entity, position: Vec2) {
    app.world_mut()
        .get_mut::<Window>(window)
        .expect("window")
        .set_cursor_position(Some(position));
}

/// Presses at the current cursor, then releases at `release`, one frame each.
fn click(app: &mut App, window: Entity, button: MouseButton, release: Vec2) {
    app.world_mut()
        .resource_mut::<ButtonInput<MouseButton>>()
        .press(button);
    app.update();

    move_cursor(app, window, release);
    let mut buttons = app.world_mut().resource_mut::<ButtonInput<MouseButton>>();
    buttons.clear();
    buttons.release(button);
    app.update();
    app.world_mut()
        .resource_mut::<ButtonInput<MouseButton>>()
        .clear();
}

#[test]
fn mouse_clear_click_removes_marker_but_drag_does_not() {
    let mut app = test_app();
    app.init_resource::<ButtonInput<MouseButton>>();
    app.init_resource::<Log<Entity>>().add_observer(
        |clear: On<ClearPick>, mut log: ResMut<Log<Entity>>| log.0.push(clear.surface_entity),
    );
    let (_, surface) = open_globe(&mut app);
    let window = spawn_window(&mut app);
    pick(&mut app, surface, Vec3::new(0.0, 20_000.0, 0.0), Dir3::NEG_Y);
    let marker = marker_of(&app, surface).expect("marker");

    // Right drag: orbit gesture, not a clear.
    click(&mut app, window, MouseButton::Right, Vec2::new(460.0, 300.0));
    assert!(log::<Entity>(&app).is_empty());
    assert_eq!(marker_of(&app, surface), Some(marker));

    // Left click: no rendered viewport here, so no ray and nothing changes.
    move_cursor(&mut app, window, Vec2::new(400.0, 300.0));
    click(&mut app, window, MouseButton::Left, Vec2::new(401.0, 300.0));
    assert_eq!(marker_of(&app, surface), Some(marker));

    // Right click within the drag tolerance.
    move_cursor(&mut app, window, Vec2::new(400.0, 300.0));
    click(&mut app, window, MouseButton::Right, Vec2::new(402.0, 301.0));
    assert_eq!(log::<Entity>(&app), [surface]);
    assert!(marker_of(&app, surface).is_none());
    assert!(app.world().get_entity(marker).is_err());
}

#[test]
fn press_outside_the_window_is_forgotten() {
    let mut app = test_app();
    app.init_resource::<ButtonInput<MouseButton>>();
    app.init_resource::<Log<Entity>>().add_observer(
        |clear: On<ClearPick>, mut log: ResMut<Log<Entity>>| log.0.push(clear.surface_entity),
    );
    let (_, surface) = open_globe(&mut app);
    let window = spawn_window(&mut app);

    app.world_mut()
        .resource_mut::<ButtonInput<MouseButton>>()
        .press(MouseButton::Right);
    app.update();

    // Cursor leaves, comes back to the press position, then the button is released.
    app.world_mut()
        .get_mut::<Window>(window)
        .expect("window")
        .set_cursor_position(None);
    app.world_mut()
        .resource_mut::<ButtonInput<MouseButton>>()
        .clear();
    app.update();
    move_cursor(&mut app, window, Vec2::new(400.0, 300.0));
    app.world_mut()
        .resource_mut::<ButtonInput<MouseButton>>()
        .release(MouseButton::Right);
    app.update();

    assert!(log::<Entity>(&app).is_empty());
    assert!(marker_of(&app, surface).is_none());
}
