//! Interactive globe viewer for `bevy_impact_globe`.
//!
//! - Left-click the globe to pick an impact site; the camera flies over its footprint
//! - Right-click to clear the pick marker
//! - Press 'D' to toggle the footprint gizmos
//! - Press 'C' to close the globe, 'O' to open it again
//!
//! Tile loading is simulated: pending tiles count down after the globe opens.

use bevy::prelude::*;
use bevy_brp_extras::BrpExtrasPlugin;
use bevy_impact_globe::CloseGlobe;
use bevy_impact_globe::FootprintGizmo;
use bevy_impact_globe::FootprintVisualizationPlugin;
use bevy_impact_globe::GlobeConfig;
use bevy_impact_globe::GlobeOpened;
use bevy_impact_globe::GlobePicked;
use bevy_impact_globe::GlobeSurfaceLink;
use bevy_impact_globe::ImpactGlobePlugin;
use bevy_impact_globe::ImpactMetrics;
use bevy_impact_globe::OpenGlobe;
use bevy_impact_globe::ShowFootprint;
use bevy_impact_globe::SurfaceReady;
use bevy_impact_globe::TileLoadProgress;
use bevy_panorbit_camera::PanOrbitCamera;
use bevy_panorbit_camera::PanOrbitCameraPlugin;

const IMPACTOR_DIAMETER_KM: f64 = 1.2;
const SIMULATED_TILES: u32 = 48;
const TILE_INTERVAL_SECS: f32 = 0.05;
const STATUS_FONT_SIZE: f32 = 14.0;

/// Stand-in for the impact service response.
const SAMPLE_METRICS: &str = r#"{
    "magnitude": 7.4,
    "energy_megatons": 21000.0,
    "crater_diameter_km": 18.0,
    "summary": "Regional devastation"
}"#;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            PanOrbitCameraPlugin,
            ImpactGlobePlugin,
            FootprintVisualizationPlugin,
            BrpExtrasPlugin::default(),
        ))
        .insert_resource(GlobeConfig::from_env())
        .init_resource::<SimulatedTiles>()
        .init_resource::<Status>()
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                simulate_tile_loading,
                toggle_footprint_gizmos,
                open_close_globe,
                update_status_text,
            ),
        )
        .add_observer(on_globe_opened)
        .add_observer(on_surface_ready)
        .add_observer(on_globe_picked)
        .run();
}

#[derive(Resource)]
struct SceneEntities {
    camera: Entity,
}

#[derive(Resource)]
struct SimulatedTiles {
    surface: Option<Entity>,
    pending: u32,
    timer:   Timer,
}

impl Default for SimulatedTiles {
    fn default() -> Self {
        Self {
            surface: None,
            pending: 0,
            timer:   Timer::from_seconds(TILE_INTERVAL_SECS, TimerMode::Repeating),
        }
    }
}

#[derive(Resource, Default)]
struct Status {
    tiles: String,
    pick:  String,
}

#[derive(Component)]
struct StatusText;

fn setup(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 3000.0,
            ..default()
        },
        Transform::from_xyz(1.0, 0.5, 1.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let camera = commands
        .spawn((
            PanOrbitCamera {
                zoom_lower_limit: 6500.0,
                ..default()
            },
            Projection::Perspective(PerspectiveProjection::default()),
        ))
        .id();

    commands.spawn((
        Text::new("Left-click to pick, right-click to clear, 'D' gizmos, 'C'/'O' close/open"),
        TextFont {
            font_size: STATUS_FONT_SIZE,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
    ));
    commands.spawn((
        Text::default(),
        TextFont {
            font_size: STATUS_FONT_SIZE,
            ..default()
        },
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        StatusText,
    ));

    commands.insert_resource(SceneEntities { camera });
    commands.trigger(OpenGlobe {
        camera_entity: camera,
    });
}

/// Gives the new surface a visible ellipsoid and starts the simulated tile countdown.
fn on_globe_opened(
    opened: On<GlobeOpened>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GlobeConfig>,
    mut tiles: ResMut<SimulatedTiles>,
) {
    let ellipsoid = config.ellipsoid;
    let equatorial = (ellipsoid.equatorial_radius_m * config.units_per_meter) as f32;
    let polar = (ellipsoid.polar_radius_m * config.units_per_meter) as f32;

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(1.0).mesh().uv(96, 48))),
        MeshMaterial3d(materials.add(Color::srgb(0.15, 0.35, 0.6))),
        Transform::from_scale(Vec3::new(equatorial, polar, equatorial)),
        ChildOf(opened.surface_entity),
    ));

    tiles.surface = Some(opened.surface_entity);
    tiles.pending = SIMULATED_TILES;
    tiles.timer.reset();
}

fn simulate_tile_loading(
    mut commands: Commands,
    time: Res<Time>,
    mut tiles: ResMut<SimulatedTiles>,
    mut status: ResMut<Status>,
) {
    let Some(surface) = tiles.surface else {
        return;
    };
    if !tiles.timer.tick(time.delta()).just_finished() {
        return;
    }

    tiles.pending = tiles.pending.saturating_sub(1);
    status.tiles = format!("Tiles pending: {}", tiles.pending);
    commands.trigger(TileLoadProgress {
        surface_entity: surface,
        pending:        tiles.pending,
    });
    if tiles.pending == 0 {
        tiles.surface = None;
    }
}

fn on_surface_ready(ready: On<SurfaceReady>, mut status: ResMut<Status>) {
    status.tiles = format!("Globe ready ({:?})", ready.reason);
}

fn on_globe_picked(picked: On<GlobePicked>, mut commands: Commands, mut status: ResMut<Status>) {
    let metrics = match serde_json::from_str::<ImpactMetrics>(SAMPLE_METRICS) {
        Ok(metrics) => metrics,
        Err(error) => {
            warn!("Sample metrics did not parse: {error}");
            ImpactMetrics::default()
        },
    };
    let radius_km = metrics.footprint_radius_km(IMPACTOR_DIAMETER_KM);

    status.pick = format!(
        "Impact at lat {:.4} lon {:.4}, footprint {radius_km:.1} km{}",
        picked.point.latitude_deg,
        picked.point.longitude_deg,
        metrics
            .summary
            .as_deref()
            .map_or_else(String::new, |summary| format!(": {summary}"))
    );
    commands.trigger(ShowFootprint {
        surface_entity: picked.surface_entity,
        center: picked.point,
        radius_km,
    });
}

fn toggle_footprint_gizmos(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut config_store: ResMut<GizmoConfigStore>,
) {
    if keyboard.just_pressed(KeyCode::KeyD) {
        let (config, _) = config_store.config_mut::<FootprintGizmo>();
        config.enabled = !config.enabled;
    }
}

fn open_close_globe(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    scene: Res<SceneEntities>,
    links: Query<&GlobeSurfaceLink>,
    mut status: ResMut<Status>,
) {
    if keyboard.just_pressed(KeyCode::KeyC)
        && let Ok(GlobeSurfaceLink(surface)) = links.get(scene.camera)
    {
        commands.trigger(CloseGlobe {
            surface_entity: *surface,
        });
        status.tiles = "Globe closed".to_owned();
        status.pick.clear();
    }
    if keyboard.just_pressed(KeyCode::KeyO) {
        commands.trigger(OpenGlobe {
            camera_entity: scene.camera,
        });
    }
}

fn update_status_text(status: Res<Status>, mut text: Single<&mut Text, With<StatusText>>) {
    if !status.is_changed() {
        return;
    }
    text.0 = format!("{}\n{}", status.tiles, status.pick);
}
