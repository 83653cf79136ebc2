use bevy::{prelude::*, render::view::RenderLayers};
use bevy_map_viewer::{EguiBlockInputState, MapViewerPlugin, TileMapResources};
use bevy_pancam::{DirectionKeys, PanCam, PanCamPlugin};

use crate::{config::ExplorerConfig, session::Session};

/// Tiles and the camera looking at them.
pub struct CameraSystemPlugin {
    pub config: ExplorerConfig,
}

impl Plugin for CameraSystemPlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;
        app.add_plugins((
            PanCamPlugin,
            MapViewerPlugin {
                starting_location: config.starting_location.to_map_coord(),
                starting_zoom: config.starting_zoom,
                tile_quality: config.tile_quality,
                cache_dir: config.tile_cache_dir().to_string_lossy().into_owned(),
            },
        ))
        .add_systems(Startup, spawn_map_camera)
        .add_systems(Update, gate_map_input);
    }
}

fn map_controls() -> PanCam {
    PanCam {
        grab_buttons: vec![MouseButton::Left, MouseButton::Middle],
        move_keys: DirectionKeys::arrows(),
        speed: 400.,
        zoom_to_cursor: true,
        min_scale: 0.01,
        ..default()
    }
}

fn spawn_map_camera(mut commands: Commands, tile_map_res: Option<Res<TileMapResources>>) {
    let Some(tile_map_res) = tile_map_res else {
        error!("TileMapResources not found, the map viewer plugin has to be added first");
        return;
    };
    let start = tile_map_res
        .location_manager
        .location
        .to_game_coords(tile_map_res.clone());

    commands.spawn((
        Camera2d,
        RenderLayers::from_layers(&[0, 1]),
        Transform::from_translation(start.extend(1.0)),
        map_controls(),
    ));
}

/// Whether dragging and scrolling should move the map.
fn map_takes_input(pointer_over_panel: bool, notice_open: bool) -> bool {
    !pointer_over_panel && !notice_open
}

fn gate_map_input(
    mut cameras: Query<&mut PanCam>,
    egui_state: Option<Res<EguiBlockInputState>>,
    session: Option<Res<Session>>,
) {
    let over_panel = egui_state.is_some_and(|state| state.block_input);
    let notice_open = session.is_some_and(|session| session.notice.is_some());
    let enabled = map_takes_input(over_panel, notice_open);
    for mut pancam in &mut cameras {
        if pancam.enabled != enabled {
            pancam.enabled = enabled;
        }
    }
}
