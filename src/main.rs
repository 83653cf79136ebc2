use bevy::{
    prelude::*,
    winit::{UpdateMode, WinitSettings},
};

use bevy_egui::EguiPlugin;
use bevy_map_viewer::EguiBlockInputState;
use camera::CameraSystemPlugin;
use config::{ConfigWarning, ExplorerConfig, report_config_warning};
use pipeline::DEFAULT_TITLE;
use session::SessionPlugin;

pub mod camera;
pub mod config;
pub mod error;
pub mod geocode;
pub mod overpass;
pub mod pipeline;
pub mod session;
pub mod types;

fn main() {
    // Loaded before the app exists so the window and the tiles start in the
    // right place. The warning waits for the log plugin.
    let (config, warning) = match ExplorerConfig::load() {
        Ok(config) => (config, None),
        Err(err) => (ExplorerConfig::default(), Some(err.to_string())),
    };

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: DEFAULT_TITLE.to_string(),
            resolution: (1200., 800.).into(),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(config.clone())
    .insert_resource(ConfigWarning(warning))
    .add_plugins(CameraSystemPlugin { config });
    // The map viewer may already bring its own.
    if !app.is_plugin_added::<EguiPlugin>() {
        app.add_plugins(EguiPlugin {
            enable_multipass_for_primary_context: false,
        });
    }
    app.add_plugins(SessionPlugin)
        .insert_resource(WinitSettings {
            unfocused_mode: UpdateMode::Reactive {
                wait: std::time::Duration::from_secs(1),
                react_to_device_events: true,
                react_to_user_events: true,
                react_to_window_events: true,
            },
            ..Default::default()
        })
        .insert_resource(ClearColor(Color::from(Srgba {
            red: 0.9,
            green: 0.9,
            blue: 0.8,
            alpha: 1.0,
        })))
        .add_systems(Startup, report_config_warning)
        .add_systems(Update, absorb_egui_inputs)
        .run();
}

fn absorb_egui_inputs(
    mut contexts: bevy_egui::EguiContexts,
    state: Option<ResMut<EguiBlockInputState>>,
) {
    let Some(mut state) = state else {
        return;
    };
    let ctx = contexts.ctx_mut();
    let block_input = ctx.wants_pointer_input() || ctx.is_pointer_over_area();
    if state.block_input != block_input {
        state.block_input = block_input;
    }
}
