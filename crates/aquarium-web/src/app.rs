//! Bevy application setup

use aquarium_core::AquariumConfig;
use aquarium_scene::{AquariumScenePlugin, ControlPanelPlugin};
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;

/// Build and run the aquarium app.
///
/// `asset_root` is where the models and images are served from; the browser
/// build loads them relative to the page.
pub fn run(config: AquariumConfig, asset_root: &str) -> AppExit {
    let mut app = App::new();
    app.insert_resource(ClearColor(Color::BLACK))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Aquarium".to_string(),
                        canvas: Some("#aquarium-canvas".to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: asset_root.to_string(),
                    // Static hosting, no .meta files next to the assets
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // Must come before EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .add_plugins(AquariumScenePlugin { config })
        .add_plugins(ControlPanelPlugin);

    #[cfg(target_arch = "wasm32")]
    app.add_plugins(crate::dom::DomControlsPlugin);

    app.run()
}
