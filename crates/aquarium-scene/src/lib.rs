//! Aquarium Scene - Bevy rendering, asset loading and controls
//!
//! This crate turns the engine-independent state from `aquarium-core` into
//! a live Bevy scene: it loads the Wavefront models, spawns the fish school,
//! squid, floor, mirror, glass cage and water shells, animates them every
//! frame and mirrors control changes onto the scene graph.

pub mod animation;
pub mod camera;
pub mod entities;
pub mod lights;
pub mod loaders;
pub mod loading;
pub mod mirror;
pub mod state;
pub mod textures;
pub mod ui;

use aquarium_core::{Aquarium, AquariumConfig};
use bevy::prelude::*;

pub use camera::{CameraSettings, MainCamera};
pub use loading::{AppPhase, Templates};
pub use mirror::{ReflectiveEntities, Reflector};
pub use state::{AquariumSet, AquariumState, SceneCommand, SceneConfig};
pub use ui::ControlPanelPlugin;

/// Plugin that sets up the whole aquarium scene except the egui panel
pub struct AquariumScenePlugin {
    pub config: AquariumConfig,
}

impl Plugin for AquariumScenePlugin {
    fn build(&self, app: &mut App) {
        let aquarium = Aquarium::from_config(&self.config);

        app.insert_resource(SceneConfig(self.config.clone()))
            .insert_resource(AquariumState(aquarium))
            .init_state::<AppPhase>()
            .add_plugins(loaders::WavefrontPlugin)
            .add_plugins(loading::LoadingPlugin)
            .add_plugins(state::StatePlugin)
            .add_plugins(camera::CameraPlugin)
            .add_plugins(lights::LightsPlugin)
            .add_plugins(entities::EntitiesPlugin)
            .add_plugins(mirror::MirrorPlugin)
            .add_plugins(textures::SurfaceTexturePlugin)
            .add_plugins(animation::AnimationPlugin);
    }
}
