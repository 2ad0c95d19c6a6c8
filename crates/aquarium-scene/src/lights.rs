//! Directional light and the spotlight line

use aquarium_core::lights::spotlight_positions;
use bevy::prelude::*;

use crate::loading::AppPhase;
use crate::state::{AquariumState, SceneConfig};

/// Index of a spotlight in the control state's intensity list
#[derive(Component, Debug)]
pub struct Spotlight {
    pub index: usize,
}

pub struct LightsPlugin;

impl Plugin for LightsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppPhase::Running), spawn_lights);
    }
}

fn spawn_lights(mut commands: Commands, state: Res<AquariumState>, config: Res<SceneConfig>) {
    let lights = &config.lights;

    commands.spawn((
        DirectionalLight {
            illuminance: lights.directional_illuminance,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(lights.directional_position))
            .looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let angle = lights.spot_angle_degrees.to_radians();
    let positions = spotlight_positions(lights.spot_count, lights.spot_height, lights.spot_spacing);
    for (index, position) in positions.into_iter().enumerate() {
        let value = state.spot_intensities().get(index).copied().unwrap_or(0.0);
        commands.spawn((
            SpotLight {
                intensity: value * lights.lumens_per_unit,
                range: lights.spot_range,
                outer_angle: angle,
                inner_angle: angle,
                shadows_enabled: true,
                ..default()
            },
            // The center light points straight down, so the up hint must not be Y
            Transform::from_translation(Vec3::from_array(position)).looking_at(Vec3::ZERO, Vec3::X),
            Spotlight { index },
        ));
    }

    tracing::info!(spotlights = lights.spot_count, "Lights spawned");
}
