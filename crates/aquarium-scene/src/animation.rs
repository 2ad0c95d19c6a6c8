//! Per-frame motion of the school, the water and the squid
//!
//! Steps are applied once per rendered frame, so motion speed follows the
//! frame rate.

use bevy::prelude::*;

use crate::entities::{FishPivot, SquidPivot, WaterGroup};
use crate::state::{AquariumSet, AquariumState};

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (swim, turn_water, turn_squid).in_set(AquariumSet::Animate),
        );
    }
}

/// Every fish orbits the origin by its own speed, visible or not
fn swim(state: Res<AquariumState>, mut pivots: Query<(&FishPivot, &mut Transform)>) {
    for (pivot, mut transform) in &mut pivots {
        if let Some(fish) = state.school().get(pivot.index) {
            transform.rotate_y(fish.speed);
        }
    }
}

fn turn_water(mut groups: Query<(&WaterGroup, &mut Transform)>) {
    for (group, mut transform) in &mut groups {
        transform.rotate_y(group.step);
    }
}

fn turn_squid(mut squids: Query<(&SquidPivot, &mut Transform)>) {
    for (squid, mut transform) in &mut squids {
        transform.rotate_local_y(squid.step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::AppPhase;
    use crate::mirror::ReflectiveEntities;
    use crate::state::{SceneCommand, SceneConfig, StatePlugin};
    use aquarium_core::{Aquarium, AquariumCommand, AquariumConfig};
    use bevy::ecs::message::Messages;
    use bevy::state::app::StatesPlugin;

    fn test_app() -> App {
        let mut config = AquariumConfig::default();
        config.fish.max = 5;
        config.fish.initial_visible = 2;
        config.fish.seed = Some(3);

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .insert_state(AppPhase::Running)
            .insert_resource(AquariumState(Aquarium::from_config(&config)))
            .insert_resource(SceneConfig(config))
            .init_resource::<ReflectiveEntities>()
            .add_plugins((StatePlugin, AnimationPlugin));
        app
    }

    fn angle_about_y(transform: &Transform) -> f32 {
        let forward = transform.rotation * Vec3::Z;
        forward.x.atan2(forward.z)
    }

    #[test]
    fn test_fish_advance_by_speed_each_frame() {
        let mut app = test_app();
        let hidden = app
            .world_mut()
            .spawn((FishPivot { index: 4 }, Transform::IDENTITY))
            .id();
        app.update();
        app.update();

        let speed = app.world().resource::<AquariumState>().school().get(4).unwrap().speed;
        let transform = app.world().get::<Transform>(hidden).unwrap();
        assert!((angle_about_y(transform) - 2.0 * speed).abs() < 1e-5);
    }

    #[test]
    fn test_speed_command_takes_effect_same_frame() {
        let mut app = test_app();
        let pivot = app
            .world_mut()
            .spawn((FishPivot { index: 0 }, Transform::IDENTITY))
            .id();
        let base = app.world().resource::<AquariumState>().school().get(0).unwrap().base_speed;

        app.world_mut()
            .resource_mut::<Messages<SceneCommand>>()
            .write(SceneCommand(AquariumCommand::SetSpeedMultiplier(2.0)));
        app.update();

        let transform = app.world().get::<Transform>(pivot).unwrap();
        assert!((angle_about_y(transform) - 2.0 * base).abs() < 1e-5);
    }

    #[test]
    fn test_water_and_squid_turn() {
        let mut app = test_app();
        let water = app
            .world_mut()
            .spawn((WaterGroup { step: -0.001 }, Transform::IDENTITY))
            .id();
        let squid = app
            .world_mut()
            .spawn((
                SquidPivot { step: 0.005 },
                Transform::from_rotation(Quat::from_rotation_x(0.5)),
            ))
            .id();
        app.update();

        let water = app.world().get::<Transform>(water).unwrap();
        assert!((angle_about_y(water) + 0.001).abs() < 1e-6);

        let squid = app.world().get::<Transform>(squid).unwrap();
        let expected = Quat::from_rotation_x(0.5) * Quat::from_rotation_y(0.005);
        assert!((squid.rotation.dot(expected).abs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_nothing_moves_while_loading() {
        let mut app = test_app();
        app.world_mut()
            .resource_mut::<NextState<AppPhase>>()
            .set(AppPhase::Loading);
        app.update();

        let pivot = app
            .world_mut()
            .spawn((FishPivot { index: 0 }, Transform::IDENTITY))
            .id();
        app.update();
        assert_eq!(app.world().get::<Transform>(pivot).unwrap().rotation, Quat::IDENTITY);
    }
}
