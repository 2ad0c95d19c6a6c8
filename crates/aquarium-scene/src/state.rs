//! Control state, command application and state-to-scene sync

use aquarium_core::{Aquarium, AquariumCommand, AquariumConfig, Backdrop};
use bevy::prelude::*;

use crate::camera::BackdropQuad;
use crate::entities::{FishPivot, Floor, SquidPivot};
use crate::lights::Spotlight;
use crate::loading::AppPhase;
use crate::mirror::{MirrorPivot, ReflectiveEntities};

/// Configuration the scene was built from
#[derive(Resource, Debug, Clone, Deref)]
pub struct SceneConfig(pub AquariumConfig);

/// The assembler state the controls mutate
#[derive(Resource, Debug, Clone, Deref, DerefMut)]
pub struct AquariumState(pub Aquarium);

/// A control change, applied at the start of the next frame
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct SceneCommand(pub AquariumCommand);

/// Per-frame ordering: commands, then sync, then animation
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum AquariumSet {
    Commands,
    Sync,
    Animate,
}

pub struct StatePlugin;

impl Plugin for StatePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SceneCommand>()
            .configure_sets(
                Update,
                (
                    AquariumSet::Commands,
                    AquariumSet::Sync.run_if(in_state(AppPhase::Running)),
                    AquariumSet::Animate.run_if(in_state(AppPhase::Running)),
                )
                    .chain(),
            )
            .add_systems(Update, apply_scene_commands.in_set(AquariumSet::Commands))
            .add_systems(
                Update,
                (
                    sync_fish_visibility,
                    sync_squid_visibility,
                    sync_floor_and_mirror,
                    sync_reflectors,
                    sync_spotlights,
                    sync_backdrop,
                )
                    .in_set(AquariumSet::Sync),
            );
    }
}

fn apply_scene_commands(
    mut commands: MessageReader<SceneCommand>,
    mut state: ResMut<AquariumState>,
) {
    for SceneCommand(command) in commands.read() {
        tracing::debug!(?command, "Applying command");
        state.apply(*command);
    }
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn sync_fish_visibility(
    state: Res<AquariumState>,
    mut pivots: Query<(&FishPivot, &mut Visibility)>,
) {
    if !state.is_changed() {
        return;
    }
    for (pivot, mut vis) in &mut pivots {
        let visible = state
            .school()
            .get(pivot.index)
            .is_some_and(|fish| fish.visible);
        vis.set_if_neq(visibility(visible));
    }
}

fn sync_squid_visibility(
    state: Res<AquariumState>,
    mut squids: Query<&mut Visibility, With<SquidPivot>>,
) {
    for mut vis in &mut squids {
        vis.set_if_neq(visibility(state.squid_visible()));
    }
}

fn sync_floor_and_mirror(
    state: Res<AquariumState>,
    mut floors: Query<&mut Visibility, (With<Floor>, Without<MirrorPivot>)>,
    mut mirrors: Query<&mut Visibility, (With<MirrorPivot>, Without<Floor>)>,
) {
    for mut vis in &mut floors {
        vis.set_if_neq(visibility(state.floor_visible()));
    }
    for mut vis in &mut mirrors {
        vis.set_if_neq(visibility(state.mirror_mode()));
    }
}

/// Reflective cameras and their meshes are only live in mirror mode
fn sync_reflectors(
    state: Res<AquariumState>,
    reflective: Res<ReflectiveEntities>,
    mut cameras: Query<&mut Camera>,
    mut meshes: Query<&mut Visibility, Without<Camera>>,
) {
    let active = state.mirror_mode();
    for reflector in reflective.iter() {
        if let Ok(mut camera) = cameras.get_mut(reflector.camera) {
            if camera.is_active != active {
                camera.is_active = active;
                tracing::debug!(active, target = ?reflector.target.id(), "Reflector camera switched");
            }
        }
        if let Ok(mut vis) = meshes.get_mut(reflector.mesh) {
            vis.set_if_neq(visibility(active));
        }
    }
}

fn sync_spotlights(
    state: Res<AquariumState>,
    config: Res<SceneConfig>,
    mut lights: Query<(&Spotlight, &mut SpotLight)>,
) {
    if !state.is_changed() {
        return;
    }
    for (spot, mut light) in &mut lights {
        let Some(&value) = state.spot_intensities().get(spot.index) else {
            continue;
        };
        let intensity = value * config.lights.lumens_per_unit;
        if light.intensity != intensity {
            light.intensity = intensity;
        }
    }
}

fn sync_backdrop(
    state: Res<AquariumState>,
    mut backdrops: Query<&mut Visibility, With<BackdropQuad>>,
) {
    for mut vis in &mut backdrops {
        vis.set_if_neq(visibility(state.backdrop() == Backdrop::TestImage));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::Reflector;
    use bevy::ecs::message::Messages;
    use bevy::state::app::StatesPlugin;

    fn test_app() -> App {
        let mut config = AquariumConfig::default();
        config.fish.max = 20;
        config.fish.initial_visible = 10;
        config.fish.seed = Some(11);

        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin))
            .insert_state(AppPhase::Running)
            .insert_resource(AquariumState(Aquarium::from_config(&config)))
            .insert_resource(SceneConfig(config))
            .init_resource::<ReflectiveEntities>()
            .add_plugins(StatePlugin);

        for index in 0..20 {
            app.world_mut()
                .spawn((FishPivot { index }, Visibility::Inherited));
        }
        app.world_mut().spawn((SquidPivot { step: 0.005 }, Visibility::Hidden));
        app.world_mut().spawn((Floor, Visibility::Inherited));
        app.world_mut().spawn((MirrorPivot, Visibility::Hidden));
        app.world_mut().spawn((BackdropQuad, Visibility::Hidden));
        for index in 0..7 {
            app.world_mut().spawn((Spotlight { index }, SpotLight::default()));
        }
        app
    }

    fn send(app: &mut App, command: AquariumCommand) {
        app.world_mut()
            .resource_mut::<Messages<SceneCommand>>()
            .write(SceneCommand(command));
    }

    fn visible_fish(app: &mut App) -> Vec<usize> {
        let mut indices: Vec<usize> = app
            .world_mut()
            .query::<(&FishPivot, &Visibility)>()
            .iter(app.world())
            .filter(|(_, vis)| **vis != Visibility::Hidden)
            .map(|(pivot, _)| pivot.index)
            .collect();
        indices.sort_unstable();
        indices
    }

    fn single_visibility<M: Component>(app: &mut App) -> Visibility {
        *app.world_mut()
            .query_filtered::<&Visibility, With<M>>()
            .single(app.world())
            .unwrap()
    }

    #[test]
    fn test_initial_sync() {
        let mut app = test_app();
        app.update();
        assert_eq!(visible_fish(&mut app), (0..10).collect::<Vec<_>>());
        assert_eq!(single_visibility::<Floor>(&mut app), Visibility::Inherited);
        assert_eq!(single_visibility::<MirrorPivot>(&mut app), Visibility::Hidden);
    }

    #[test]
    fn test_count_command_updates_pivots() {
        let mut app = test_app();
        app.update();

        send(&mut app, AquariumCommand::SetVisibleFish(3));
        app.update();
        assert_eq!(visible_fish(&mut app), vec![0, 1, 2]);

        send(&mut app, AquariumCommand::SetVisibleFish(0));
        app.update();
        assert!(visible_fish(&mut app).is_empty());
    }

    #[test]
    fn test_toggles_reach_the_scene() {
        let mut app = test_app();
        send(&mut app, AquariumCommand::ToggleSquid);
        send(&mut app, AquariumCommand::ToggleMirror);
        send(&mut app, AquariumCommand::ToggleBackground);
        app.update();

        assert_eq!(single_visibility::<SquidPivot>(&mut app), Visibility::Inherited);
        assert_eq!(single_visibility::<Floor>(&mut app), Visibility::Hidden);
        assert_eq!(single_visibility::<MirrorPivot>(&mut app), Visibility::Inherited);
        assert_eq!(single_visibility::<BackdropQuad>(&mut app), Visibility::Inherited);

        send(&mut app, AquariumCommand::ToggleMirror);
        app.update();
        assert_eq!(single_visibility::<Floor>(&mut app), Visibility::Inherited);
        assert_eq!(single_visibility::<MirrorPivot>(&mut app), Visibility::Hidden);
    }

    #[test]
    fn test_reflective_camera_follows_mirror_mode() {
        let mut app = test_app();
        let camera = app
            .world_mut()
            .spawn(Camera {
                is_active: false,
                ..default()
            })
            .id();
        let mesh = app.world_mut().spawn(Visibility::Hidden).id();
        app.world_mut()
            .resource_mut::<ReflectiveEntities>()
            .register(Reflector {
                mesh,
                camera,
                target: Handle::default(),
            });

        send(&mut app, AquariumCommand::ToggleMirror);
        app.update();
        assert!(app.world().get::<Camera>(camera).unwrap().is_active);
        assert_eq!(
            app.world().get::<Visibility>(mesh),
            Some(&Visibility::Inherited)
        );

        send(&mut app, AquariumCommand::ToggleMirror);
        app.update();
        assert!(!app.world().get::<Camera>(camera).unwrap().is_active);
        assert_eq!(app.world().get::<Visibility>(mesh), Some(&Visibility::Hidden));
    }

    #[test]
    fn test_light_intensity_scales_every_spotlight() {
        let mut app = test_app();
        send(&mut app, AquariumCommand::SetLightIntensity(2.0));
        app.update();

        let lumens = app.world().resource::<SceneConfig>().lights.lumens_per_unit;
        let intensities: Vec<f32> = app
            .world_mut()
            .query::<&SpotLight>()
            .iter(app.world())
            .map(|light| light.intensity)
            .collect();
        assert_eq!(intensities.len(), 7);
        assert!(intensities.iter().all(|&i| i == 2.0 * lumens));
    }
}
