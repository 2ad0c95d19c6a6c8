//! Startup asset sequencing and model templates
//!
//! The fish materials, fish geometry and squid geometry load one after the
//! other. Once all three are in, the templates are built and the app moves
//! to [`AppPhase::Running`], which spawns the scene. A failed load moves it
//! to [`AppPhase::Failed`] instead and the scene stays empty.

use aquarium_core::{LoadError, LoadSequence, LoadStep};
use bevy::asset::{LoadState, UntypedAssetId};
use bevy::prelude::*;

use crate::loaders::{MaterialLibrary, WavefrontModel};
use crate::state::SceneConfig;

/// Application lifecycle
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppPhase {
    #[default]
    Loading,
    Running,
    Failed,
}

/// Plugin driving the load sequence
pub struct LoadingPlugin;

impl Plugin for LoadingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelLoads>()
            .add_systems(Startup, start_loading)
            .add_systems(
                Update,
                advance_loading.run_if(in_state(AppPhase::Loading)),
            );
    }
}

/// Handles of the models being loaded and the sequence position
#[derive(Resource, Default)]
pub struct ModelLoads {
    pub sequence: LoadSequence,
    pub fish_materials: Option<Handle<MaterialLibrary>>,
    pub fish_model: Option<Handle<WavefrontModel>>,
    pub squid_model: Option<Handle<WavefrontModel>>,
}

impl ModelLoads {
    fn in_flight(&self, step: LoadStep) -> Option<UntypedAssetId> {
        match step {
            LoadStep::FishMaterial => self.fish_materials.as_ref().map(|h| h.id().untyped()),
            LoadStep::FishGeometry => self.fish_model.as_ref().map(|h| h.id().untyped()),
            LoadStep::SquidGeometry => self.squid_model.as_ref().map(|h| h.id().untyped()),
        }
    }

    fn start(&mut self, step: LoadStep, asset_server: &AssetServer, config: &SceneConfig) {
        let path = step_path(step, config);
        tracing::info!(step = %step, path = %path, "Loading");
        match step {
            LoadStep::FishMaterial => self.fish_materials = Some(asset_server.load(path)),
            LoadStep::FishGeometry => self.fish_model = Some(asset_server.load(path)),
            LoadStep::SquidGeometry => self.squid_model = Some(asset_server.load(path)),
        }
    }
}

fn step_path(step: LoadStep, config: &SceneConfig) -> String {
    let assets = &config.assets;
    match step {
        LoadStep::FishMaterial => assets.fish_material.clone(),
        LoadStep::FishGeometry => assets.fish_model.clone(),
        LoadStep::SquidGeometry => assets.squid_model.clone(),
    }
}

/// Mesh and material pair of a template
#[derive(Debug, Clone)]
pub struct TemplatePart {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

/// A loaded model ready to be cloned into the scene
#[derive(Debug, Clone, Default)]
pub struct ModelTemplate {
    pub parts: Vec<TemplatePart>,
    pub triangles: usize,
}

/// The shared fish and squid templates
#[derive(Resource, Debug, Clone)]
pub struct Templates {
    pub fish: ModelTemplate,
    pub squid: ModelTemplate,
}

fn start_loading(
    mut loads: ResMut<ModelLoads>,
    asset_server: Res<AssetServer>,
    config: Res<SceneConfig>,
) {
    if let Some(step) = loads.sequence.current() {
        loads.start(step, &asset_server, &config);
    }
}

fn advance_loading(
    mut commands: Commands,
    mut loads: ResMut<ModelLoads>,
    mut next_phase: ResMut<NextState<AppPhase>>,
    asset_server: Res<AssetServer>,
    config: Res<SceneConfig>,
    models: Res<Assets<WavefrontModel>>,
    libraries: Res<Assets<MaterialLibrary>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(step) = loads.sequence.current() else {
        return;
    };
    let Some(id) = loads.in_flight(step) else {
        return;
    };

    match asset_server.get_load_state(id) {
        Some(LoadState::Loaded) => match loads.sequence.complete(step) {
            Ok(Some(next)) => loads.start(next, &asset_server, &config),
            Ok(None) => match build_templates(&loads, &models, &libraries, &mut materials) {
                Some(templates) => {
                    tracing::info!(
                        fish_parts = templates.fish.parts.len(),
                        fish_triangles = templates.fish.triangles,
                        squid_parts = templates.squid.parts.len(),
                        squid_triangles = templates.squid.triangles,
                        "Models loaded"
                    );
                    commands.insert_resource(templates);
                    next_phase.set(AppPhase::Running);
                }
                None => fail(
                    &mut loads,
                    &mut next_phase,
                    LoadError::Failed {
                        step,
                        path: step_path(step, &config),
                        reason: "model missing after load".to_string(),
                    },
                ),
            },
            Err(error) => fail(&mut loads, &mut next_phase, error),
        },
        Some(LoadState::Failed(reason)) => fail(
            &mut loads,
            &mut next_phase,
            LoadError::Failed {
                step,
                path: step_path(step, &config),
                reason: reason.to_string(),
            },
        ),
        _ => {}
    }
}

fn fail(loads: &mut ModelLoads, next_phase: &mut NextState<AppPhase>, error: LoadError) {
    tracing::error!(%error, "Asset loading failed");
    loads.sequence.fail(error);
    next_phase.set(AppPhase::Failed);
}

fn build_templates(
    loads: &ModelLoads,
    models: &Assets<WavefrontModel>,
    libraries: &Assets<MaterialLibrary>,
    materials: &mut Assets<StandardMaterial>,
) -> Option<Templates> {
    let library = libraries.get(loads.fish_materials.as_ref()?)?;
    let fish = models.get(loads.fish_model.as_ref()?)?;
    let squid = models.get(loads.squid_model.as_ref()?)?;

    // Parts without a known material fall back to plain white
    let fallback = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        perceptual_roughness: 0.6,
        ..default()
    });

    let fish = ModelTemplate {
        parts: fish
            .parts
            .iter()
            .map(|part| TemplatePart {
                mesh: part.mesh.clone(),
                material: part
                    .material
                    .as_ref()
                    .and_then(|name| library.materials.get(name))
                    .cloned()
                    .unwrap_or_else(|| fallback.clone()),
            })
            .collect(),
        triangles: fish.triangles,
    };

    let squid = ModelTemplate {
        parts: squid
            .parts
            .iter()
            .map(|part| TemplatePart {
                mesh: part.mesh.clone(),
                material: fallback.clone(),
            })
            .collect(),
        triangles: squid.triangles,
    };

    Some(Templates { fish, squid })
}
