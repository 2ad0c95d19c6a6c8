//! Entity factories: fish school, squid, floor, glass cage and water

use aquarium_core::{Fish, MapKind, TextureSet};
use bevy::light::NotShadowCaster;
use bevy::math::Affine2;
use bevy::prelude::*;

use crate::loading::{AppPhase, ModelTemplate, Templates};
use crate::state::{AquariumState, SceneConfig};
use crate::textures::{PendingDisplacement, SurfaceMaps};

/// Water group rotation per frame (radians about Y)
pub const WATER_ROTATE_STEP: f32 = -0.001;

const FLOOR_COLOR: Color = Color::srgb(0.4, 0.4, 0.6);
const SPHERE_SEGMENTS: u32 = 256;
const WATER_RADII: [f32; 2] = [0.865, 0.8];

pub struct EntitiesPlugin;

impl Plugin for EntitiesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppPhase::Running),
            (spawn_school, spawn_squid, spawn_floor, spawn_cage, spawn_water),
        );
    }
}

/// Rotating pivot at the origin holding one fish model
#[derive(Component, Debug)]
pub struct FishPivot {
    pub index: usize,
}

/// Pivot of the squid, rotated about its own Y axis
#[derive(Component, Debug)]
pub struct SquidPivot {
    pub step: f32,
}

#[derive(Component)]
pub struct Floor;

#[derive(Component)]
pub struct Cage;

/// Parent of both water shells
#[derive(Component, Debug)]
pub struct WaterGroup {
    pub step: f32,
}

#[derive(Component)]
pub struct WaterShell;

/// Spawn `template` as children of `parent`. Models receive shadows but
/// cast none.
fn spawn_template(parent: &mut ChildSpawnerCommands, template: &ModelTemplate) {
    for part in &template.parts {
        parent.spawn((
            Mesh3d(part.mesh.clone()),
            MeshMaterial3d(part.material.clone()),
            NotShadowCaster,
        ));
    }
}

fn fish_model_transform(fish: &Fish) -> Transform {
    let [x, y, z] = fish.rotation;
    Transform {
        translation: Vec3::from_array(fish.position),
        rotation: Quat::from_euler(EulerRot::XYZ, x, y, z),
        scale: Vec3::splat(fish.scale),
    }
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn spawn_school(mut commands: Commands, templates: Res<Templates>, state: Res<AquariumState>) {
    for (index, fish) in state.school().iter().enumerate() {
        commands
            .spawn((
                Transform::IDENTITY,
                visibility(fish.visible),
                FishPivot { index },
            ))
            .with_children(|pivot| {
                pivot
                    .spawn((fish_model_transform(fish), Visibility::Inherited))
                    .with_children(|model| spawn_template(model, &templates.fish));
            });
    }

    tracing::info!(
        fish = state.school().len(),
        visible = state.school().visible_count(),
        "Fish school spawned"
    );
}

fn spawn_squid(
    mut commands: Commands,
    templates: Res<Templates>,
    state: Res<AquariumState>,
    config: Res<SceneConfig>,
) {
    let squid = &config.squid;
    commands
        .spawn((
            Transform::from_translation(Vec3::from_array(squid.position))
                .with_rotation(Quat::from_rotation_x(squid.tilt)),
            visibility(state.squid_visible()),
            SquidPivot {
                step: squid.rotate_step,
            },
        ))
        .with_children(|pivot| {
            pivot
                .spawn((
                    Transform::from_translation(Vec3::from_array(squid.model_offset))
                        .with_scale(Vec3::splat(squid.scale)),
                    Visibility::Inherited,
                ))
                .with_children(|model| spawn_template(model, &templates.squid));
        });
}

fn spawn_floor(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    state: Res<AquariumState>,
    config: Res<SceneConfig>,
) {
    let size = config.mirror.size;
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(size, size))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: FLOOR_COLOR,
            perceptual_roughness: 0.2,
            metallic: 0.2,
            ..default()
        })),
        Transform::from_xyz(0.0, config.mirror.height, 0.0),
        visibility(state.floor_visible()),
        NotShadowCaster,
        Floor,
    ));
}

/// UV sphere with tangents for normal mapping
fn sphere_mesh(radius: f32) -> Mesh {
    let mesh = Sphere::new(radius)
        .mesh()
        .uv(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
    match mesh.clone().with_generated_tangents() {
        Ok(mesh) => mesh,
        Err(err) => {
            tracing::warn!(%err, "Could not generate sphere tangents");
            mesh
        }
    }
}

fn tiled(repeat: [f32; 2]) -> Affine2 {
    Affine2::from_scale(Vec2::from_array(repeat))
}

fn spawn_cage(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<SceneConfig>,
) {
    let set = TextureSet::glass(&config.assets.glass_dir);
    let maps = SurfaceMaps::load(&asset_server, &set);

    let material = materials.add(StandardMaterial {
        base_color_texture: maps.get(MapKind::BaseColor),
        occlusion_texture: maps.get(MapKind::AmbientOcclusion),
        normal_map_texture: maps.get(MapKind::Normal),
        perceptual_roughness: 0.3,
        metallic: 0.7,
        alpha_mode: AlphaMode::Blend,
        double_sided: true,
        cull_mode: None,
        uv_transform: tiled(set.repeat),
        ..default()
    });

    let mut cage = commands.spawn((
        Mesh3d(meshes.add(sphere_mesh(1.0))),
        MeshMaterial3d(material.clone()),
        Transform::IDENTITY,
        Cage,
    ));
    if let Some(packing) = maps.channel_packing(material) {
        cage.insert(packing);
    }
}

fn spawn_water(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<SceneConfig>,
) {
    let set = TextureSet::water(&config.assets.water_dir);
    let maps = SurfaceMaps::load(&asset_server, &set);

    let material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 0.5),
        base_color_texture: maps.get(MapKind::BaseColor),
        occlusion_texture: maps.get(MapKind::AmbientOcclusion),
        normal_map_texture: maps.get(MapKind::Normal),
        perceptual_roughness: 0.3,
        metallic: 1.0,
        alpha_mode: AlphaMode::Blend,
        double_sided: true,
        cull_mode: None,
        uv_transform: tiled(set.repeat),
        ..default()
    });

    let mut group = commands.spawn((
        Transform::IDENTITY,
        Visibility::Inherited,
        WaterGroup {
            step: WATER_ROTATE_STEP,
        },
    ));
    if let Some(packing) = maps.channel_packing(material.clone()) {
        group.insert(packing);
    }

    group.with_children(|parent| {
        for radius in WATER_RADII {
            let mesh = meshes.add(sphere_mesh(radius));
            let mut shell = parent.spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
                NotShadowCaster,
                WaterShell,
            ));
            if !set.displaces() {
                continue;
            }
            if let Some(height) = maps.get(MapKind::Height) {
                shell.insert(PendingDisplacement {
                    mesh,
                    height,
                    repeat: set.repeat,
                    scale: set.displacement_scale,
                    bias: set.displacement_bias,
                });
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::TemplatePart;
    use aquarium_core::{Aquarium, AquariumConfig};

    fn template(parts: usize) -> ModelTemplate {
        ModelTemplate {
            parts: (0..parts)
                .map(|_| TemplatePart {
                    mesh: Handle::default(),
                    material: Handle::default(),
                })
                .collect(),
            triangles: 0,
        }
    }

    #[test]
    fn test_models_cast_no_shadows() {
        let mut config = AquariumConfig::default();
        config.fish.max = 12;
        config.fish.initial_visible = 4;
        config.fish.seed = Some(3);

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(AquariumState(Aquarium::from_config(&config)))
            .insert_resource(SceneConfig(config))
            .insert_resource(Templates {
                fish: template(2),
                squid: template(1),
            })
            .add_systems(Update, (spawn_school, spawn_squid));
        app.update();

        let parts: Vec<bool> = app
            .world_mut()
            .query::<(&Mesh3d, Has<NotShadowCaster>)>()
            .iter(app.world())
            .map(|(_, not_caster)| not_caster)
            .collect();
        assert_eq!(parts.len(), 12 * 2 + 1);
        assert!(parts.iter().all(|&not_caster| not_caster));
    }

    #[test]
    fn test_fish_model_transform() {
        let fish = Fish {
            scale: 0.02,
            position: [0.5, -0.25, 0.0],
            rotation: [std::f32::consts::FRAC_PI_2, std::f32::consts::PI, 0.0],
            speed: 0.01,
            base_speed: 0.01,
            visible: true,
        };
        let transform = fish_model_transform(&fish);
        assert_eq!(transform.translation, Vec3::new(0.5, -0.25, 0.0));
        assert_eq!(transform.scale, Vec3::splat(0.02));

        // Model +Y ends up along world +Z
        let up = transform.rotation * Vec3::Y;
        assert!((up - Vec3::Z).length() < 1e-5, "{up:?}");
    }
}
