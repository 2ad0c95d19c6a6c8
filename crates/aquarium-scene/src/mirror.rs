//! Mirror floor and the reflective entity registry
//!
//! A reflective entity is a mesh whose material samples an image written by
//! a camera sitting at the mesh. The mesh lives on [`MIRROR_LAYER`], which
//! its own camera does not render, so it never shows up in its reflection.

use bevy::asset::RenderAssetUsages;
use bevy::camera::visibility::RenderLayers;
use bevy::camera::RenderTarget;
use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages};

use crate::loading::AppPhase;
use crate::state::{AquariumState, SceneConfig};

/// Render layer of reflective meshes
pub const MIRROR_LAYER: usize = 1;

/// Share of the reflection in the mirror color; the rest is the tint
const REFLECTIVITY: f32 = 0.95;
const MIRROR_TINT: [f32; 3] = [0.4, 0.4, 0.6];

pub struct MirrorPlugin;

impl Plugin for MirrorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ReflectiveEntities>()
            .add_systems(OnEnter(AppPhase::Running), spawn_mirror);
    }
}

/// Pivot holding the mirror mesh and its camera
#[derive(Component)]
pub struct MirrorPivot;

#[derive(Component)]
pub struct ReflectiveCamera;

/// One reflective mesh, the camera feeding it and the image between them
#[derive(Debug, Clone)]
pub struct Reflector {
    pub mesh: Entity,
    pub camera: Entity,
    pub target: Handle<Image>,
}

/// Every reflective entity in the scene
#[derive(Resource, Debug, Default)]
pub struct ReflectiveEntities {
    reflectors: Vec<Reflector>,
}

impl ReflectiveEntities {
    pub fn register(&mut self, reflector: Reflector) {
        self.reflectors.push(reflector);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reflector> {
        self.reflectors.iter()
    }

    pub fn len(&self) -> usize {
        self.reflectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reflectors.is_empty()
    }
}

fn render_target(resolution: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.texture_descriptor.usage = TextureUsages::TEXTURE_BINDING
        | TextureUsages::COPY_DST
        | TextureUsages::RENDER_ATTACHMENT;
    image
}

fn mirror_color() -> Color {
    let [r, g, b] = MIRROR_TINT.map(|c| REFLECTIVITY + (1.0 - REFLECTIVITY) * c);
    Color::srgb(r, g, b)
}

fn spawn_mirror(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut reflective: ResMut<ReflectiveEntities>,
    state: Res<AquariumState>,
    config: Res<SceneConfig>,
) {
    let mirror = &config.mirror;
    let target = images.add(render_target(mirror.resolution));

    let material = materials.add(StandardMaterial {
        base_color: mirror_color(),
        base_color_texture: Some(target.clone()),
        unlit: true,
        ..default()
    });

    let visibility = if state.mirror_mode() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    let pivot = commands
        .spawn((
            Transform::from_xyz(0.0, mirror.height, 0.0),
            visibility,
            MirrorPivot,
        ))
        .id();

    let mesh = commands
        .spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(mirror.size, mirror.size))),
            MeshMaterial3d(material),
            NotShadowCaster,
            RenderLayers::layer(MIRROR_LAYER),
            ChildOf(pivot),
        ))
        .id();

    // Looks straight up from the mirror; the scene above is what it reflects
    let camera = commands
        .spawn((
            Camera3d::default(),
            Camera {
                target: RenderTarget::Image(target.clone().into()),
                order: -1,
                is_active: state.mirror_mode(),
                clear_color: ClearColorConfig::Custom(Color::BLACK),
                ..default()
            },
            Projection::Perspective(PerspectiveProjection {
                fov: std::f32::consts::FRAC_PI_2,
                aspect_ratio: 1.0,
                near: mirror.near,
                far: mirror.far,
                ..default()
            }),
            Transform::IDENTITY.looking_at(Vec3::Y, Vec3::Z),
            RenderLayers::layer(0),
            ReflectiveCamera,
            ChildOf(pivot),
        ))
        .id();

    reflective.register(Reflector {
        mesh,
        camera,
        target,
    });
    tracing::info!(
        resolution = mirror.resolution,
        reflectors = reflective.len(),
        "Mirror spawned"
    );
}
