//! Tiled surface textures, channel packing and height displacement
//!
//! Surface maps load with a repeating sampler. Once their pixels are in,
//! the separate roughness, metalness and opacity maps are folded into the
//! channels the PBR material reads, and height maps displace the meshes.

use aquarium_core::textures::{merge_opacity, pack_metallic_roughness};
use aquarium_core::{HeightField, MapKind, TextureError, TextureSet};
use bevy::asset::{LoadState, RenderAssetUsages};
use bevy::image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor};
use bevy::mesh::VertexAttributeValues;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use std::collections::HashMap;

pub struct SurfaceTexturePlugin;

impl Plugin for SurfaceTexturePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (pack_surface_maps, displace_meshes));
    }
}

fn repeat_sampler() -> ImageSampler {
    ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::Repeat,
        ..ImageSamplerDescriptor::linear()
    })
}

/// Handles of one surface's maps
#[derive(Debug, Clone, Default)]
pub struct SurfaceMaps {
    handles: HashMap<MapKind, Handle<Image>>,
}

impl SurfaceMaps {
    /// Start loading every map of `set` with a repeating sampler
    pub fn load(asset_server: &AssetServer, set: &TextureSet) -> Self {
        let handles = set
            .maps
            .iter()
            .map(|map| {
                let is_srgb = map.kind.is_color();
                let handle = asset_server.load_with_settings(
                    map.path.clone(),
                    move |settings: &mut ImageLoaderSettings| {
                        settings.is_srgb = is_srgb;
                        settings.sampler = repeat_sampler();
                    },
                );
                (map.kind, handle)
            })
            .collect();
        Self { handles }
    }

    pub fn get(&self, kind: MapKind) -> Option<Handle<Image>> {
        self.handles.get(&kind).cloned()
    }

    /// Packing work for `material`, if the surface has a roughness map
    pub fn channel_packing(&self, material: Handle<StandardMaterial>) -> Option<PendingChannelPacking> {
        Some(PendingChannelPacking {
            material,
            roughness: self.get(MapKind::Roughness)?,
            metallic: self.get(MapKind::Metallic),
            color: self.get(MapKind::BaseColor),
            opacity: self.get(MapKind::Opacity),
        })
    }
}

/// Maps to fold into `material` once loaded
#[derive(Component, Debug, Clone)]
pub struct PendingChannelPacking {
    pub material: Handle<StandardMaterial>,
    pub roughness: Handle<Image>,
    pub metallic: Option<Handle<Image>>,
    pub color: Option<Handle<Image>>,
    pub opacity: Option<Handle<Image>>,
}

impl PendingChannelPacking {
    fn handles(&self) -> impl Iterator<Item = &Handle<Image>> {
        std::iter::once(&self.roughness)
            .chain(self.metallic.as_ref())
            .chain(self.color.as_ref())
            .chain(self.opacity.as_ref())
    }
}

/// Height map to apply to `mesh` once loaded
#[derive(Component, Debug, Clone)]
pub struct PendingDisplacement {
    pub mesh: Handle<Mesh>,
    pub height: Handle<Image>,
    pub repeat: [f32; 2],
    pub scale: f32,
    pub bias: f32,
}

enum Readiness {
    Ready,
    Waiting,
    Failed,
}

fn readiness<'a>(
    handles: impl IntoIterator<Item = &'a Handle<Image>>,
    images: &Assets<Image>,
    asset_server: &AssetServer,
) -> Readiness {
    let mut waiting = false;
    for handle in handles {
        if images.contains(handle) {
            continue;
        }
        if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle.id()) {
            tracing::warn!(%err, "Surface map failed to load");
            return Readiness::Failed;
        }
        waiting = true;
    }
    if waiting {
        Readiness::Waiting
    } else {
        Readiness::Ready
    }
}

/// `image` in `format`, converting when it differs
fn converted(image: &Image, format: TextureFormat) -> Option<Image> {
    if image.texture_descriptor.format == format {
        Some(image.clone())
    } else {
        image.convert(format)
    }
}

fn rgba8_data(image: &Image) -> Option<Vec<u8>> {
    converted(image, TextureFormat::Rgba8Unorm)?.data
}

fn pack_surface_maps(
    mut commands: Commands,
    pending: Query<(Entity, &PendingChannelPacking)>,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    asset_server: Res<AssetServer>,
) {
    for (entity, packing) in &pending {
        match readiness(packing.handles(), &images, &asset_server) {
            Readiness::Waiting => continue,
            Readiness::Failed => {
                commands.entity(entity).remove::<PendingChannelPacking>();
                continue;
            }
            Readiness::Ready => {}
        }

        if let Err(err) = apply_packing(packing, &mut images, &mut materials) {
            tracing::warn!(%err, "Could not pack surface maps");
        }
        commands.entity(entity).remove::<PendingChannelPacking>();
    }
}

fn apply_packing(
    packing: &PendingChannelPacking,
    images: &mut Assets<Image>,
    materials: &mut Assets<StandardMaterial>,
) -> Result<(), TextureError> {
    let Some(roughness) = images.get(&packing.roughness) else {
        return Ok(());
    };
    let size = roughness.texture_descriptor.size;
    let rough = rgba8_data(roughness).unwrap_or_default();
    let metal = packing
        .metallic
        .as_ref()
        .and_then(|h| images.get(h))
        .and_then(rgba8_data);

    let packed = pack_metallic_roughness(&rough, metal.as_deref())?;
    let mut metallic_roughness = Image::new(
        Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        packed,
        TextureFormat::Rgba8Unorm,
        RenderAssetUsages::RENDER_WORLD,
    );
    metallic_roughness.sampler = repeat_sampler();
    let metallic_roughness = images.add(metallic_roughness);

    let mut color_with_alpha = None;
    if let (Some(color), Some(opacity)) = (&packing.color, &packing.opacity) {
        let color = images
            .get(color)
            .and_then(|image| converted(image, TextureFormat::Rgba8UnormSrgb));
        let opacity = images.get(opacity).and_then(rgba8_data);
        if let (Some(mut color), Some(opacity)) = (color, opacity) {
            if let Some(data) = color.data.as_mut() {
                merge_opacity(data, &opacity)?;
            }
            color.sampler = repeat_sampler();
            color_with_alpha = Some(images.add(color));
        }
    }

    if let Some(material) = materials.get_mut(&packing.material) {
        material.metallic_roughness_texture = Some(metallic_roughness);
        if let Some(color) = color_with_alpha {
            material.base_color_texture = Some(color);
        }
    }
    tracing::debug!(
        width = size.width,
        height = size.height,
        opacity = packing.opacity.is_some(),
        "Packed surface maps"
    );
    Ok(())
}

fn displace_meshes(
    mut commands: Commands,
    pending: Query<(Entity, &PendingDisplacement)>,
    images: Res<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    asset_server: Res<AssetServer>,
) {
    for (entity, displacement) in &pending {
        match readiness([&displacement.height], &images, &asset_server) {
            Readiness::Waiting => continue,
            Readiness::Failed => {
                commands.entity(entity).remove::<PendingDisplacement>();
                continue;
            }
            Readiness::Ready => {}
        }

        let field = images.get(&displacement.height).and_then(|image| {
            let data = rgba8_data(image)?;
            match HeightField::from_rgba8(image.width(), image.height(), &data) {
                Ok(field) => Some(field),
                Err(err) => {
                    tracing::warn!(%err, "Unusable height map");
                    None
                }
            }
        });

        if let (Some(field), Some(mesh)) = (field, meshes.get_mut(&displacement.mesh)) {
            displace_mesh(mesh, &field, displacement);
        }
        commands.entity(entity).remove::<PendingDisplacement>();
    }
}

fn displace_mesh(mesh: &mut Mesh, field: &HeightField, displacement: &PendingDisplacement) {
    let normals = match mesh.attribute(Mesh::ATTRIBUTE_NORMAL) {
        Some(VertexAttributeValues::Float32x3(normals)) => normals.clone(),
        _ => return,
    };
    let uvs = match mesh.attribute(Mesh::ATTRIBUTE_UV_0) {
        Some(VertexAttributeValues::Float32x2(uvs)) => uvs.clone(),
        _ => return,
    };
    if let Some(VertexAttributeValues::Float32x3(positions)) =
        mesh.attribute_mut(Mesh::ATTRIBUTE_POSITION)
    {
        field.displace(
            positions,
            &normals,
            &uvs,
            displacement.repeat,
            displacement.scale,
            displacement.bias,
        );
    }
}
