//! Wavefront OBJ and MTL asset loaders

use aquarium_core::{MaterialDescription, MtlError, ObjError, ObjGroup, ObjModel};
use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext, RenderAssetUsages};
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Plugin registering the Wavefront asset types and loaders
pub struct WavefrontPlugin;

impl Plugin for WavefrontPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<WavefrontModel>()
            .init_asset::<MaterialLibrary>()
            .register_asset_loader(ObjLoader)
            .register_asset_loader(MtlLoader);
    }
}

#[derive(Error, Debug)]
pub enum WavefrontLoaderError {
    #[error("Could not read asset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Asset is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid OBJ: {0}")]
    Obj(#[from] ObjError),
    #[error("Invalid MTL: {0}")]
    Mtl(#[from] MtlError),
}

/// One mesh of a loaded OBJ and the material name it was drawn with
#[derive(Debug, Clone)]
pub struct ModelPart {
    pub mesh: Handle<Mesh>,
    pub material: Option<String>,
}

/// A loaded OBJ file, one part per material group
#[derive(Asset, TypePath, Debug)]
pub struct WavefrontModel {
    pub parts: Vec<ModelPart>,
    pub triangles: usize,
}

/// Materials of a loaded MTL file by name
#[derive(Asset, TypePath, Debug, Default)]
pub struct MaterialLibrary {
    pub materials: HashMap<String, Handle<StandardMaterial>>,
}

#[derive(Default, TypePath)]
pub struct ObjLoader;

impl AssetLoader for ObjLoader {
    type Asset = WavefrontModel;
    type Settings = ();
    type Error = WavefrontLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let model = ObjModel::parse(&String::from_utf8(bytes)?)?;

        let parts = model
            .groups
            .iter()
            .enumerate()
            .map(|(index, group)| ModelPart {
                mesh: load_context.add_labeled_asset(format!("Mesh{index}"), group_mesh(group)),
                material: group.material.clone(),
            })
            .collect();

        tracing::debug!(
            path = %load_context.path().display(),
            groups = model.groups.len(),
            vertices = model.vertex_count(),
            triangles = model.triangle_count(),
            bounds = ?model.bounds(),
            libraries = ?model.material_libraries,
            "Parsed OBJ"
        );

        Ok(WavefrontModel {
            parts,
            triangles: model.triangle_count(),
        })
    }

    fn extensions(&self) -> &[&str] {
        &["obj"]
    }
}

#[derive(Default, TypePath)]
pub struct MtlLoader;

impl AssetLoader for MtlLoader {
    type Asset = MaterialLibrary;
    type Settings = ();
    type Error = WavefrontLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let descriptions = MaterialDescription::parse_library(&String::from_utf8(bytes)?)?;

        // Texture paths are relative to the library file
        let dir = load_context
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut materials = HashMap::new();
        for description in &descriptions {
            let texture = description
                .diffuse_map
                .as_ref()
                .map(|file| load_context.load(dir.join(file)));
            let material = standard_material(description, texture);
            let handle =
                load_context.add_labeled_asset(format!("Material{}", description.name), material);
            materials.insert(description.name.clone(), handle);
        }

        tracing::debug!(
            path = %load_context.path().display(),
            materials = materials.len(),
            "Parsed MTL"
        );

        Ok(MaterialLibrary { materials })
    }

    fn extensions(&self) -> &[&str] {
        &["mtl"]
    }
}

/// Triangle mesh for one OBJ group. OBJ texture coordinates start at the
/// bottom left, Bevy's at the top left.
pub fn group_mesh(group: &ObjGroup) -> Mesh {
    let uvs: Vec<[f32; 2]> = group.uvs.iter().map(|[u, v]| [*u, 1.0 - *v]).collect();

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, group.positions.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, group.normals.clone())
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(group.indices.clone()))
}

/// PBR approximation of a Blinn-Phong MTL material
pub fn standard_material(
    description: &MaterialDescription,
    texture: Option<Handle<Image>>,
) -> StandardMaterial {
    let [r, g, b] = description.diffuse;
    let [er, eg, eb] = description.emissive;

    StandardMaterial {
        base_color: Color::srgba(r, g, b, description.opacity),
        base_color_texture: texture,
        emissive: LinearRgba::rgb(er, eg, eb),
        perceptual_roughness: description.roughness(),
        reflectance: description.specular_strength(),
        metallic: 0.0,
        unlit: description.is_unlit(),
        alpha_mode: if description.is_transparent() {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        ..default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::mesh::VertexAttributeValues;

    const QUAD: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl fin
f 1/1 2/2 3/3 4/4
";

    const LIBRARY: &str = "\
newmtl fin
Kd 0.2 0.4 0.6
Ns 98
Ks 0.5 0.5 0.5
d 0.5
";

    #[test]
    fn test_group_mesh_flips_v() {
        let model = ObjModel::parse(QUAD).unwrap();
        let mesh = group_mesh(&model.groups[0]);

        assert_eq!(mesh.count_vertices(), model.groups[0].positions.len());
        assert_eq!(mesh.indices().map(|i| i.len()), Some(6));
        let Some(VertexAttributeValues::Float32x2(uvs)) = mesh.attribute(Mesh::ATTRIBUTE_UV_0)
        else {
            panic!("missing uvs");
        };
        for (flipped, original) in uvs.iter().zip(&model.groups[0].uvs) {
            assert_eq!(flipped[0], original[0]);
            assert_eq!(flipped[1], 1.0 - original[1]);
        }
    }

    #[test]
    fn test_standard_material_from_mtl() {
        let descriptions = MaterialDescription::parse_library(LIBRARY).unwrap();
        let material = standard_material(&descriptions[0], None);

        assert_eq!(material.base_color, Color::srgba(0.2, 0.4, 0.6, 0.5));
        assert!(matches!(material.alpha_mode, AlphaMode::Blend));
        assert_eq!(material.perceptual_roughness, descriptions[0].roughness());
        assert!(material.base_color_texture.is_none());
        assert_eq!(material.reflectance, 0.5);
        assert!(!material.unlit);
    }

    #[test]
    fn test_flat_mtl_material_is_unlit() {
        let descriptions =
            MaterialDescription::parse_library("newmtl flat\nKs 1 1 1\nillum 0\n").unwrap();
        let material = standard_material(&descriptions[0], None);

        assert!(material.unlit);
        assert_eq!(material.reflectance, 0.0);
        assert!(matches!(material.alpha_mode, AlphaMode::Opaque));
    }
}
