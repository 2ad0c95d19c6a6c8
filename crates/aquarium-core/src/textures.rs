//! Texture set descriptions and CPU-side map processing
//!
//! The cage and water surfaces use separate greyscale maps for roughness,
//! metalness, opacity and height. PBR materials want roughness and
//! metalness packed into one texture and opacity in the base color alpha,
//! so the maps are combined here once their pixels are available. Height
//! maps displace sphere vertices along their normals.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TextureError {
    #[error("{what} has {len} bytes, not a whole number of RGBA8 pixels")]
    NotRgba8 { what: &'static str, len: usize },
    #[error("{what} has {actual} pixels, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("height map of {width}x{height} needs {expected} bytes, got {actual}")]
    BadHeightField {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    BaseColor,
    AmbientOcclusion,
    Height,
    Normal,
    Roughness,
    Metallic,
    Opacity,
}

impl MapKind {
    /// Only the base color map holds sRGB data
    pub fn is_color(self) -> bool {
        self == MapKind::BaseColor
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureMap {
    pub kind: MapKind,
    pub path: String,
}

/// The maps of one surface and how they tile
#[derive(Debug, Clone, PartialEq)]
pub struct TextureSet {
    pub maps: Vec<TextureMap>,
    /// UV repeat factors
    pub repeat: [f32; 2],
    /// Height map multiplier, world units
    pub displacement_scale: f32,
    /// Offset added to every displaced vertex
    pub displacement_bias: f32,
}

impl TextureSet {
    /// Glass window set for the cage
    pub fn glass(dir: &str) -> Self {
        let dir = dir.trim_end_matches('/');
        let maps = [
            (MapKind::BaseColor, "Glass_window_002_basecolor.jpg"),
            (MapKind::AmbientOcclusion, "Glass_Window_002_ambientOcclusion.jpg"),
            (MapKind::Height, "Glass_Window_002_height.png"),
            (MapKind::Normal, "Glass_Window_002_normal.jpg"),
            (MapKind::Roughness, "Glass_Window_002_roughness.jpg"),
            (MapKind::Metallic, "Glass_Window_002_metallic.jpg"),
            (MapKind::Opacity, "Glass_Window_002_opacity.jpg"),
        ];
        Self {
            maps: maps
                .into_iter()
                .map(|(kind, file)| TextureMap {
                    kind,
                    path: format!("{dir}/{file}"),
                })
                .collect(),
            repeat: [4.0, 2.0],
            displacement_scale: 0.0,
            displacement_bias: 0.0,
        }
    }

    /// Water set shared by both water shells
    pub fn water(dir: &str) -> Self {
        let dir = dir.trim_end_matches('/');
        let maps = [
            (MapKind::BaseColor, "Water_002_COLOR.jpg"),
            (MapKind::AmbientOcclusion, "Water_002_OCC.jpg"),
            (MapKind::Height, "Water_002_DISP.png"),
            (MapKind::Normal, "Water_002_NORM.jpg"),
            (MapKind::Roughness, "Water_002_ROUGH.jpg"),
        ];
        Self {
            maps: maps
                .into_iter()
                .map(|(kind, file)| TextureMap {
                    kind,
                    path: format!("{dir}/{file}"),
                })
                .collect(),
            repeat: [7.0, 7.0],
            displacement_scale: 0.1,
            displacement_bias: 0.1,
        }
    }

    pub fn path(&self, kind: MapKind) -> Option<&str> {
        self.maps
            .iter()
            .find(|map| map.kind == kind)
            .map(|map| map.path.as_str())
    }

    pub fn has(&self, kind: MapKind) -> bool {
        self.path(kind).is_some()
    }

    /// Whether the height map moves any vertex
    pub fn displaces(&self) -> bool {
        self.has(MapKind::Height)
            && (self.displacement_scale != 0.0 || self.displacement_bias != 0.0)
    }
}

fn pixel_count(what: &'static str, data: &[u8]) -> Result<usize, TextureError> {
    if data.len() % 4 != 0 {
        return Err(TextureError::NotRgba8 {
            what,
            len: data.len(),
        });
    }
    Ok(data.len() / 4)
}

/// Pack greyscale roughness and metalness maps (RGBA8, red channel read)
/// into a metallic-roughness texture: roughness in green, metalness in blue.
///
/// Without a metalness map the blue channel is full so the material's
/// metallic factor applies unchanged.
pub fn pack_metallic_roughness(
    roughness: &[u8],
    metallic: Option<&[u8]>,
) -> Result<Vec<u8>, TextureError> {
    let pixels = pixel_count("roughness map", roughness)?;
    if let Some(metallic) = metallic {
        let actual = pixel_count("metalness map", metallic)?;
        if actual != pixels {
            return Err(TextureError::SizeMismatch {
                what: "metalness map",
                expected: pixels,
                actual,
            });
        }
    }

    let mut packed = Vec::with_capacity(roughness.len());
    for (index, rough) in roughness.chunks_exact(4).enumerate() {
        let metal = metallic.map_or(u8::MAX, |m| m[index * 4]);
        packed.extend_from_slice(&[0, rough[0], metal, u8::MAX]);
    }
    Ok(packed)
}

/// Copy a greyscale opacity map into the alpha channel of `color`
pub fn merge_opacity(color: &mut [u8], opacity: &[u8]) -> Result<(), TextureError> {
    let expected = pixel_count("base color map", color)?;
    let actual = pixel_count("opacity map", opacity)?;
    if actual != expected {
        return Err(TextureError::SizeMismatch {
            what: "opacity map",
            expected,
            actual,
        });
    }

    for (pixel, alpha) in color.chunks_exact_mut(4).zip(opacity.chunks_exact(4)) {
        pixel[3] = alpha[0];
    }
    Ok(())
}

/// Greyscale height samples in `[0, 1]`, row 0 at the top
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl HeightField {
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, TextureError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(TextureError::BadHeightField {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        let samples = data
            .chunks_exact(4)
            .map(|pixel| f32::from(pixel[0]) / 255.0)
            .collect();
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Nearest sample at `uv`, wrapping outside `[0, 1)`
    pub fn sample(&self, [u, v]: [f32; 2]) -> f32 {
        let x = wrap_texel(u, self.width);
        let y = wrap_texel(v, self.height);
        self.samples[y * self.width as usize + x]
    }

    /// Move each vertex along its normal by `height * scale + bias`,
    /// sampling at the tiled UV.
    pub fn displace(
        &self,
        positions: &mut [[f32; 3]],
        normals: &[[f32; 3]],
        uvs: &[[f32; 2]],
        repeat: [f32; 2],
        scale: f32,
        bias: f32,
    ) {
        for ((position, normal), uv) in positions.iter_mut().zip(normals).zip(uvs) {
            let offset = self.sample([uv[0] * repeat[0], uv[1] * repeat[1]]) * scale + bias;
            for (coord, n) in position.iter_mut().zip(normal) {
                *coord += n * offset;
            }
        }
    }
}

fn wrap_texel(coord: f32, size: u32) -> usize {
    let wrapped = coord.rem_euclid(1.0);
    ((wrapped * size as f32) as usize).min(size as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey(values: &[u8]) -> Vec<u8> {
        values.iter().flat_map(|&v| [v, v, v, 255]).collect()
    }

    #[test]
    fn test_texture_sets() {
        let glass = TextureSet::glass("image/glass/");
        assert_eq!(glass.maps.len(), 7);
        assert_eq!(glass.repeat, [4.0, 2.0]);
        assert_eq!(
            glass.path(MapKind::Opacity),
            Some("image/glass/Glass_Window_002_opacity.jpg")
        );
        assert!(!glass.displaces());

        let water = TextureSet::water("image/water");
        assert_eq!(water.maps.len(), 5);
        assert_eq!(water.repeat, [7.0, 7.0]);
        assert!(!water.has(MapKind::Metallic));
        assert!(!water.has(MapKind::Opacity));
        assert!(water.displaces());
        assert!(MapKind::BaseColor.is_color());
        assert!(!MapKind::Normal.is_color());
    }

    #[test]
    fn test_pack_metallic_roughness() {
        let packed = pack_metallic_roughness(&grey(&[10, 20]), Some(&grey(&[200, 100]))).unwrap();
        assert_eq!(packed, vec![0, 10, 200, 255, 0, 20, 100, 255]);

        let packed = pack_metallic_roughness(&grey(&[77]), None).unwrap();
        assert_eq!(packed, vec![0, 77, 255, 255]);
    }

    #[test]
    fn test_pack_rejects_mismatched_maps() {
        let err = pack_metallic_roughness(&grey(&[1, 2]), Some(&grey(&[3]))).unwrap_err();
        assert_eq!(
            err,
            TextureError::SizeMismatch {
                what: "metalness map",
                expected: 2,
                actual: 1
            }
        );
        assert!(matches!(
            pack_metallic_roughness(&[0, 0, 0], None),
            Err(TextureError::NotRgba8 { len: 3, .. })
        ));
    }

    #[test]
    fn test_merge_opacity() {
        let mut color = vec![1, 2, 3, 255, 4, 5, 6, 255];
        merge_opacity(&mut color, &grey(&[128, 0])).unwrap();
        assert_eq!(color, vec![1, 2, 3, 128, 4, 5, 6, 0]);
        assert!(merge_opacity(&mut color, &grey(&[1])).is_err());
    }

    #[test]
    fn test_height_field_wraps() {
        let field = HeightField::from_rgba8(2, 1, &grey(&[0, 255])).unwrap();
        assert_eq!(field.sample([0.25, 0.5]), 0.0);
        assert_eq!(field.sample([0.75, 0.5]), 1.0);
        assert_eq!(field.sample([1.75, 3.5]), 1.0);
        assert_eq!(field.sample([-0.25, 0.0]), 1.0);
        assert!(HeightField::from_rgba8(3, 1, &grey(&[0, 255])).is_err());
    }

    #[test]
    fn test_displace_along_normals() {
        let field = HeightField::from_rgba8(1, 1, &grey(&[255])).unwrap();
        let mut positions = [[0.0, 0.8, 0.0], [0.8, 0.0, 0.0]];
        let normals = [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
        let uvs = [[0.1, 0.1], [0.9, 0.9]];
        field.displace(&mut positions, &normals, &uvs, [7.0, 7.0], 0.1, 0.1);

        assert!((positions[0][1] - 1.0).abs() < 1e-6);
        assert!((positions[1][0] - 1.0).abs() < 1e-6);
        assert_eq!(positions[0][0], 0.0);
    }
}
