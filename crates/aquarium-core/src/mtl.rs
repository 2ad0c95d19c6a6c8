//! Wavefront MTL material library parsing

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MtlError {
    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },
    #[error("line {line}: '{keyword}' expects at least {expected} values")]
    MissingValues {
        line: usize,
        keyword: String,
        expected: usize,
    },
    #[error("line {line}: '{keyword}' appears before any newmtl")]
    NoMaterial { line: usize, keyword: String },
}

/// One `newmtl` block
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescription {
    pub name: String,
    /// Kd
    pub diffuse: [f32; 3],
    /// Ks
    pub specular: [f32; 3],
    /// Ke
    pub emissive: [f32; 3],
    /// Ns
    pub shininess: f32,
    /// d, or 1 - Tr
    pub opacity: f32,
    /// Illumination model, 0 is color only and 1 has no highlights
    pub illum: Option<u32>,
    /// map_Kd
    pub diffuse_map: Option<String>,
    /// map_d
    pub opacity_map: Option<String>,
}

impl MaterialDescription {
    fn new(name: String) -> Self {
        Self {
            name,
            diffuse: [1.0, 1.0, 1.0],
            specular: [0.0, 0.0, 0.0],
            emissive: [0.0, 0.0, 0.0],
            shininess: 0.0,
            opacity: 1.0,
            illum: None,
            diffuse_map: None,
            opacity_map: None,
        }
    }

    /// Perceptual roughness equivalent of the Blinn-Phong exponent
    pub fn roughness(&self) -> f32 {
        (2.0 / (self.shininess.max(0.0) + 2.0)).sqrt().clamp(0.089, 1.0)
    }

    /// Mean of Ks, or zero for models without highlights
    pub fn specular_strength(&self) -> f32 {
        match self.illum {
            Some(0 | 1) => 0.0,
            _ => (self.specular.iter().sum::<f32>() / 3.0).clamp(0.0, 1.0),
        }
    }

    /// `illum 0` asks for the flat diffuse color with no lighting
    pub fn is_unlit(&self) -> bool {
        self.illum == Some(0)
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0 || self.opacity_map.is_some()
    }

    /// Parse every material in an MTL file
    pub fn parse_library(source: &str) -> Result<Vec<Self>, MtlError> {
        let mut materials: Vec<MaterialDescription> = Vec::new();

        for (index, raw) in source.lines().enumerate() {
            let number = index + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            let Some((keyword, rest)) = split_keyword(line) else {
                continue;
            };

            if keyword == "newmtl" {
                materials.push(Self::new(rest.to_string()));
                continue;
            }

            let known = matches!(
                keyword,
                "Kd" | "Ks" | "Ke" | "Ns" | "d" | "Tr" | "illum" | "map_Kd" | "map_d"
            );
            if !known {
                continue;
            }

            let Some(material) = materials.last_mut() else {
                return Err(MtlError::NoMaterial {
                    line: number,
                    keyword: keyword.to_string(),
                });
            };

            match keyword {
                "Kd" => material.diffuse = parse_color(number, keyword, rest)?,
                "Ks" => material.specular = parse_color(number, keyword, rest)?,
                "Ke" => material.emissive = parse_color(number, keyword, rest)?,
                "Ns" => material.shininess = parse_scalar(number, keyword, rest)?,
                "d" => material.opacity = parse_scalar(number, keyword, rest)?,
                "Tr" => material.opacity = 1.0 - parse_scalar(number, keyword, rest)?,
                "illum" => material.illum = Some(parse_scalar(number, keyword, rest)? as u32),
                "map_Kd" => material.diffuse_map = map_path(rest),
                "map_d" => material.opacity_map = map_path(rest),
                _ => {}
            }
        }

        Ok(materials)
    }
}

fn split_keyword(line: &str) -> Option<(&str, &str)> {
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => Some((keyword, rest.trim())),
        None => Some((line, "")),
    }
}

fn parse_values(number: usize, rest: &str) -> Result<Vec<f32>, MtlError> {
    rest.split_whitespace()
        .map(|value| {
            value.parse().map_err(|_| MtlError::InvalidNumber {
                line: number,
                value: value.to_string(),
            })
        })
        .collect()
}

fn parse_scalar(number: usize, keyword: &str, rest: &str) -> Result<f32, MtlError> {
    parse_values(number, rest)?
        .first()
        .copied()
        .ok_or_else(|| MtlError::MissingValues {
            line: number,
            keyword: keyword.to_string(),
            expected: 1,
        })
}

/// Colors accept one value (grey) or three
fn parse_color(number: usize, keyword: &str, rest: &str) -> Result<[f32; 3], MtlError> {
    match parse_values(number, rest)?.as_slice() {
        [r, g, b, ..] => Ok([*r, *g, *b]),
        [v] => Ok([*v, *v, *v]),
        _ => Err(MtlError::MissingValues {
            line: number,
            keyword: keyword.to_string(),
            expected: 3,
        }),
    }
}

/// Texture paths are the last token; options such as `-bm 1.0` precede it
fn map_path(rest: &str) -> Option<String> {
    rest.split_whitespace()
        .last()
        .map(|path| path.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"
# Blender MTL File
newmtl Body
Ns 96.078431
Ka 1.000000 1.000000 1.000000
Kd 0.640000 0.640000 0.640000
Ks 0.500000 0.500000 0.500000
Ke 0.0 0.0 0.0
d 1.000000
illum 2
map_Kd 13007_Blue-Green_Reef_Chromis_v2_diff.jpg
map_Bump -bm 0.5 textures\fish_bump.png

newmtl Fins
Kd 0.2
Tr 0.25
"#;

    #[test]
    fn test_parse_library() {
        let materials = MaterialDescription::parse_library(LIBRARY).unwrap();
        assert_eq!(materials.len(), 2);

        let body = &materials[0];
        assert_eq!(body.name, "Body");
        assert_eq!(body.diffuse, [0.64, 0.64, 0.64]);
        assert_eq!(body.illum, Some(2));
        assert_eq!(
            body.diffuse_map.as_deref(),
            Some("13007_Blue-Green_Reef_Chromis_v2_diff.jpg")
        );
        assert_eq!(body.specular, [0.5, 0.5, 0.5]);
        assert!((body.specular_strength() - 0.5).abs() < 1e-6);
        assert!(!body.is_unlit());
        assert!(!body.is_transparent());

        let fins = &materials[1];
        assert_eq!(fins.diffuse, [0.2, 0.2, 0.2]);
        assert!((fins.opacity - 0.75).abs() < 1e-6);
        assert!(fins.is_transparent());
        assert_eq!(fins.diffuse_map, None);
        assert_eq!(fins.specular_strength(), 0.0);
    }

    #[test]
    fn test_illum_model_controls_highlights() {
        let source = "newmtl Flat\nKs 1 1 1\nillum 0\nnewmtl Matte\nKs 1 1 1\nillum 1\n";
        let materials = MaterialDescription::parse_library(source).unwrap();

        assert!(materials[0].is_unlit());
        assert_eq!(materials[0].specular_strength(), 0.0);
        assert!(!materials[1].is_unlit());
        assert_eq!(materials[1].specular_strength(), 0.0);
    }

    #[test]
    fn test_roughness_from_shininess() {
        let mut material = MaterialDescription::new("m".to_string());
        material.shininess = 0.0;
        assert_eq!(material.roughness(), 1.0);
        material.shininess = 1000.0;
        assert!(material.roughness() < 0.1);
    }

    #[test]
    fn test_property_before_newmtl() {
        let err = MaterialDescription::parse_library("Kd 1 1 1\n").unwrap_err();
        assert_eq!(
            err,
            MtlError::NoMaterial {
                line: 1,
                keyword: "Kd".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_statements_are_ignored() {
        let source = "Ni 1.45\nnewmtl A\nNi 1.45\nrefl sphere.png\n";
        let materials = MaterialDescription::parse_library(source).unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].name, "A");
    }
}
