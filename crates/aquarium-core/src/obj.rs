//! Wavefront OBJ geometry parsing
//!
//! Produces one indexed triangle list per material group. Polygons are
//! fan-triangulated, `v/vt/vn` triples are de-duplicated into shared
//! vertices, and smooth normals are generated for groups that carry none.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjError {
    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },
    #[error("line {line}: '{keyword}' expects at least {expected} values")]
    MissingValues {
        line: usize,
        keyword: String,
        expected: usize,
    },
    #[error("line {line}: invalid face vertex '{value}'")]
    InvalidFaceVertex { line: usize, value: String },
    #[error("line {line}: index {index} is out of range")]
    IndexOutOfRange { line: usize, index: i64 },
}

/// Triangles sharing one material
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjGroup {
    /// Material name from the last `usemtl` before these faces
    pub material: Option<String>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates as written in the file (bottom-left origin)
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl ObjGroup {
    fn new(material: Option<String>) -> Self {
        Self {
            material,
            ..Default::default()
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A parsed OBJ file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    /// Material libraries referenced with `mtllib`
    pub material_libraries: Vec<String>,
    pub groups: Vec<ObjGroup>,
}

impl ObjModel {
    pub fn triangle_count(&self) -> usize {
        self.groups.iter().map(ObjGroup::triangle_count).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.groups.iter().map(|g| g.positions.len()).sum()
    }

    /// Axis-aligned bounds over every group, `None` for an empty model
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut points = self.groups.iter().flat_map(|g| g.positions.iter());
        let first = *points.next()?;
        Some(points.fold((first, first), |(mut min, mut max), p| {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
            (min, max)
        }))
    }

    /// Parse OBJ text
    pub fn parse(source: &str) -> Result<Self, ObjError> {
        let mut parser = Parser::default();
        for (number, raw) in source.lines().enumerate() {
            parser.line(number + 1, raw)?;
        }
        Ok(parser.finish())
    }
}

/// Key of a unique face vertex: position, uv and normal indices
type VertexKey = (usize, Option<usize>, Option<usize>);

#[derive(Default)]
struct GroupBuilder {
    group: ObjGroup,
    lookup: HashMap<VertexKey, u32>,
    has_normals: bool,
}

#[derive(Default)]
struct Parser {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    material_libraries: Vec<String>,
    finished: Vec<GroupBuilder>,
    current: Option<GroupBuilder>,
}

impl Parser {
    fn line(&mut self, number: usize, raw: &str) -> Result<(), ObjError> {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            return Ok(());
        }

        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            return Ok(());
        };
        let values: Vec<&str> = parts.collect();

        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(number, keyword, &values)?;
                self.positions.push([x, y, z]);
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(number, keyword, &values)?;
                self.normals.push([x, y, z]);
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(number, keyword, &values)?;
                self.uvs.push([u, v]);
            }
            "f" => {
                if values.len() < 3 {
                    return Err(ObjError::MissingValues {
                        line: number,
                        keyword: keyword.to_string(),
                        expected: 3,
                    });
                }
                self.face(number, &values)?;
            }
            "usemtl" => {
                let name = values.join(" ");
                self.start_group(Some(name));
            }
            "mtllib" => {
                self.material_libraries
                    .extend(values.iter().map(|s| s.to_string()));
            }
            // Object/group names and smoothing groups do not split geometry
            _ => {}
        }

        Ok(())
    }

    fn start_group(&mut self, material: Option<String>) {
        if let Some(current) = self.current.take() {
            if !current.group.is_empty() {
                self.finished.push(current);
            }
        }
        self.current = Some(GroupBuilder {
            group: ObjGroup::new(material),
            ..Default::default()
        });
    }

    fn face(&mut self, number: usize, values: &[&str]) -> Result<(), ObjError> {
        let keys = values
            .iter()
            .map(|v| self.face_vertex(number, v))
            .collect::<Result<Vec<_>, _>>()?;

        if self.current.is_none() {
            self.start_group(None);
        }

        let mut indices = Vec::with_capacity(keys.len());
        for key in keys {
            indices.push(self.vertex_index(key));
        }

        let Some(builder) = self.current.as_mut() else {
            return Ok(());
        };
        for i in 1..indices.len() - 1 {
            builder
                .group
                .indices
                .extend_from_slice(&[indices[0], indices[i], indices[i + 1]]);
        }
        Ok(())
    }

    fn face_vertex(&self, number: usize, value: &str) -> Result<VertexKey, ObjError> {
        let mut fields = value.split('/');
        let position = match fields.next() {
            Some(p) if !p.is_empty() => resolve(number, p, self.positions.len())?,
            _ => {
                return Err(ObjError::InvalidFaceVertex {
                    line: number,
                    value: value.to_string(),
                })
            }
        };
        let uv = match fields.next() {
            Some(t) if !t.is_empty() => Some(resolve(number, t, self.uvs.len())?),
            _ => None,
        };
        let normal = match fields.next() {
            Some(n) if !n.is_empty() => Some(resolve(number, n, self.normals.len())?),
            _ => None,
        };
        if fields.next().is_some() {
            return Err(ObjError::InvalidFaceVertex {
                line: number,
                value: value.to_string(),
            });
        }
        Ok((position, uv, normal))
    }

    fn vertex_index(&mut self, key: VertexKey) -> u32 {
        let positions = &self.positions;
        let uvs = &self.uvs;
        let normals = &self.normals;
        let Some(builder) = self.current.as_mut() else {
            return 0;
        };

        if let Some(&index) = builder.lookup.get(&key) {
            return index;
        }

        let (p, t, n) = key;
        let index = builder.group.positions.len() as u32;
        builder.group.positions.push(positions[p]);
        builder
            .group
            .uvs
            .push(t.map(|t| uvs[t]).unwrap_or([0.0, 0.0]));
        match n {
            Some(n) => {
                builder.group.normals.push(normals[n]);
                builder.has_normals = true;
            }
            None => builder.group.normals.push([0.0, 0.0, 0.0]),
        }
        builder.lookup.insert(key, index);
        index
    }

    fn finish(mut self) -> ObjModel {
        if let Some(current) = self.current.take() {
            if !current.group.is_empty() {
                self.finished.push(current);
            }
        }

        let groups = self
            .finished
            .into_iter()
            .map(|builder| {
                let mut group = builder.group;
                if !builder.has_normals {
                    generate_normals(&mut group);
                }
                group
            })
            .collect();

        ObjModel {
            material_libraries: self.material_libraries,
            groups,
        }
    }
}

/// Resolve a 1-based (or negative, relative) OBJ index against `len` entries
fn resolve(number: usize, value: &str, len: usize) -> Result<usize, ObjError> {
    let index: i64 = value.parse().map_err(|_| ObjError::InvalidFaceVertex {
        line: number,
        value: value.to_string(),
    })?;
    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i - 1),
        i => Some(len as i64 + i),
    };
    match resolved {
        Some(r) if r >= 0 && (r as usize) < len => Ok(r as usize),
        _ => Err(ObjError::IndexOutOfRange {
            line: number,
            index,
        }),
    }
}

fn parse_floats<const N: usize>(
    number: usize,
    keyword: &str,
    values: &[&str],
) -> Result<[f32; N], ObjError> {
    if values.len() < N {
        return Err(ObjError::MissingValues {
            line: number,
            keyword: keyword.to_string(),
            expected: N,
        });
    }
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value.parse().map_err(|_| ObjError::InvalidNumber {
            line: number,
            value: value.to_string(),
        })?;
    }
    Ok(out)
}

/// Accumulate face normals onto shared vertices and normalize
fn generate_normals(group: &mut ObjGroup) {
    let mut normals = vec![[0.0f32; 3]; group.positions.len()];

    for triangle in group.indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let (v0, v1, v2) = (
            group.positions[i0],
            group.positions[i1],
            group.positions[i2],
        );
        let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let face = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        for i in [i0, i1, i2] {
            for axis in 0..3 {
                normals[i][axis] += face[axis];
            }
        }
    }

    for n in normals.iter_mut() {
        let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        *n = if length > f32::EPSILON {
            [n[0] / length, n[1] / length, n[2] / length]
        } else {
            [0.0, 1.0, 0.0]
        };
    }

    group.normals = normals;
}
