use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::collada::geometry::{Geometry, GeometrySource, TriangleBlock, VertexSemanticBinding};
use crate::config::ImportOptions;
use crate::error::{ImportError, ImportResult};
use crate::transform::compose_transform;

/// Interleaved vertex layout handed to the renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut bounds, p| {
            bounds.min = bounds.min.min(p);
            bounds.max = bounds.max.max(p);
            bounds
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn merge(&mut self, other: &BoundingBox) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// One placement of a shared geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceTransform {
    pub position: Vec3,
    /// Per-axis angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub transform: Mat4,
}

impl InstanceTransform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            transform: compose_transform(scale, rotation, position),
        }
    }
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE)
    }
}

/// Deinterleaved buffers of one triangle block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub material: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: BoundingBox,
}

/// Renderer-ready geometry plus every placement of it in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub instance_geometry: String,
    pub meshes: Vec<Mesh>,
    pub bounds: BoundingBox,
    instances: Vec<InstanceTransform>,
}

impl Model {
    /// Builds the consolidated buffers of `geometry`, placed once at
    /// `transform`.
    pub fn from_geometry(
        name: impl Into<String>,
        geometry: &Geometry,
        transform: InstanceTransform,
        options: &ImportOptions,
    ) -> ImportResult<Self> {
        let mut meshes = Vec::new();
        meshes
            .try_reserve_exact(geometry.triangles.len())
            .map_err(|_| ImportError::Allocation { what: "mesh list" })?;
        let mut bounds = BoundingBox::EMPTY;
        for block in &geometry.triangles {
            let mesh = build_mesh(geometry, block, options)?;
            bounds.merge(&mesh.bounds);
            meshes.push(mesh);
        }
        Ok(Self {
            name: name.into(),
            instance_geometry: geometry.id.clone(),
            meshes,
            bounds,
            instances: vec![transform],
        })
    }

    /// The placement of the node that created this model.
    pub fn transform(&self) -> &InstanceTransform {
        &self.instances[0]
    }

    /// Every placement, the creating node first.
    pub fn instances(&self) -> &[InstanceTransform] {
        &self.instances
    }

    /// Number of placements.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Records one more placement of the same geometry.
    pub fn add_instance_transform(&mut self, transform: InstanceTransform) {
        self.instances.push(transform);
    }

    /// Vertices across all meshes.
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.vertices.len()).sum()
    }

    /// Indices across all meshes.
    pub fn index_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.indices.len()).sum()
    }
}

struct Channel<'a> {
    binding: &'a VertexSemanticBinding,
    source: &'a GeometrySource,
    offset: usize,
}

impl<'a> Channel<'a> {
    fn find(geometry: &'a Geometry, block: &'a TriangleBlock, semantic: &str) -> Option<Self> {
        let binding = block.binding(semantic)?;
        let Some(source) = geometry.source(&binding.source) else {
            warn!(
                "geometry {} references missing source {} for {semantic}",
                geometry.id, binding.source
            );
            return None;
        };
        Some(Self {
            binding,
            source,
            offset: block.tuple_offset(binding),
        })
    }

    fn read(&self, geometry: &Geometry, tuple: &[u32], out: &mut [f32]) -> ImportResult<()> {
        let index = tuple.get(self.offset).copied().unwrap_or(0) as usize;
        let values = self
            .source
            .element(index)
            .ok_or_else(|| ImportError::IndexOutOfRange {
                geometry: geometry.id.clone(),
                semantic: self.binding.semantic.clone(),
                index,
                len: self.source.element_count(),
            })?;
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = *value;
        }
        Ok(())
    }
}

fn build_mesh(
    geometry: &Geometry,
    block: &TriangleBlock,
    options: &ImportOptions,
) -> ImportResult<Mesh> {
    let stride = block.tuple_stride.max(1);
    if block.indices.len() % stride != 0 {
        warn!(
            "triangles of {} ({}) carry a partial index tuple",
            geometry.id, block.material
        );
    }
    let tuple_count = block.indices.len() / stride;

    let position = Channel::find(geometry, block, "POSITION");
    let normal = Channel::find(geometry, block, "NORMAL");
    let uv = Channel::find(geometry, block, "TEXCOORD");

    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    vertices
        .try_reserve(tuple_count)
        .map_err(|_| ImportError::Allocation { what: "vertex buffer" })?;
    indices
        .try_reserve(tuple_count)
        .map_err(|_| ImportError::Allocation { what: "index buffer" })?;
    let mut lookup: HashMap<&[u32], u32> = HashMap::new();

    for tuple in block.indices.chunks_exact(stride) {
        if options.optimize_points {
            if let Some(existing) = lookup.get(tuple) {
                indices.push(*existing);
                continue;
            }
        }

        let mut vertex = Vertex::zeroed();
        if let Some(channel) = &position {
            channel.read(geometry, tuple, &mut vertex.position)?;
        }
        if let Some(channel) = &normal {
            channel.read(geometry, tuple, &mut vertex.normal)?;
        }
        if let Some(channel) = &uv {
            channel.read(geometry, tuple, &mut vertex.uv)?;
        }

        let next_index = vertices.len() as u32;
        vertices.push(vertex);
        indices.push(next_index);
        if options.optimize_points {
            lookup.insert(tuple, next_index);
        }
    }

    let mut mesh = Mesh {
        material: block.material.clone(),
        bounds: BoundingBox::from_points(vertices.iter().map(|v| Vec3::from(v.position))),
        vertices,
        indices,
    };
    if normal.is_none() {
        compute_normals(&mut mesh);
    }
    if options.invert_normals {
        for vertex in &mut mesh.vertices {
            vertex.normal = (-Vec3::from(vertex.normal)).to_array();
        }
    }
    Ok(mesh)
}

/// Fills normals from the area-weighted face normals around each vertex.
fn compute_normals(mesh: &mut Mesh) {
    let mut accum = vec![Vec3::ZERO; mesh.vertices.len()];

    for triangle in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let p0 = Vec3::from(mesh.vertices[i0].position);
        let p1 = Vec3::from(mesh.vertices[i1].position);
        let p2 = Vec3::from(mesh.vertices[i2].position);
        let normal = (p1 - p0).cross(p2 - p0);
        if normal.length_squared() > f32::EPSILON {
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }
    }

    for (vertex, normal) in mesh.vertices.iter_mut().zip(accum) {
        vertex.normal = normal.normalize_or_zero().to_array();
    }
}
