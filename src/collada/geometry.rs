//! On-demand resolution of `<library_geometries>` entries.

use log::{debug, trace, warn};
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::text::{
    attribute, child_element, elements, leading_int, non_empty_attribute, scan_indices,
    scan_numbers, strip_marker, tag_name, text, INVALID_INDEX,
};

/// A `<source>` holding a flat float array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometrySource {
    pub id: String,
    pub name: String,
    /// Values per logical element.
    pub stride: usize,
    /// Element count declared by the accessor.
    pub count: usize,
    pub data: Vec<f32>,
}

impl GeometrySource {
    /// Number of whole elements actually present in `data`.
    pub fn element_count(&self) -> usize {
        self.data.len() / self.stride.max(1)
    }

    /// The `index`-th element, or `None` if it falls outside the array.
    pub fn element(&self, index: usize) -> Option<&[f32]> {
        let stride = self.stride.max(1);
        let start = index.checked_mul(stride)?;
        self.data.get(start..start.checked_add(stride)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexSemanticBinding {
    pub semantic: String,
    pub source: String,
    pub offset: usize,
    /// Copied from the `<vertices>` table; positioned at the offset of the
    /// input that referenced the table rather than at `offset`.
    pub shared: bool,
}

/// The `<vertices>` element of a mesh.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VertexTable {
    pub id: String,
    pub semantics: Vec<VertexSemanticBinding>,
}

/// One `<triangles>` element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriangleBlock {
    pub material: String,
    pub count: usize,
    pub semantics: Vec<VertexSemanticBinding>,
    /// Offset of the input that pulled in the vertex table.
    pub vertex_offset: Option<usize>,
    /// Indices per vertex tuple in `indices`.
    pub tuple_stride: usize,
    /// Raw, still interleaved index stream of `<p>`.
    pub indices: Vec<u32>,
}

impl TriangleBlock {
    /// Position of `binding` inside one index tuple.
    pub fn tuple_offset(&self, binding: &VertexSemanticBinding) -> usize {
        if binding.shared {
            self.vertex_offset.unwrap_or(0)
        } else {
            binding.offset
        }
    }

    pub fn binding(&self, semantic: &str) -> Option<&VertexSemanticBinding> {
        self.semantics.iter().find(|b| b.semantic == semantic)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub id: String,
    pub name: String,
    pub sources: Vec<GeometrySource>,
    pub vertices: Option<VertexTable>,
    pub triangles: Vec<TriangleBlock>,
}

impl Geometry {
    pub fn source(&self, id: &str) -> Option<&GeometrySource> {
        self.sources.iter().find(|source| source.id == id)
    }
}

/// Looks up `geometry_id` among the direct children of `library` and parses
/// it. The first matching entry wins.
pub fn resolve(library: &Node<'_, '_>, geometry_id: &str) -> Option<Geometry> {
    let entry = elements(library).find(|child| child.attribute("id") == Some(geometry_id))?;

    let mut geometry = Geometry {
        id: attribute(&entry, "id").unwrap_or_default(),
        name: attribute(&entry, "name").unwrap_or_default(),
        ..Geometry::default()
    };

    for mesh in elements(&entry).filter(|child| tag_name(child) == "mesh") {
        for child in elements(&mesh) {
            match tag_name(&child).as_str() {
                "source" => geometry.sources.push(read_source(&child)),
                "vertices" => geometry.vertices = Some(read_vertices(&child)),
                "triangles" => {
                    let block = read_triangles(&child, geometry.vertices.as_ref());
                    geometry.triangles.push(block);
                }
                other => trace!("skipping <{other}> in geometry {geometry_id}"),
            }
        }
    }

    debug!(
        "resolved geometry {geometry_id}: {} source(s), {} triangle block(s)",
        geometry.sources.len(),
        geometry.triangles.len()
    );
    Some(geometry)
}

fn read_source(element: &Node<'_, '_>) -> GeometrySource {
    let mut source = GeometrySource {
        id: attribute(element, "id").unwrap_or_default(),
        name: attribute(element, "name").unwrap_or_default(),
        stride: 1,
        ..GeometrySource::default()
    };

    for child in elements(element) {
        match tag_name(&child).as_str() {
            "float_array" => source.data = scan_numbers(&text(&child)),
            "technique_common" => {
                if let Some(accessor) = child_element(&child, "accessor") {
                    if let Some(stride) = accessor.attribute("stride") {
                        source.stride = usize::try_from(leading_int(stride)).unwrap_or(0).max(1);
                    }
                    if let Some(count) = accessor.attribute("count") {
                        source.count = usize::try_from(leading_int(count)).unwrap_or(0);
                    }
                }
            }
            _ => {}
        }
    }

    let expected = source.count.saturating_mul(source.stride);
    if source.count > 0 && expected != source.data.len() {
        warn!(
            "source {} declares {} x {} values but holds {}",
            source.id,
            source.count,
            source.stride,
            source.data.len()
        );
    }
    source
}

fn read_vertices(element: &Node<'_, '_>) -> VertexTable {
    let mut table = VertexTable {
        id: attribute(element, "id").unwrap_or_default(),
        semantics: Vec::new(),
    };
    for input in elements(element) {
        let (Some(semantic), Some(source)) = (
            non_empty_attribute(&input, "semantic"),
            non_empty_attribute(&input, "source"),
        ) else {
            continue;
        };
        let offset = table.semantics.len();
        table.semantics.push(VertexSemanticBinding {
            semantic: strip_marker(&semantic).to_string(),
            source: strip_marker(&source).to_string(),
            offset,
            shared: false,
        });
    }
    table
}

fn read_triangles(element: &Node<'_, '_>, vertices: Option<&VertexTable>) -> TriangleBlock {
    let mut block = TriangleBlock {
        material: attribute(element, "material").unwrap_or_default(),
        count: element
            .attribute("count")
            .map(|count| usize::try_from(leading_int(count)).unwrap_or(0))
            .unwrap_or(0),
        ..TriangleBlock::default()
    };
    let mut max_offset = None;

    for child in elements(element) {
        match tag_name(&child).as_str() {
            "input" => {
                let (Some(source), Some(offset), Some(semantic)) = (
                    non_empty_attribute(&child, "source"),
                    non_empty_attribute(&child, "offset"),
                    non_empty_attribute(&child, "semantic"),
                ) else {
                    continue;
                };
                let source = strip_marker(&source);
                let offset = usize::try_from(leading_int(&offset)).unwrap_or(0);
                max_offset = max_offset.max(Some(offset));

                match vertices.filter(|table| table.id == source) {
                    Some(table) => {
                        block.semantics.retain(|binding| !binding.shared);
                        block.semantics.extend(table.semantics.iter().cloned().map(|binding| {
                            VertexSemanticBinding {
                                shared: true,
                                ..binding
                            }
                        }));
                        block.vertex_offset = Some(offset);
                    }
                    None => {
                        if block.semantics.iter().any(|b| block.tuple_offset(b) == offset) {
                            // Maya writes a texcoord-less mesh with two inputs
                            // on the same offset.
                            trace!("dropping {semantic} input with duplicate offset {offset}");
                            continue;
                        }
                        block.semantics.push(VertexSemanticBinding {
                            semantic: strip_marker(&semantic).to_string(),
                            source: source.to_string(),
                            offset,
                            shared: false,
                        });
                    }
                }
            }
            "p" => {
                block.indices = scan_indices(&text(&child));
                let invalid = block.indices.iter().filter(|&&i| i == INVALID_INDEX).count();
                if invalid > 0 {
                    warn!(
                        "triangles ({}) hold {invalid} index token(s) that are not unsigned integers",
                        block.material
                    );
                }
            }
            _ => {}
        }
    }

    block.tuple_stride = max_offset.map_or(1, |offset| offset + 1);
    block
}
