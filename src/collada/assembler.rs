//! Turns the parsed node forest into the output model list.

use std::collections::HashSet;

use log::{debug, trace, warn};
use roxmltree::Node;

use super::geometry::resolve;
use super::nodes::ParsedNode;
use super::session::ImportSession;
use crate::config::ImportOptions;
use crate::error::ImportResult;
use crate::model::{InstanceTransform, Model};

#[derive(Debug, Default)]
pub struct Assembly {
    pub models: Vec<Model>,
    /// Geometry ids that were referenced but are missing from the library,
    /// each listed once in first-reference order.
    pub unresolved: Vec<String>,
}

/// Builds one model per distinct geometry referenced by a top-level mesh
/// node. Later references to an already built geometry become extra
/// instance transforms on that model.
pub fn assemble(
    session: &mut ImportSession,
    library: Option<Node<'_, '_>>,
    options: &ImportOptions,
) -> ImportResult<Assembly> {
    let mut assembly = Assembly::default();
    let mut missing: HashSet<String> = HashSet::new();

    for index in 0..session.roots.len() {
        let id = session.roots[index];
        let Some(node) = session.arena.get_mut(id) else {
            continue;
        };
        if node.processed || !node.is_mesh() {
            continue;
        }
        let Some(geometry_id) = node.instance_geometry.clone() else {
            continue;
        };
        let transform = instance_transform(node);

        if let Some(model) = assembly
            .models
            .iter_mut()
            .find(|model| model.instance_geometry == geometry_id)
        {
            model.add_instance_transform(transform);
            node.processed = true;
            continue;
        }

        if missing.contains(&geometry_id) {
            trace!("node {:?} references unknown geometry {geometry_id}", node.id);
            continue;
        }
        let Some(geometry) = library.as_ref().and_then(|lib| resolve(lib, &geometry_id)) else {
            warn!("node {:?} references unknown geometry {geometry_id}", node.id);
            missing.insert(geometry_id.clone());
            assembly.unresolved.push(geometry_id);
            continue;
        };

        let name = node
            .name
            .clone()
            .or_else(|| node.id.clone())
            .unwrap_or_else(|| geometry_id.clone());
        let model = Model::from_geometry(name, &geometry, transform, options)?;
        debug!(
            "model {} from {geometry_id}: {} mesh(es), {} vertices",
            model.name,
            model.meshes.len(),
            model.vertex_count()
        );
        node.processed = true;
        assembly.models.push(model);
    }

    Ok(assembly)
}

fn instance_transform(node: &ParsedNode) -> InstanceTransform {
    InstanceTransform {
        position: node.translate,
        rotation: node.rotation,
        scale: node.scale,
        transform: node.transform,
    }
}
