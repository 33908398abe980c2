use roxmltree::NodeId as XmlNodeId;

use super::extra::XsiExtra;
use super::nodes::{NodeArena, NodeId};

/// Everything one import accumulates while walking a document.
///
/// A session is owned by exactly one [`ColladaImporter`](super::ColladaImporter)
/// and is cleared before and after every import.
#[derive(Debug, Default)]
pub struct ImportSession {
    pub(crate) arena: NodeArena,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) scene_id: Option<String>,
    pub(crate) skip_children_of: Option<String>,
    pub(crate) geometry_library: Option<XmlNodeId>,
    pub(crate) xsi_extra: XsiExtra,
}

impl ImportSession {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every node built from the visual scene, nested ones included.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Top-level nodes of the visual scene, in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// `id` of the last `<visual_scene>` read.
    pub fn scene_id(&self) -> Option<&str> {
        self.scene_id.as_deref()
    }

    /// Element name whose children the walker currently suppresses.
    pub fn skip_marker(&self) -> Option<&str> {
        self.skip_children_of.as_deref()
    }

    /// XSI scene timing read from the document root.
    pub fn xsi_extra(&self) -> &XsiExtra {
        &self.xsi_extra
    }

    /// Releases every table and resets the skip marker.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.roots = Vec::new();
        self.scene_id = None;
        self.skip_children_of = None;
        self.geometry_library = None;
        self.xsi_extra = XsiExtra::default();
    }

    /// Returns `true` when every table is empty and no marker is set.
    pub fn is_clear(&self) -> bool {
        self.arena.is_empty()
            && self.roots.is_empty()
            && self.scene_id.is_none()
            && self.skip_children_of.is_none()
            && self.geometry_library.is_none()
            && self.xsi_extra.is_empty()
    }
}
