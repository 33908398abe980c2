//! Depth-first walk over a parsed COLLADA document.

use log::{error, trace, warn};
use roxmltree::{Document, Node};

use super::extra::read_extra;
use super::nodes::build_nodes;
use super::session::ImportSession;
use super::text::{attribute, attribute_ignore_case, elements, tag_name};
use crate::config::ImportOptions;
use crate::error::{ImportError, ImportResult};

pub const COLLADA_NAMESPACE: &str = "http://www.collada.org/2005/11/COLLADASchema";
pub const COLLADA_VERSION: &str = "1.4.1";

/// What a walk touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Number of visited elements.
    pub visited: usize,
    /// Elements suppressed because their parent is the skip marker.
    pub skipped: usize,
}

/// Walks `document` from its root element, filling `session`.
pub fn walk_document(
    document: &Document<'_>,
    session: &mut ImportSession,
    options: &ImportOptions,
) -> ImportResult<WalkSummary> {
    let mut walker = Walker {
        session,
        options,
        summary: WalkSummary::default(),
    };
    walker.walk(document.root_element())?;
    Ok(walker.summary)
}

struct Walker<'s> {
    session: &'s mut ImportSession,
    options: &'s ImportOptions,
    summary: WalkSummary,
}

impl Walker<'_> {
    /// Pre-order traversal on an explicit stack.
    fn walk(&mut self, root: Node<'_, '_>) -> ImportResult<()> {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            if !self.visit(&node)? {
                continue;
            }
            let first_child = pending.len();
            pending.extend(elements(&node));
            pending[first_child..].reverse();
        }
        Ok(())
    }

    /// Handles one element. Returns `false` when the element is suppressed
    /// by the skip marker and its subtree must not be walked.
    fn visit(&mut self, node: &Node<'_, '_>) -> ImportResult<bool> {
        let name = tag_name(node);
        let parent_name = node.parent_element().map(|parent| tag_name(&parent));

        if parent_name.is_some() && parent_name == self.session.skip_children_of {
            self.summary.skipped += 1;
            return Ok(false);
        }

        trace!("<{name}>");
        self.summary.visited += 1;

        match name.as_str() {
            "collada" => validate_header(node)?,
            // Cameras carry nothing the renderer consumes; suppress the
            // whole library.
            "library_cameras" => self.session.skip_children_of = Some(name.clone()),
            "library_geometries" => self.session.geometry_library = Some(node.id()),
            "library_visual_scenes" => {
                for visual_scene in elements(node).filter(|n| tag_name(n) == "visual_scene") {
                    self.session.scene_id = attribute(&visual_scene, "id");
                    let roots = build_nodes(
                        &visual_scene,
                        &mut self.session.arena,
                        self.options.legacy_nested_transforms,
                    );
                    self.session.roots.extend(roots);
                }
                self.session.skip_children_of = Some(name.clone());
            }
            "extra" if parent_name.as_deref() == Some("collada") => read_extra(
                node,
                &mut self.session.xsi_extra,
                self.options.fix_xsi_scene_sids,
            ),
            _ => {}
        }
        Ok(true)
    }
}

fn validate_header(node: &Node<'_, '_>) -> ImportResult<()> {
    match node.tag_name().namespace() {
        Some(namespace) if namespace != COLLADA_NAMESPACE => {
            error!("COLLADA file does not have a standard header (xmlns {namespace})");
            return Err(ImportError::Header(format!("unexpected namespace {namespace}")));
        }
        Some(_) => {}
        None => warn!("COLLADA root has no xmlns attribute"),
    }

    match attribute_ignore_case(node, "version") {
        Some(version) if version != COLLADA_VERSION => {
            error!("COLLADA file does not have a standard header (version {version})");
            Err(ImportError::Header(format!("unsupported version {version}")))
        }
        Some(_) => Ok(()),
        None => {
            warn!("COLLADA root has no version attribute");
            Ok(())
        }
    }
}
