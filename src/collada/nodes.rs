//! Scene-graph construction from `<visual_scene>`.

use glam::{Mat4, Vec3};
use log::{trace, warn};
use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::text::{attribute, elements, non_empty_attribute, parse_vec3, parse_vec4, tag_name, text};
use crate::transform::compose_transform;

/// Index of a node inside a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeKind {
    #[default]
    Untyped,
    Mesh,
}

/// One `<node>` of a visual scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub sid: Option<String>,
    pub translate: Vec3,
    /// Per-axis angles in degrees.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub transform: Mat4,
    pub kind: NodeKind,
    pub instance_geometry: Option<String>,
    pub processed: bool,
    pub children: Vec<NodeId>,
}

impl Default for ParsedNode {
    fn default() -> Self {
        Self {
            id: None,
            name: None,
            sid: None,
            translate: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            transform: Mat4::IDENTITY,
            kind: NodeKind::Untyped,
            instance_geometry: None,
            processed: false,
            children: Vec::new(),
        }
    }
}

impl ParsedNode {
    fn from_element(node: &Node<'_, '_>) -> Self {
        Self {
            id: attribute(node, "id"),
            name: attribute(node, "name"),
            sid: attribute(node, "sid"),
            ..Self::default()
        }
    }

    /// Returns `true` if the node instances a geometry.
    pub fn is_mesh(&self) -> bool {
        self.kind == NodeKind::Mesh
    }

    fn update_transform(&mut self) {
        self.transform = compose_transform(self.scale, self.rotation, self.translate);
    }
}

/// Flat storage for every node of one import.
///
/// Nodes refer to their children by [`NodeId`], which keeps teardown
/// iterative no matter how deep the scene is nested.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<ParsedNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `node` and returns its id.
    pub fn push(&mut self, node: ParsedNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Returns the node stored under `id`.
    pub fn get(&self, id: NodeId) -> Option<&ParsedNode> {
        self.nodes.get(id.0)
    }

    /// Returns the node stored under `id` for mutation.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ParsedNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes with their ids in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ParsedNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Drops every node and releases the backing storage.
    pub fn clear(&mut self) {
        self.nodes = Vec::new();
    }

    fn node_mut(&mut self, id: NodeId) -> &mut ParsedNode {
        &mut self.nodes[id.0]
    }
}

/// Builds one root per immediate `<node>` child of `visual_scene`.
///
/// Nodes are allocated when first reached and filled from a work list, so
/// neither mode recurses on the XML nesting depth.
pub fn build_nodes(visual_scene: &Node<'_, '_>, arena: &mut NodeArena, legacy: bool) -> Vec<NodeId> {
    let mut roots = Vec::new();
    let mut pending = Vec::new();
    for child in elements(visual_scene).filter(is_node) {
        let id = arena.push(ParsedNode::from_element(&child));
        roots.push(id);
        pending.push((child, id));
    }
    pending.reverse();

    while let Some((element, id)) = pending.pop() {
        if legacy {
            fill_legacy(&element, id, arena, &mut pending);
        } else {
            fill_local(&element, id, arena, &mut pending);
        }
        let node = arena.node_mut(id);
        node.update_transform();
        trace!("built node {:?} ({} child node(s))", node.id, node.children.len());
    }
    roots
}

fn is_node(element: &Node<'_, '_>) -> bool {
    tag_name(element) == "node"
}

/// Allocates `element` as a child of `parent` and queues it for filling.
fn adopt<'a, 'input>(
    element: Node<'a, 'input>,
    parent: NodeId,
    arena: &mut NodeArena,
    pending: &mut Vec<(Node<'a, 'input>, NodeId)>,
) {
    let id = arena.push(ParsedNode::from_element(&element));
    arena.node_mut(parent).children.push(id);
    pending.push((element, id));
}

/// Applies the transform and geometry elements that sit directly under
/// `element` to `target`; direct `<node>` children become its children.
fn fill_local<'a, 'input>(
    element: &Node<'a, 'input>,
    target: NodeId,
    arena: &mut NodeArena,
    pending: &mut Vec<(Node<'a, 'input>, NodeId)>,
) {
    for child in elements(element) {
        if is_node(&child) {
            adopt(child, target, arena, pending);
        } else {
            apply_element(&child, arena.node_mut(target));
        }
    }
}

/// Dual-pointer fill: every element below `element`, however deep, also
/// lands on `target`, and every nested `<node>` reached on the way is
/// appended to `target`'s children in document order.
fn fill_legacy<'a, 'input>(
    element: &Node<'a, 'input>,
    target: NodeId,
    arena: &mut NodeArena,
    pending: &mut Vec<(Node<'a, 'input>, NodeId)>,
) {
    let mut descendants: Vec<Node<'a, 'input>> = elements(element).collect();
    descendants.reverse();
    while let Some(current) = descendants.pop() {
        if is_node(&current) {
            adopt(current, target, arena, pending);
        } else {
            apply_element(&current, arena.node_mut(target));
        }
        let first_child = descendants.len();
        descendants.extend(elements(&current));
        descendants[first_child..].reverse();
    }
}

fn apply_element(child: &Node<'_, '_>, node: &mut ParsedNode) {
    match tag_name(child).as_str() {
        "translate" => match parse_vec3(&text(child)) {
            Some(value) => node.translate = value,
            None => warn!("ignoring <translate> without three components"),
        },
        "rotate" => {
            let Some(value) = parse_vec4(&text(child)) else {
                warn!("ignoring <rotate> without four components");
                return;
            };
            match child.attribute("sid") {
                Some("rotation_x") => node.rotation.x = value.w,
                Some("rotation_y") => node.rotation.y = value.w,
                Some("rotation_z") => node.rotation.z = value.w,
                other => trace!("ignoring <rotate> with sid {other:?}"),
            }
        }
        "scale" => match parse_vec3(&text(child)) {
            Some(value) => node.scale = value,
            None => warn!("ignoring <scale> without three components"),
        },
        "instance_geometry" => {
            if let Some(url) = non_empty_attribute(child, "url") {
                if let Some(geometry) = url.strip_prefix('#') {
                    node.instance_geometry = Some(geometry.to_string());
                    node.kind = NodeKind::Mesh;
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    fn build(xml: &str, legacy: bool) -> (NodeArena, Vec<NodeId>) {
        let doc = Document::parse(xml).unwrap();
        let mut arena = NodeArena::new();
        let roots = build_nodes(&doc.root_element(), &mut arena, legacy);
        (arena, roots)
    }

    #[test]
    fn reads_attributes_and_transform_elements() {
        let (arena, roots) = build(
            r##"<visual_scene id="Scene">
                <node id="n1" name="Teapot">
                    <translate sid="translate">1 2 3</translate>
                    <rotate sid="rotation_y">0 1 0 45</rotate>
                    <scale sid="scale">2 2 2</scale>
                    <instance_geometry url="#G1"/>
                </node>
            </visual_scene>"##,
            false,
        );
        assert_eq!(roots.len(), 1);
        let node = arena.get(roots[0]).unwrap();
        assert_eq!(node.id.as_deref(), Some("n1"));
        assert_eq!(node.name.as_deref(), Some("Teapot"));
        assert_eq!(node.sid, None);
        assert_eq!(node.translate, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(node.rotation, Vec3::new(0.0, 45.0, 0.0));
        assert_eq!(node.scale, Vec3::splat(2.0));
        assert!(node.is_mesh());
        assert_eq!(node.instance_geometry.as_deref(), Some("G1"));
        let expected = compose_transform(node.scale, node.rotation, node.translate);
        assert!(node.transform.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn rotation_y_only_touches_y() {
        let (arena, roots) = build(
            r#"<visual_scene><node><rotate sid="rotation_y">0 1 0 30</rotate></node></visual_scene>"#,
            false,
        );
        let node = arena.get(roots[0]).unwrap();
        assert_eq!(node.rotation, Vec3::new(0.0, 30.0, 0.0));
    }

    #[test]
    fn multiple_rotates_accumulate_per_axis() {
        let (arena, roots) = build(
            r#"<visual_scene><node>
                <rotate sid="rotation_z">0 0 1 10</rotate>
                <rotate sid="rotation_y">0 1 0 20</rotate>
                <rotate sid="rotation_x">1 0 0 30</rotate>
                <rotate sid="pivot">1 0 0 99</rotate>
            </node></visual_scene>"#,
            false,
        );
        let node = arena.get(roots[0]).unwrap();
        assert_eq!(node.rotation, Vec3::new(30.0, 20.0, 10.0));
    }

    #[test]
    fn url_without_marker_is_not_a_mesh() {
        let (arena, roots) = build(
            r#"<visual_scene><node><instance_geometry url="G1"/></node></visual_scene>"#,
            false,
        );
        let node = arena.get(roots[0]).unwrap();
        assert!(!node.is_mesh());
        assert_eq!(node.instance_geometry, None);
    }

    const NESTED: &str = r##"<visual_scene>
        <node id="parent">
            <translate>1 0 0</translate>
            <node id="child">
                <translate>5 5 5</translate>
                <instance_geometry url="#G2"/>
                <node id="grandchild"><scale>3 3 3</scale></node>
            </node>
        </node>
    </visual_scene>"##;

    #[test]
    fn nested_nodes_keep_their_own_transforms() {
        let (arena, roots) = build(NESTED, false);
        assert_eq!(roots.len(), 1);
        assert_eq!(arena.len(), 3);
        let parent = arena.get(roots[0]).unwrap();
        assert_eq!(parent.translate, Vec3::X);
        assert_eq!(parent.scale, Vec3::ONE);
        assert!(!parent.is_mesh());
        assert_eq!(parent.children.len(), 1);

        let child = arena.get(parent.children[0]).unwrap();
        assert_eq!(child.id.as_deref(), Some("child"));
        assert_eq!(child.translate, Vec3::splat(5.0));
        assert!(child.is_mesh());
        assert_eq!(child.children.len(), 1);
    }

    #[test]
    fn legacy_fill_lets_descendants_overwrite_the_parent() {
        let (arena, roots) = build(NESTED, true);
        let parent = arena.get(roots[0]).unwrap();
        assert_eq!(parent.translate, Vec3::splat(5.0));
        assert_eq!(parent.scale, Vec3::splat(3.0));
        assert!(parent.is_mesh());
        assert_eq!(parent.instance_geometry.as_deref(), Some("G2"));

        // child, plus grandchild reached again through the parent pointer
        let ids: Vec<_> = parent
            .children
            .iter()
            .map(|id| arena.get(*id).unwrap().id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["child".to_string(), "grandchild".to_string()]);

        let child = arena.get(parent.children[0]).unwrap();
        assert_eq!(child.scale, Vec3::splat(3.0));
        let expected = compose_transform(parent.scale, parent.rotation, parent.translate);
        assert!(parent.transform.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn only_node_children_become_roots() {
        let (arena, roots) = build(
            r#"<visual_scene><extra/><node id="a"/><node id="b"/></visual_scene>"#,
            false,
        );
        assert_eq!(roots.len(), 2);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn clearing_the_arena_releases_every_node() {
        let (mut arena, _) = build(NESTED, true);
        assert!(!arena.is_empty());
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.iter().count(), 0);
    }

    #[test]
    fn deep_nesting_builds_a_chain() {
        let depth = 10_000;
        let xml = format!(
            "<visual_scene>{}{}</visual_scene>",
            r#"<node><translate>1 0 0</translate>"#.repeat(depth),
            "</node>".repeat(depth)
        );
        let (arena, roots) = build(&xml, false);
        assert_eq!(roots.len(), 1);
        assert_eq!(arena.len(), depth);

        let mut id = roots[0];
        let mut levels = 1;
        while let Some(&child) = arena.get(id).unwrap().children.first() {
            assert_eq!(arena.get(child).unwrap().translate, Vec3::X);
            id = child;
            levels += 1;
        }
        assert_eq!(levels, depth);
    }

    #[test]
    fn children_keep_document_order() {
        let (arena, roots) = build(
            r#"<visual_scene><node id="root">
                <node id="a"><node id="a1"/></node>
                <node id="b"/>
                <node id="c"/>
            </node></visual_scene>"#,
            false,
        );
        let root = arena.get(roots[0]).unwrap();
        let ids: Vec<_> = root
            .children
            .iter()
            .map(|id| arena.get(*id).unwrap().id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
