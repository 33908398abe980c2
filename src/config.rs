use serde::{Deserialize, Serialize};

/// Switches consumed by the importer.
///
/// Every flag defaults to `false`, so `ImportOptions::default()` gives the
/// plain behaviour and deserializing a partial table only overrides the
/// listed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Collapse identical index tuples into a single vertex.
    pub optimize_points: bool,
    /// Flip every vertex normal after the buffers have been built.
    pub invert_normals: bool,
    /// Let transform and geometry elements of nested `<node>`s overwrite the
    /// enclosing node, as older exporters' assets were authored against.
    pub legacy_nested_transforms: bool,
    /// Read `start`, `end` and `frame_rate` from the XSI scene extra instead
    /// of only ever matching `timing`.
    pub fix_xsi_scene_sids: bool,
}

impl ImportOptions {
    /// Options with every flag off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets [`optimize_points`](Self::optimize_points).
    pub fn with_optimize_points(mut self, value: bool) -> Self {
        self.optimize_points = value;
        self
    }

    /// Sets [`invert_normals`](Self::invert_normals).
    pub fn with_invert_normals(mut self, value: bool) -> Self {
        self.invert_normals = value;
        self
    }

    /// Sets [`legacy_nested_transforms`](Self::legacy_nested_transforms).
    pub fn with_legacy_nested_transforms(mut self, value: bool) -> Self {
        self.legacy_nested_transforms = value;
        self
    }

    /// Sets [`fix_xsi_scene_sids`](Self::fix_xsi_scene_sids).
    pub fn with_fix_xsi_scene_sids(mut self, value: bool) -> Self {
        self.fix_xsi_scene_sids = value;
        self
    }
}
