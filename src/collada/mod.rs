//! COLLADA 1.4.1 importer.
//!
//! An import runs in three phases: the document walker fills an
//! [`ImportSession`] with the visual scene's node forest and a handle to the
//! geometry library, the assembler then resolves the referenced geometries
//! lazily, and the finished models are handed to a [`Scene`].

pub mod assembler;
pub mod extra;
pub mod geometry;
pub mod nodes;
pub mod session;
pub mod text;
pub mod walker;

use std::borrow::Cow;
use std::path::Path;

use log::{error, info, warn};
use roxmltree::Document;
use serde::{Deserialize, Serialize};

use crate::config::ImportOptions;
use crate::error::{ImportError, ImportResult, ImportStatus};
use crate::scene::Scene;

pub use assembler::{assemble, Assembly};
pub use extra::XsiExtra;
pub use geometry::{Geometry, GeometrySource, TriangleBlock, VertexSemanticBinding, VertexTable};
pub use nodes::{NodeArena, NodeId, NodeKind, ParsedNode};
pub use session::ImportSession;
pub use walker::{walk_document, WalkSummary, COLLADA_NAMESPACE, COLLADA_VERSION};

/// Summary of a successful import.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub scene_id: Option<String>,
    pub models_added: usize,
    pub instances_added: usize,
    /// Geometry ids referenced by nodes but missing from the library.
    pub unresolved: Vec<String>,
    pub visited_elements: usize,
    pub skipped_elements: usize,
    pub xsi_extra: XsiExtra,
}

impl ImportReport {
    /// A report only exists for a passing import.
    pub fn status(&self) -> ImportStatus {
        ImportStatus::Pass
    }
}

/// Reusable COLLADA importer.
///
/// Each importer owns one session, so imports on the same importer are
/// serialized by `&mut self`; use one importer per thread for concurrent
/// imports.
#[derive(Debug, Default)]
pub struct ColladaImporter {
    options: ImportOptions,
    session: ImportSession,
}

impl ColladaImporter {
    /// Creates an importer with an empty session.
    pub fn new(options: ImportOptions) -> Self {
        Self {
            options,
            session: ImportSession::new(),
        }
    }

    /// Options applied to every import.
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// The session, which is empty between imports.
    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    /// Reads `path` in full and imports it into `scene`.
    pub fn import_file<P: AsRef<Path>>(&mut self, path: P, scene: &Scene) -> ImportResult<ImportReport> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("importing {}", path.display());
        self.import_bytes(&bytes, scene)
    }

    /// Imports a document from raw bytes. Non UTF-8 input is decoded lossily.
    pub fn import_bytes(&mut self, bytes: &[u8], scene: &Scene) -> ImportResult<ImportReport> {
        let xml = match std::str::from_utf8(bytes) {
            Ok(xml) => Cow::Borrowed(xml),
            Err(err) => {
                warn!("COLLADA document is not valid UTF-8 ({err}); decoding lossily");
                String::from_utf8_lossy(bytes)
            }
        };
        self.import_str(&xml, scene)
    }

    /// Imports a document held in memory. The session is empty again when
    /// this returns, whatever the outcome.
    pub fn import_str(&mut self, xml: &str, scene: &Scene) -> ImportResult<ImportReport> {
        self.session.clear();
        let result = self.run(xml, scene);
        self.session.clear();
        result
    }

    fn run(&mut self, xml: &str, scene: &Scene) -> ImportResult<ImportReport> {
        let document = Document::parse(xml).map_err(|err| {
            error!("could not parse COLLADA document: {err}");
            ImportError::from(err)
        })?;

        let summary = walk_document(&document, &mut self.session, &self.options)?;
        let library = self
            .session
            .geometry_library
            .and_then(|id| document.get_node(id));
        let Assembly { models, unresolved } = assemble(&mut self.session, library, &self.options)?;

        let report = ImportReport {
            scene_id: self.session.scene_id.clone(),
            models_added: models.len(),
            instances_added: models.iter().map(|model| model.instance_count()).sum(),
            unresolved,
            visited_elements: summary.visited,
            skipped_elements: summary.skipped,
            xsi_extra: self.session.xsi_extra.clone(),
        };
        info!(
            "imported {} model(s), {} instance(s) from scene {:?}",
            report.models_added, report.instances_added, report.scene_id
        );
        if !models.is_empty() {
            scene.add_models(models);
        }
        Ok(report)
    }
}

/// One-shot import of `xml` into `scene` with a fresh importer.
pub fn import_collada(xml: &str, options: ImportOptions, scene: &Scene) -> ImportResult<ImportReport> {
    ColladaImporter::new(options).import_str(xml, scene)
}
