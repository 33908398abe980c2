//! COLLADA content pipeline.
//!
//! The crate turns a COLLADA 1.4.1 document into a list of renderer-ready
//! models: geometry is resolved lazily by id, repeated references to the
//! same geometry are folded into instance transforms, and triangle index
//! tuples are deinterleaved into plain vertex/index buffers. GPU upload,
//! windowing and materials are left to the host application.

pub mod collada;
pub mod config;
pub mod error;
pub mod model;
pub mod scene;
pub mod transform;

pub use collada::{import_collada, ColladaImporter, ImportReport, ImportSession};
pub use config::ImportOptions;
pub use error::{ImportError, ImportResult, ImportStatus};
pub use model::{BoundingBox, InstanceTransform, Mesh, Model, Vertex};
pub use scene::Scene;
