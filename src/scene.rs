use std::sync::Arc;

use parking_lot::RwLock;

use crate::model::Model;

/// Thread-safe container receiving the models of one or more imports.
#[derive(Debug, Default)]
pub struct Scene {
    models: Arc<RwLock<Vec<Model>>>,
}

impl Clone for Scene {
    fn clone(&self) -> Self {
        Self {
            models: Arc::clone(&self.models),
        }
    }
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a finished model list; the scene takes ownership.
    pub fn add_models(&self, models: Vec<Model>) {
        self.models.write().extend(models);
    }

    /// Returns a snapshot of all stored models.
    pub fn all_models(&self) -> Vec<Model> {
        self.models.read().clone()
    }

    /// Number of stored models.
    pub fn model_count(&self) -> usize {
        self.models.read().len()
    }

    /// Returns a clone of the first model with the given name.
    pub fn get(&self, name: &str) -> Option<Model> {
        self.models
            .read()
            .iter()
            .find(|model| model.name == name)
            .cloned()
    }

    /// Returns a clone of the model built from `geometry_id`.
    pub fn find_by_geometry(&self, geometry_id: &str) -> Option<Model> {
        self.models
            .read()
            .iter()
            .find(|model| model.instance_geometry == geometry_id)
            .cloned()
    }

    /// Drops every stored model.
    pub fn clear(&self) {
        self.models.write().clear();
    }
}
