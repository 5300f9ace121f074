//! The game scene, as seen from the client.
//!
//! Rendering and physics belong to the engine. The client only asks it to
//! spawn, decorate and remove objects and to swing doors open, through the
//! [`Scene`] trait. Assets are resolved through an explicit catalog so an
//! unknown identifier fails when the catalog is loaded, not mid-game.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::{DoorId, ObjectId, ObjectKind, Rgba, VfxKind};

/// Opaque reference to an engine asset (prefab path, bundle key, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetHandle(pub String);

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read asset catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse asset catalog: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Asset catalog names unknown object: {0}")]
    UnknownObject(String),

    #[error("Asset catalog names unknown vfx: {0}")]
    UnknownVfx(String),
}

/// Catalog file schema
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    objects: HashMap<String, String>,
    #[serde(default)]
    vfx: HashMap<String, String>,
}

/// Mapping from closed identifiers to asset handles
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    objects: BTreeMap<ObjectKind, AssetHandle>,
    vfx: HashMap<VfxKind, AssetHandle>,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        let objects = ObjectKind::ALL
            .into_iter()
            .map(|kind| (kind, AssetHandle(format!("Prefabs/Items/{}", kind))))
            .collect();
        let vfx = VfxKind::ATTACHABLE
            .into_iter()
            .map(|kind| (kind, AssetHandle(format!("Prefabs/VFX/{}", kind))))
            .collect();
        Self { objects, vfx }
    }
}

impl AssetCatalog {
    /// Defaults, overridden by a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let mut catalog = Self::default();

        for (name, path) in file.objects {
            let kind: ObjectKind = name
                .parse()
                .map_err(|_| CatalogError::UnknownObject(name.clone()))?;
            catalog.objects.insert(kind, AssetHandle(path));
        }

        for (name, path) in file.vfx {
            let kind: VfxKind = name
                .parse()
                .ok()
                .filter(|k| *k != VfxKind::None)
                .ok_or_else(|| CatalogError::UnknownVfx(name.clone()))?;
            catalog.vfx.insert(kind, AssetHandle(path));
        }

        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn object(&self, kind: ObjectKind) -> &AssetHandle {
        // Every kind is inserted by `default()` and never removed
        &self.objects[&kind]
    }

    /// Effect asset, `None` for `VfxKind::None`
    pub fn vfx(&self, kind: VfxKind) -> Option<&AssetHandle> {
        self.vfx.get(&kind)
    }
}

/// What the client can ask of the game engine
pub trait Scene: Send + Sync {
    /// Instantiate an object and label it
    fn spawn(&self, object: ObjectId, asset: &AssetHandle, label: &str);

    fn recolor(&self, object: ObjectId, color: Rgba);

    /// Multiply the object's current scale
    fn rescale(&self, object: ObjectId, factor: f32);

    fn attach_vfx(&self, object: ObjectId, vfx: &AssetHandle);

    fn destroy(&self, object: ObjectId);

    /// Animate a door open
    fn open_door(&self, door: DoorId);
}

/// Scene that only logs; used by the CLI front end
#[derive(Debug, Default)]
pub struct LoggingScene;

impl Scene for LoggingScene {
    fn spawn(&self, object: ObjectId, asset: &AssetHandle, label: &str) {
        info!(object = %object.short(), %asset, label, "✨ Spawned");
    }

    fn recolor(&self, object: ObjectId, color: Rgba) {
        info!(object = %object.short(), r = color.r, g = color.g, b = color.b, "Recolored");
    }

    fn rescale(&self, object: ObjectId, factor: f32) {
        info!(object = %object.short(), factor, "Rescaled");
    }

    fn attach_vfx(&self, object: ObjectId, vfx: &AssetHandle) {
        info!(object = %object.short(), %vfx, "Attached vfx");
    }

    fn destroy(&self, object: ObjectId) {
        info!(object = %object.short(), "Destroyed");
    }

    fn open_door(&self, door: DoorId) {
        info!(%door, "🚪 Door opened");
    }
}
