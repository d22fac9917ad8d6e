// Asset registry - loads each jewelry model once and owns it for the session

use crate::models::jewelry::{AssetError, AssetResult, GlbScene, JewelryCategory, JewelryModel};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Loads the scene behind one asset path
#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load(&self, category: JewelryCategory, path: &Path) -> AssetResult<GlbScene>;
}

/// Reads `.glb` files relative to the application root
pub struct FileAssetLoader {
    root: PathBuf,
}

impl FileAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetLoader for FileAssetLoader {
    async fn load(&self, category: JewelryCategory, path: &Path) -> AssetResult<GlbScene> {
        let full_path = self.root.join(path);
        debug!("Loading {} from {}", category, full_path.display());

        let bytes = tokio::fs::read(&full_path).await.map_err(|source| AssetError::Io {
            path: full_path.clone(),
            source,
        })?;

        GlbScene::parse(&bytes)
    }
}

/// Result of one asset load task
#[derive(Debug)]
pub struct AssetLoadOutcome {
    pub category: JewelryCategory,
    pub path: PathBuf,
    pub result: AssetResult<GlbScene>,
}

/// Start one load task per manifest entry.
///
/// Outcomes arrive on `tx` in completion order. A panicking loader still
/// produces an outcome for its category.
pub fn spawn_asset_loads(
    manifest: &BTreeMap<JewelryCategory, PathBuf>,
    loader: Arc<dyn AssetLoader>,
    tx: mpsc::UnboundedSender<AssetLoadOutcome>,
) -> Vec<JoinHandle<()>> {
    manifest
        .iter()
        .map(|(category, path)| {
            let category = *category;
            let path = path.clone();
            let loader = loader.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let task = {
                    let loader = loader.clone();
                    let path = path.clone();
                    tokio::spawn(async move { loader.load(category, &path).await })
                };

                let result = match task.await {
                    Ok(result) => result,
                    Err(e) => Err(AssetError::TaskFailed(e.to_string())),
                };

                // Receiver gone means the session already ended.
                let _ = tx.send(AssetLoadOutcome {
                    category,
                    path,
                    result,
                });
            })
        })
        .collect()
}

/// Load state of one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    Pending,
    Loaded,
    Failed(String),
}

/// Loaded jewelry models keyed by category
#[derive(Debug)]
pub struct AssetRegistry {
    models: HashMap<JewelryCategory, JewelryModel>,
    failures: HashMap<JewelryCategory, String>,
    model_scale: f32,
}

impl AssetRegistry {
    pub fn new(model_scale: f32) -> Self {
        Self {
            models: HashMap::new(),
            failures: HashMap::new(),
            model_scale,
        }
    }

    /// Register a loaded model, hidden. Returns `false` if the category was
    /// already resolved, in which case nothing changes.
    pub fn register(&mut self, category: JewelryCategory, source: PathBuf, scene: GlbScene) -> bool {
        if self.status(category) != AssetStatus::Pending {
            warn!("Ignoring duplicate load result for {}", category);
            return false;
        }

        let model = JewelryModel::new(category, source, scene, self.model_scale);
        self.models.insert(category, model);
        true
    }

    /// Record that a category will never load this session.
    pub fn mark_failed(&mut self, category: JewelryCategory, reason: String) -> bool {
        if self.status(category) != AssetStatus::Pending {
            warn!("Ignoring duplicate load result for {}", category);
            return false;
        }

        self.failures.insert(category, reason);
        true
    }

    pub fn status(&self, category: JewelryCategory) -> AssetStatus {
        if self.models.contains_key(&category) {
            AssetStatus::Loaded
        } else if let Some(reason) = self.failures.get(&category) {
            AssetStatus::Failed(reason.clone())
        } else {
            AssetStatus::Pending
        }
    }

    pub fn get(&self, category: JewelryCategory) -> Option<&JewelryModel> {
        self.models.get(&category)
    }

    pub fn get_mut(&mut self, category: JewelryCategory) -> Option<&mut JewelryModel> {
        self.models.get_mut(&category)
    }

    pub fn models(&self) -> impl Iterator<Item = &JewelryModel> {
        self.models.values()
    }

    pub fn visible_count(&self) -> usize {
        self.models.values().filter(|m| m.visible).count()
    }

    pub fn failed_categories(&self) -> Vec<JewelryCategory> {
        let mut failed: Vec<_> = self.failures.keys().copied().collect();
        failed.sort();
        failed
    }
}
