//! Document region registry.
//!
//! A region is a named piece of renderable content — markup for a
//! certificate, or a pre-rendered bitmap. Exports never rasterise the
//! registered region directly: they take an isolated clone sized to the
//! page content width, registered under a fresh id, so the original stays
//! untouched while the pipeline works.
//!
//! The clone's registry entry is owned by a [`CloneHandle`] guard and is
//! removed when the guard drops, on success and on every error path alike.

use image::DynamicImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// What a region renders from.
#[derive(Debug, Clone)]
pub enum RegionContent {
    /// HTML markup; needs a rasteriser backend that understands markup.
    Markup(String),
    /// A pre-rendered image.
    Bitmap(DynamicImage),
}

impl RegionContent {
    /// Short content-kind label used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RegionContent::Markup(_) => "markup",
            RegionContent::Bitmap(_) => "bitmap",
        }
    }
}

/// A registered renderable region.
#[derive(Debug, Clone)]
pub struct Region {
    pub id: String,
    pub content: RegionContent,
    /// Set on export clones: the page content width the clone is sized to.
    pub target_width_mm: Option<f32>,
}

/// Shared, thread-safe registry of regions.
#[derive(Clone, Default)]
pub struct RegionRegistry {
    inner: Arc<Mutex<HashMap<String, Region>>>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Region>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register (or replace) a region under `id`.
    pub fn register(&self, id: impl Into<String>, content: RegionContent) {
        let id = id.into();
        debug!("Registering region '{}' ({})", id, content.kind());
        let region = Region {
            id: id.clone(),
            content,
            target_width_mm: None,
        };
        self.lock().insert(id, region);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Region> {
        self.lock().get(id).cloned()
    }

    /// Remove a region; returns whether it was present.
    pub fn remove(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Number of registered regions (clones included).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clone `id` into a fresh `clone-<uuid>` entry sized to
    /// `target_width_mm`, returning the clone and the guard that removes it.
    ///
    /// Returns `None` when `id` is not registered.
    pub fn clone_for_export(
        &self,
        id: &str,
        target_width_mm: f32,
    ) -> Option<(Region, CloneHandle)> {
        let source = self.get(id)?;
        let clone_id = format!("clone-{}", Uuid::new_v4());
        let clone = Region {
            id: clone_id.clone(),
            content: source.content,
            target_width_mm: Some(target_width_mm),
        };
        self.lock().insert(clone_id.clone(), clone.clone());
        debug!(
            "Cloned region '{}' -> '{}' at {:.1} mm content width",
            id, clone_id, target_width_mm
        );
        Some((
            clone,
            CloneHandle {
                registry: self.clone(),
                id: clone_id,
            },
        ))
    }
}

/// Owns a clone's registry entry; removes it on drop.
pub struct CloneHandle {
    registry: RegionRegistry,
    id: String,
}

impl CloneHandle {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for CloneHandle {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
        debug!("Removed export clone '{}'", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_markup(id: &str) -> RegionRegistry {
        let reg = RegionRegistry::new();
        reg.register(id, RegionContent::Markup("<div>hi</div>".into()));
        reg
    }

    #[test]
    fn register_and_lookup() {
        let reg = registry_with_markup("cert");
        assert!(reg.contains("cert"));
        assert!(!reg.contains("other"));
        assert_eq!(reg.get("cert").unwrap().content.kind(), "markup");
    }

    #[test]
    fn clone_is_removed_when_handle_drops() {
        let reg = registry_with_markup("cert");
        {
            let (clone, _handle) = reg.clone_for_export("cert", 170.0).unwrap();
            assert!(clone.id.starts_with("clone-"));
            assert_eq!(clone.target_width_mm, Some(170.0));
            assert_eq!(reg.len(), 2);
        }
        // handle dropped: only the source remains
        assert_eq!(reg.len(), 1);
        assert!(reg.contains("cert"));
    }

    #[test]
    fn clone_of_missing_region_is_none() {
        let reg = RegionRegistry::new();
        assert!(reg.clone_for_export("ghost", 170.0).is_none());
    }

    #[test]
    fn remove_reports_presence() {
        let reg = registry_with_markup("cert");
        assert!(reg.remove("cert"));
        assert!(!reg.remove("cert"));
    }

    #[test]
    fn registering_same_id_replaces() {
        let reg = registry_with_markup("cert");
        reg.register("cert", RegionContent::Markup("<p>new</p>".into()));
        assert_eq!(reg.len(), 1);
        match reg.get("cert").unwrap().content {
            RegionContent::Markup(m) => assert!(m.contains("new")),
            _ => panic!("expected markup"),
        }
    }
}
