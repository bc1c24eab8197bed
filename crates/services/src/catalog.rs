use std::sync::{Arc, PoisonError, RwLock};

use lesson_core::model::{Catalog, Module, ModuleId};

/// Handle to the one in-memory catalog, shared by the repository and the navigator.
///
/// Access goes through closures so a guard can never be held across an `.await`.
#[derive(Clone, Default)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Catalog>>,
}

impl SharedCatalog {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(catalog)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut Catalog) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Owned copy of every module, in catalog order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Module> {
        self.read(|catalog| catalog.modules().to_vec())
    }

    /// Owned copy of the first module with `id`.
    #[must_use]
    pub fn module(&self, id: &ModuleId) -> Option<Module> {
        self.read(|catalog| catalog.get(id).cloned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read(Catalog::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read(Catalog::is_empty)
    }
}

impl std::fmt::Debug for SharedCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCatalog")
            .field("modules", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{Content, Descriptor, Test};

    fn module(id: &str) -> Module {
        Module::new(
            ModuleId::new(id).unwrap(),
            "Swift",
            Content::new(Descriptor::default()),
            Test::new(Descriptor::default()),
        )
    }

    #[test]
    fn clones_share_one_catalog() {
        let shared = SharedCatalog::default();
        let other = shared.clone();
        other.write(|c| c.append(vec![module("m1")]));

        assert_eq!(shared.len(), 1);
        assert!(shared.module(&ModuleId::new("m1").unwrap()).is_some());
        assert!(shared.module(&ModuleId::new("m2").unwrap()).is_none());
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let shared = SharedCatalog::new(Catalog::new(vec![module("m1")]));
        let before = shared.snapshot();
        shared.write(|c| c.replace_all(Vec::new()));

        assert_eq!(before.len(), 1);
        assert!(shared.is_empty());
    }
}
