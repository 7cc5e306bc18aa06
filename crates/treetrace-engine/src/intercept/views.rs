//! Interception of the live auxiliary views an element exposes.
//!
//! Two shapes. `StyleProxy`/`DatasetProxy` wrap views whose mutations carry
//! no method of their own on the owning node: one wrapper allocation per
//! underlying view, cached so repeated access hands back the identical
//! wrapper. `TrackedAttrMap`/`TrackedTokenList` are plain tracked handles;
//! their getters only register the element as the view's owner.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use treetrace_core::tree::{
    Attr, AttrMap, Dataset, Element, StyleView, TargetKind, TokenList, Trackable,
};
use treetrace_core::CoreError;

use super::{Shared, TrackedAttr};
use crate::location;

/// One wrapper per underlying view instance. Keyed by the view's allocation
/// address with a liveness probe, exactly like the owner table.
pub(crate) struct ProxyCache<T> {
    entries: RefCell<HashMap<usize, CacheSlot<T>>>,
}

struct CacheSlot<T> {
    probe: Weak<dyn Any>,
    core: Rc<T>,
}

impl<T> ProxyCache<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }

    fn get_or_insert(
        &self,
        key: usize,
        probe: Weak<dyn Any>,
        build: impl FnOnce() -> T,
    ) -> Rc<T> {
        let mut entries = self.entries.borrow_mut();
        if let Some(slot) = entries.get(&key) {
            if slot.probe.strong_count() > 0 {
                return slot.core.clone();
            }
        }
        let core = Rc::new(build());
        entries.insert(
            key,
            CacheSlot {
                probe,
                core: core.clone(),
            },
        );
        core
    }
}

pub(crate) struct StyleProxyCore {
    view: StyleView,
}

/// Interception wrapper around a [`StyleView`]. Reads pass through;
/// mutations are bracketed and attributed to the view's owning element.
pub struct StyleProxy {
    core: Rc<StyleProxyCore>,
    shared: Rc<Shared>,
}

impl StyleProxy {
    pub(crate) fn obtain(shared: &Rc<Shared>, element: &Element) -> StyleProxy {
        let view = element.style_view();
        shared.owners.set_owner(&view, element);
        let core = shared.styles.get_or_insert(view.track_key(), view.probe(), || {
            StyleProxyCore { view: view.clone() }
        });
        StyleProxy {
            core,
            shared: shared.clone(),
        }
    }

    pub fn get_property(&self, name: &str) -> Option<String> {
        self.core.view.get_property(name)
    }

    pub fn properties(&self) -> Vec<(String, String)> {
        self.core.view.properties()
    }

    #[track_caller]
    pub fn set_property(&self, name: &str, value: &str) -> Result<(), CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            self.core.view.set_property(name, value)?;
            self.shared
                .record_general(&self.core.view, TargetKind::StyleView, "set_property");
            Ok(())
        })
    }

    #[track_caller]
    pub fn remove_property(&self, name: &str) -> Result<Option<String>, CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            let removed = self.core.view.remove_property(name)?;
            self.shared
                .record_general(&self.core.view, TargetKind::StyleView, "remove_property");
            Ok(removed)
        })
    }

    /// Whether two handles wrap the same cached wrapper instance.
    pub fn same_wrapper(&self, other: &StyleProxy) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

pub(crate) struct DatasetProxyCore {
    view: Dataset,
}

/// Interception wrapper around a [`Dataset`] view.
pub struct DatasetProxy {
    core: Rc<DatasetProxyCore>,
    shared: Rc<Shared>,
}

impl DatasetProxy {
    pub(crate) fn obtain(shared: &Rc<Shared>, element: &Element) -> DatasetProxy {
        let view = element.dataset();
        shared.owners.set_owner(&view, element);
        let core = shared
            .datasets
            .get_or_insert(view.track_key(), view.probe(), || DatasetProxyCore {
                view: view.clone(),
            });
        DatasetProxy {
            core,
            shared: shared.clone(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.core.view.get(key)
    }

    #[track_caller]
    pub fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            self.core.view.set(key, value)?;
            self.shared
                .record_general(&self.core.view, TargetKind::Dataset, "set");
            Ok(())
        })
    }

    #[track_caller]
    pub fn remove(&self, key: &str) -> Result<bool, CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            let removed = self.core.view.remove(key)?;
            self.shared
                .record_general(&self.core.view, TargetKind::Dataset, "remove");
            Ok(removed)
        })
    }

    /// Whether two handles wrap the same cached wrapper instance.
    pub fn same_wrapper(&self, other: &DatasetProxy) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

/// Tracked handle over the live attribute collection.
pub struct TrackedAttrMap {
    raw: AttrMap,
    shared: Rc<Shared>,
}

impl TrackedAttrMap {
    pub(crate) fn new(raw: AttrMap, shared: Rc<Shared>) -> Self {
        Self { raw, shared }
    }

    pub fn raw(&self) -> &AttrMap {
        &self.raw
    }

    pub fn get_named_item(&self, name: &str) -> Option<Attr> {
        self.raw.get_named_item(name)
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Adopts an attribute node into the collection, normalizing a
    /// shadow-owned node into a fresh clone and linking the timelines via
    /// the record's `merge` field.
    #[track_caller]
    pub fn set_named_item(&self, attr: &TrackedAttr) -> Result<Option<Attr>, CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            let (pure, merge) = self.shared.normalize_attr(attr.raw());
            let replaced = self.raw.set_named_item(pure)?;
            self.shared
                .record(&self.raw, TargetKind::AttrMap, "set_named_item", merge);
            Ok(replaced)
        })
    }

    #[track_caller]
    pub fn remove_named_item(&self, name: &str) -> Result<Attr, CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            let removed = self.raw.remove_named_item(name)?;
            self.shared
                .record_general(&self.raw, TargetKind::AttrMap, "remove_named_item");
            Ok(removed)
        })
    }
}

/// Tracked handle over the live class token list.
pub struct TrackedTokenList {
    raw: TokenList,
    shared: Rc<Shared>,
}

impl TrackedTokenList {
    pub(crate) fn new(raw: TokenList, shared: Rc<Shared>) -> Self {
        Self { raw, shared }
    }

    pub fn raw(&self) -> &TokenList {
        &self.raw
    }

    pub fn contains(&self, token: &str) -> bool {
        self.raw.contains(token)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.raw.tokens()
    }

    #[track_caller]
    pub fn add(&self, token: &str) -> Result<(), CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            self.raw.add(token)?;
            self.shared
                .record_general(&self.raw, TargetKind::TokenList, "add");
            Ok(())
        })
    }

    #[track_caller]
    pub fn remove(&self, token: &str) -> Result<(), CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            self.raw.remove(token)?;
            self.shared
                .record_general(&self.raw, TargetKind::TokenList, "remove");
            Ok(())
        })
    }

    #[track_caller]
    pub fn toggle(&self, token: &str) -> Result<bool, CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            let present = self.raw.toggle(token)?;
            self.shared
                .record_general(&self.raw, TargetKind::TokenList, "toggle");
            Ok(present)
        })
    }

    #[track_caller]
    pub fn replace(&self, old: &str, new: &str) -> Result<bool, CoreError> {
        let loc = location::here();
        self.shared.bracketed(loc, || {
            let replaced = self.raw.replace(old, new)?;
            self.shared
                .record_general(&self.raw, TargetKind::TokenList, "replace");
            Ok(replaced)
        })
    }
}
