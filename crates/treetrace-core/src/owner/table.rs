use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::owner::Owner;
use crate::tree::element::WeakElementRef;
use crate::tree::{Element, TargetKind, Trackable};

/// Derives the owner of a trackable object from its structure (e.g. an
/// attribute node's owner is the element it sits on). Must not call back
/// into the table.
pub type DeriveFn = Box<dyn Fn(&dyn Any) -> Option<Element>>;

struct Entry {
    probe: Weak<dyn Any>,
    owner: WeakElementRef,
}

impl Entry {
    fn key_alive(&self) -> bool {
        self.probe.strong_count() > 0
    }

    fn owner(&self) -> Option<Element> {
        self.owner.upgrade().map(Element::from_ref)
    }
}

/// Side table mapping trackable objects to their owners.
///
/// Both sides of an entry are weak: the key's lifetime is never extended by
/// its presence here, and a dead owner simply stops resolving (the
/// instrumentation layer falls back to shadow placeholders where identity
/// must survive). Keys are allocation addresses paired with a liveness
/// probe, so a recycled address is never mistaken for the old object.
/// Explicit entries take precedence over registered per-kind derivation
/// rules.
pub struct OwnerTable {
    entries: RefCell<HashMap<usize, Entry>>,
    derivers: RefCell<HashMap<TargetKind, DeriveFn>>,
}

impl OwnerTable {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            derivers: RefCell::new(HashMap::new()),
        }
    }

    /// Registers a derivation rule for every instance of a kind.
    /// The first registration for a kind wins.
    pub fn register_deriver(&self, kind: TargetKind, derive: DeriveFn) {
        self.derivers.borrow_mut().entry(kind).or_insert(derive);
    }

    pub fn has_owner(&self, obj: &dyn Trackable) -> bool {
        self.resolve(obj).is_some()
    }

    /// Resolves the owner, `Owner::Null` when nothing matches. Callers are
    /// expected to check `has_owner` first when a real owner is required.
    pub fn get_owner(&self, obj: &dyn Trackable) -> Owner {
        match self.resolve(obj) {
            Some(element) => Owner::Real(element),
            None => Owner::Null,
        }
    }

    /// Records an explicit owner. First writer wins: returns false (and
    /// leaves the entry alone) if a live entry already exists.
    pub fn set_owner(&self, obj: &dyn Trackable, owner: &Element) -> bool {
        let key = obj.track_key();
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.get(&key) {
            if entry.key_alive() && entry.owner().is_some() {
                return false;
            }
        }
        entries.insert(
            key,
            Entry {
                probe: obj.probe(),
                owner: Rc::downgrade(&owner.inner),
            },
        );
        true
    }

    pub fn has_shadow_owner(&self, obj: &dyn Trackable) -> bool {
        self.resolve(obj)
            .map(|element| element.is_shadow_anchor())
            .unwrap_or(false)
    }

    /// Drops entries whose key or owner is no longer alive.
    /// Returns how many went.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, entry| entry.key_alive() && entry.owner().is_some());
        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!("pruned {pruned} dead owner entries");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn resolve(&self, obj: &dyn Trackable) -> Option<Element> {
        let key = obj.track_key();
        let cached = {
            let entries = self.entries.borrow();
            entries
                .get(&key)
                .map(|entry| (entry.key_alive(), entry.owner()))
        };
        match cached {
            Some((true, Some(owner))) => return Some(owner),
            Some(_) => {
                self.entries.borrow_mut().remove(&key);
            }
            None => {}
        }
        let derivers = self.derivers.borrow();
        derivers.get(&obj.kind()).and_then(|derive| derive(obj.as_any()))
    }
}

impl Default for OwnerTable {
    fn default() -> Self {
        Self::new()
    }
}
