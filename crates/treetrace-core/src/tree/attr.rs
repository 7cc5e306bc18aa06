use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::tree::element::{Element, WeakElementRef};
use crate::tree::{TargetKind, Trackable};

/// A named attribute node. May live on an element or float detached; a
/// detached node that is mutated gets anchored to a shadow placeholder by
/// the interception layer.
#[derive(Clone)]
pub struct Attr {
    inner: Rc<RefCell<AttrData>>,
}

struct AttrData {
    name: String,
    value: String,
    namespace_uri: Option<String>,
    owner_element: Option<WeakElementRef>,
    // Placeholder anchoring a detached node; held strongly so the anchor
    // lives exactly as long as the node it anchors.
    placeholder: Option<Element>,
}

impl Attr {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(AttrData {
                name: name.to_ascii_lowercase(),
                value: value.to_string(),
                namespace_uri: None,
                owner_element: None,
                placeholder: None,
            })),
        }
    }

    pub fn new_ns(namespace_uri: &str, name: &str, value: &str) -> Self {
        let attr = Self::new(name, value);
        attr.inner.borrow_mut().namespace_uri = Some(namespace_uri.to_string());
        attr
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn value(&self) -> String {
        self.inner.borrow().value.clone()
    }

    pub fn set_value(&self, value: &str) {
        self.inner.borrow_mut().value = value.to_string();
    }

    pub fn namespace_uri(&self) -> Option<String> {
        self.inner.borrow().namespace_uri.clone()
    }

    pub fn owner_element(&self) -> Option<Element> {
        self.inner
            .borrow()
            .owner_element
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Element::from_ref)
    }

    pub(crate) fn set_owner_element(&self, owner: Option<WeakElementRef>) {
        self.inner.borrow_mut().owner_element = owner;
    }

    /// Anchors this detached node to a placeholder owner element. The node
    /// keeps its placeholder alive; the placeholder does not list the node
    /// among its attributes, so no reference cycle forms.
    pub fn anchor_to(&self, placeholder: &Element) {
        let mut data = self.inner.borrow_mut();
        data.owner_element = Some(std::rc::Rc::downgrade(&placeholder.inner));
        data.placeholder = Some(placeholder.clone());
    }

    /// A fresh, unowned node carrying the same name, namespace and value.
    /// Used when a shadow-owned node is inserted somewhere real, so the
    /// original's identity is not aliased into the new location.
    pub fn clone_detached(&self) -> Attr {
        let data = self.inner.borrow();
        match &data.namespace_uri {
            Some(ns) => Attr::new_ns(ns, &data.name, &data.value),
            None => Attr::new(&data.name, &data.value),
        }
    }

    pub fn ptr_eq(&self, other: &Attr) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Trackable for Attr {
    fn kind(&self) -> TargetKind {
        TargetKind::Attr
    }

    fn track_key(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    fn probe(&self) -> Weak<dyn Any> {
        let rc: Rc<dyn Any> = self.inner.clone();
        Rc::downgrade(&rc)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("Attr")
            .field("name", &data.name)
            .field("value", &data.value)
            .finish()
    }
}
