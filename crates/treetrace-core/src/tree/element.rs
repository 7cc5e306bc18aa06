use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::CoreError;
use crate::tree::attr::Attr;
use crate::tree::satellite::{AttrMap, Dataset, StyleView, TokenList};
use crate::tree::{TargetKind, Trackable};

/// Reserved tag for placeholder nodes that anchor detached trackable
/// objects. Recognition is structural (tag comparison), so synthetically
/// constructed anchors are recognized too.
pub const SHADOW_ANCHOR_TAG: &str = "shadow-anchor";

pub(crate) type ElementRef = Rc<RefCell<ElementData>>;
pub(crate) type WeakElementRef = Weak<RefCell<ElementData>>;

pub(crate) struct ElementData {
    pub(crate) tag_name: String,
    pub(crate) attributes: Vec<Attr>,
    pub(crate) children: Vec<Element>,
    pub(crate) parent: Option<WeakElementRef>,
    pub(crate) text: String,
    pub(crate) style: Vec<(String, String)>,
    pub(crate) satellites: SatelliteCache,
}

/// Satellite views are created lazily and cached so repeated access yields
/// the identical underlying view instance.
#[derive(Default)]
pub(crate) struct SatelliteCache {
    pub(crate) attr_map: Option<AttrMap>,
    pub(crate) style_view: Option<StyleView>,
    pub(crate) class_list: Option<TokenList>,
    pub(crate) dataset: Option<Dataset>,
}

/// A node of the mutable object tree. Cheap to clone; identity is by
/// reference (`ptr_eq`), never by value.
#[derive(Clone)]
pub struct Element {
    pub(crate) inner: ElementRef,
}

impl Element {
    pub fn new(tag_name: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ElementData {
                tag_name: tag_name.to_ascii_lowercase(),
                attributes: Vec::new(),
                children: Vec::new(),
                parent: None,
                text: String::new(),
                style: Vec::new(),
                satellites: SatelliteCache::default(),
            })),
        }
    }

    /// A placeholder node anchoring otherwise-detached trackable objects.
    pub fn shadow_anchor() -> Self {
        Self::new(SHADOW_ANCHOR_TAG)
    }

    pub fn is_shadow_anchor(&self) -> bool {
        self.inner.borrow().tag_name == SHADOW_ANCHOR_TAG
    }

    pub(crate) fn from_ref(inner: ElementRef) -> Self {
        Self { inner }
    }

    pub fn tag_name(&self) -> String {
        self.inner.borrow().tag_name.clone()
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /* attributes */

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .attributes
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.value())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let existing = {
            let data = self.inner.borrow();
            data.attributes.iter().find(|a| a.name() == name).cloned()
        };
        match existing {
            Some(attr) => attr.set_value(value),
            None => {
                let attr = Attr::new(name, value);
                attr.set_owner_element(Some(Rc::downgrade(&self.inner)));
                self.inner.borrow_mut().attributes.push(attr);
            }
        }
    }

    /// Detaches and returns the named attribute node, if present.
    pub fn remove_attribute(&self, name: &str) -> Option<Attr> {
        let attr = {
            let mut data = self.inner.borrow_mut();
            let index = data.attributes.iter().position(|a| a.name() == name)?;
            data.attributes.remove(index)
        };
        attr.set_owner_element(None);
        Some(attr)
    }

    /// Adopts an attribute node, replacing (and returning) any attribute of
    /// the same name. An attribute node already owned by a different element
    /// is rejected.
    pub fn set_attribute_node(&self, attr: Attr) -> Result<Option<Attr>, CoreError> {
        if let Some(owner) = attr.owner_element() {
            if !owner.ptr_eq(self) {
                return Err(CoreError::AttrInUse(attr.name()));
            }
        }
        let name = attr.name();
        attr.set_owner_element(Some(Rc::downgrade(&self.inner)));
        let mut data = self.inner.borrow_mut();
        let replaced = match data.attributes.iter().position(|a| a.name() == name) {
            Some(index) if data.attributes[index].ptr_eq(&attr) => None,
            Some(index) => {
                let old = std::mem::replace(&mut data.attributes[index], attr);
                drop(data);
                old.set_owner_element(None);
                Some(old)
            }
            None => {
                data.attributes.push(attr);
                None
            }
        };
        Ok(replaced)
    }

    pub fn attribute_nodes(&self) -> Vec<Attr> {
        self.inner.borrow().attributes.clone()
    }

    /* children */

    pub fn parent(&self) -> Option<Element> {
        self.inner
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Element::from_ref)
    }

    pub fn children(&self) -> Vec<Element> {
        self.inner.borrow().children.clone()
    }

    pub fn append_child(&self, child: &Element) -> Result<(), CoreError> {
        self.ensure_insertable(child)?;
        child.detach();
        child.inner.borrow_mut().parent = Some(Rc::downgrade(&self.inner));
        self.inner.borrow_mut().children.push(child.clone());
        Ok(())
    }

    pub fn insert_before(
        &self,
        child: &Element,
        reference: Option<&Element>,
    ) -> Result<(), CoreError> {
        let Some(reference) = reference else {
            return self.append_child(child);
        };
        self.ensure_insertable(child)?;
        if !self
            .inner
            .borrow()
            .children
            .iter()
            .any(|c| c.ptr_eq(reference))
        {
            return Err(CoreError::NotFound(format!(
                "reference <{}> is not a child of <{}>",
                reference.tag_name(),
                self.tag_name()
            )));
        }
        child.detach();
        {
            let mut data = self.inner.borrow_mut();
            let index = data
                .children
                .iter()
                .position(|c| c.ptr_eq(reference))
                .unwrap_or(data.children.len());
            data.children.insert(index, child.clone());
        }
        child.inner.borrow_mut().parent = Some(Rc::downgrade(&self.inner));
        Ok(())
    }

    pub fn remove_child(&self, child: &Element) -> Result<(), CoreError> {
        {
            let mut data = self.inner.borrow_mut();
            let Some(index) = data.children.iter().position(|c| c.ptr_eq(child)) else {
                return Err(CoreError::NotFound(format!(
                    "<{}> is not a child of <{}>",
                    child.tag_name(),
                    data.tag_name
                )));
            };
            data.children.remove(index);
        }
        child.inner.borrow_mut().parent = None;
        Ok(())
    }

    fn ensure_insertable(&self, child: &Element) -> Result<(), CoreError> {
        if self.has_ancestor_or_self(child) {
            return Err(CoreError::Hierarchy(format!(
                "<{}> would become its own ancestor",
                child.tag_name()
            )));
        }
        Ok(())
    }

    fn has_ancestor_or_self(&self, candidate: &Element) -> bool {
        let mut cursor = Some(self.clone());
        while let Some(node) = cursor {
            if node.ptr_eq(candidate) {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.inner.borrow_mut().children.retain(|c| !c.ptr_eq(self));
        }
        self.inner.borrow_mut().parent = None;
    }

    /* text */

    pub fn text(&self) -> String {
        self.inner.borrow().text.clone()
    }

    pub fn set_text(&self, text: &str) {
        self.inner.borrow_mut().text = text.to_string();
    }

    /* satellite views */

    pub fn attribute_map(&self) -> AttrMap {
        if let Some(map) = self.inner.borrow().satellites.attr_map.clone() {
            return map;
        }
        let map = AttrMap::new(Rc::downgrade(&self.inner));
        self.inner.borrow_mut().satellites.attr_map = Some(map.clone());
        map
    }

    pub fn style_view(&self) -> StyleView {
        if let Some(view) = self.inner.borrow().satellites.style_view.clone() {
            return view;
        }
        let view = StyleView::new(Rc::downgrade(&self.inner));
        self.inner.borrow_mut().satellites.style_view = Some(view.clone());
        view
    }

    pub fn class_list(&self) -> TokenList {
        if let Some(list) = self.inner.borrow().satellites.class_list.clone() {
            return list;
        }
        let list = TokenList::new(Rc::downgrade(&self.inner), "class");
        self.inner.borrow_mut().satellites.class_list = Some(list.clone());
        list
    }

    pub fn dataset(&self) -> Dataset {
        if let Some(dataset) = self.inner.borrow().satellites.dataset.clone() {
            return dataset;
        }
        let dataset = Dataset::new(Rc::downgrade(&self.inner));
        self.inner.borrow_mut().satellites.dataset = Some(dataset.clone());
        dataset
    }
}

impl Trackable for Element {
    fn kind(&self) -> TargetKind {
        TargetKind::Element
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

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.inner.borrow();
        f.debug_struct("Element")
            .field("tag_name", &data.tag_name)
            .field("attributes", &data.attributes.len())
            .field("children", &data.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_set_get_remove() {
        let el = Element::new("div");
        assert_eq!(el.get_attribute("id"), None);

        el.set_attribute("id", "main");
        assert_eq!(el.get_attribute("id"), Some("main".into()));

        el.set_attribute("id", "other");
        assert_eq!(el.get_attribute("id"), Some("other".into()));
        assert_eq!(el.attribute_nodes().len(), 1);

        let removed = el.remove_attribute("id").unwrap();
        assert_eq!(removed.value(), "other");
        assert!(removed.owner_element().is_none());
        assert!(!el.has_attribute("id"));
    }

    #[test]
    fn test_tag_name_is_lowercased() {
        let el = Element::new("DIV");
        assert_eq!(el.tag_name(), "div");
    }

    #[test]
    fn test_append_and_remove_child() {
        let parent = Element::new("ul");
        let child = Element::new("li");

        parent.append_child(&child).unwrap();
        assert_eq!(parent.children().len(), 1);
        assert!(child.parent().unwrap().ptr_eq(&parent));

        parent.remove_child(&child).unwrap();
        assert!(parent.children().is_empty());
        assert!(child.parent().is_none());
    }

    #[test]
    fn test_append_reparents() {
        let a = Element::new("div");
        let b = Element::new("div");
        let child = Element::new("span");

        a.append_child(&child).unwrap();
        b.append_child(&child).unwrap();
        assert!(a.children().is_empty());
        assert!(child.parent().unwrap().ptr_eq(&b));
    }

    #[test]
    fn test_append_rejects_cycles() {
        let grandparent = Element::new("div");
        let parent = Element::new("div");
        let child = Element::new("div");
        grandparent.append_child(&parent).unwrap();
        parent.append_child(&child).unwrap();

        assert!(matches!(
            child.append_child(&grandparent),
            Err(CoreError::Hierarchy(_))
        ));
        assert!(matches!(
            parent.append_child(&parent),
            Err(CoreError::Hierarchy(_))
        ));
    }

    #[test]
    fn test_insert_before() {
        let parent = Element::new("ul");
        let first = Element::new("li");
        let second = Element::new("li");
        let inserted = Element::new("li");

        parent.append_child(&first).unwrap();
        parent.append_child(&second).unwrap();
        parent.insert_before(&inserted, Some(&second)).unwrap();

        let children = parent.children();
        assert!(children[0].ptr_eq(&first));
        assert!(children[1].ptr_eq(&inserted));
        assert!(children[2].ptr_eq(&second));

        let stranger = Element::new("li");
        assert!(matches!(
            parent.insert_before(&Element::new("li"), Some(&stranger)),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_attribute_node_replace_and_in_use() {
        let el = Element::new("div");
        let attr = Attr::new("title", "first");
        assert!(el.set_attribute_node(attr.clone()).unwrap().is_none());
        assert!(attr.owner_element().unwrap().ptr_eq(&el));

        let replacement = Attr::new("title", "second");
        let replaced = el.set_attribute_node(replacement).unwrap().unwrap();
        assert!(replaced.ptr_eq(&attr));
        assert!(replaced.owner_element().is_none());
        assert_eq!(el.get_attribute("title"), Some("second".into()));

        let other = Element::new("div");
        let stolen = other.attribute_nodes().into_iter().next();
        assert!(stolen.is_none());
        let owned = el.attribute_nodes().into_iter().next().unwrap();
        assert!(matches!(
            other.set_attribute_node(owned),
            Err(CoreError::AttrInUse(_))
        ));
    }

    #[test]
    fn test_shadow_anchor_is_structural() {
        assert!(Element::shadow_anchor().is_shadow_anchor());
        // Anchors built outside the factory are recognized too.
        assert!(Element::new(SHADOW_ANCHOR_TAG).is_shadow_anchor());
        assert!(Element::new("Shadow-Anchor").is_shadow_anchor());
        assert!(!Element::new("div").is_shadow_anchor());
    }

    #[test]
    fn test_satellites_are_identity_cached() {
        let el = Element::new("div");
        assert!(el.attribute_map().ptr_eq(&el.attribute_map()));
        assert!(el.style_view().ptr_eq(&el.style_view()));
        assert!(el.class_list().ptr_eq(&el.class_list()));
        assert!(el.dataset().ptr_eq(&el.dataset()));
    }

    #[test]
    fn test_track_key_is_stable_across_clones() {
        let el = Element::new("div");
        let other = el.clone();
        assert_eq!(el.track_key(), other.track_key());
        assert_ne!(el.track_key(), Element::new("div").track_key());
    }
}
