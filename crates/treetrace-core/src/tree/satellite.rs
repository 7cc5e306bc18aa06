//! Auxiliary live views an element exposes: its attribute collection, a
//! computed-style-like view, a token list over the `class` attribute and a
//! `data-*` map. Each view is a thin handle onto its element; the element is
//! held weakly so a cached view never keeps its element alive.

use std::any::Any;
use std::rc::{Rc, Weak};

use crate::error::CoreError;
use crate::tree::attr::Attr;
use crate::tree::element::{Element, WeakElementRef};
use crate::tree::{TargetKind, Trackable};

struct ViewInner {
    element: WeakElementRef,
}

struct TokenListInner {
    element: WeakElementRef,
    attr_name: &'static str,
}

fn upgrade(element: &WeakElementRef) -> Option<Element> {
    element.upgrade().map(Element::from_ref)
}

/// Live view over an element's attribute nodes.
#[derive(Clone)]
pub struct AttrMap {
    inner: Rc<ViewInner>,
}

impl AttrMap {
    pub(crate) fn new(element: WeakElementRef) -> Self {
        Self {
            inner: Rc::new(ViewInner { element }),
        }
    }

    pub fn element(&self) -> Option<Element> {
        upgrade(&self.inner.element)
    }

    pub fn get_named_item(&self, name: &str) -> Option<Attr> {
        self.element()?
            .attribute_nodes()
            .into_iter()
            .find(|a| a.name() == name)
    }

    pub fn set_named_item(&self, attr: Attr) -> Result<Option<Attr>, CoreError> {
        self.element()
            .ok_or(CoreError::Detached)?
            .set_attribute_node(attr)
    }

    pub fn remove_named_item(&self, name: &str) -> Result<Attr, CoreError> {
        self.element()
            .ok_or(CoreError::Detached)?
            .remove_attribute(name)
            .ok_or_else(|| CoreError::NotFound(format!("attribute '{name}'")))
    }

    pub fn len(&self) -> usize {
        self.element().map(|e| e.attribute_nodes().len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(&self, other: &AttrMap) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Live view over an element's style declarations.
#[derive(Clone)]
pub struct StyleView {
    inner: Rc<ViewInner>,
}

impl StyleView {
    pub(crate) fn new(element: WeakElementRef) -> Self {
        Self {
            inner: Rc::new(ViewInner { element }),
        }
    }

    pub fn element(&self) -> Option<Element> {
        upgrade(&self.inner.element)
    }

    pub fn get_property(&self, name: &str) -> Option<String> {
        let element = self.element()?;
        let data = element.inner.borrow();
        data.style
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn set_property(&self, name: &str, value: &str) -> Result<(), CoreError> {
        let element = self.element().ok_or(CoreError::Detached)?;
        let mut data = element.inner.borrow_mut();
        match data.style.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => data.style.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn remove_property(&self, name: &str) -> Result<Option<String>, CoreError> {
        let element = self.element().ok_or(CoreError::Detached)?;
        let mut data = element.inner.borrow_mut();
        match data.style.iter().position(|(n, _)| n == name) {
            Some(index) => Ok(Some(data.style.remove(index).1)),
            None => Ok(None),
        }
    }

    pub fn properties(&self) -> Vec<(String, String)> {
        self.element()
            .map(|e| e.inner.borrow().style.clone())
            .unwrap_or_default()
    }

    pub fn ptr_eq(&self, other: &StyleView) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Live, ordered set of whitespace-separated tokens backed by one attribute
/// (the `class` attribute for an element's class list).
#[derive(Clone)]
pub struct TokenList {
    inner: Rc<TokenListInner>,
}

impl TokenList {
    pub(crate) fn new(element: WeakElementRef, attr_name: &'static str) -> Self {
        Self {
            inner: Rc::new(TokenListInner { element, attr_name }),
        }
    }

    pub fn element(&self) -> Option<Element> {
        upgrade(&self.inner.element)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.read().unwrap_or_default()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens().iter().any(|t| t == token)
    }

    pub fn add(&self, token: &str) -> Result<(), CoreError> {
        validate_token(token)?;
        let mut tokens = self.read()?;
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
        self.write(&tokens)
    }

    pub fn remove(&self, token: &str) -> Result<(), CoreError> {
        validate_token(token)?;
        let mut tokens = self.read()?;
        tokens.retain(|t| t != token);
        self.write(&tokens)
    }

    /// Returns whether the token is present after toggling.
    pub fn toggle(&self, token: &str) -> Result<bool, CoreError> {
        if self.contains(token) {
            self.remove(token)?;
            Ok(false)
        } else {
            self.add(token)?;
            Ok(true)
        }
    }

    /// Returns whether a replacement happened.
    pub fn replace(&self, old: &str, new: &str) -> Result<bool, CoreError> {
        validate_token(old)?;
        validate_token(new)?;
        let mut tokens = self.read()?;
        match tokens.iter().position(|t| t == old) {
            Some(index) => {
                tokens[index] = new.to_string();
                self.write(&tokens)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn ptr_eq(&self, other: &TokenList) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn read(&self) -> Result<Vec<String>, CoreError> {
        let element = self.element().ok_or(CoreError::Detached)?;
        Ok(element
            .get_attribute(self.inner.attr_name)
            .map(|v| v.split_whitespace().map(String::from).collect())
            .unwrap_or_default())
    }

    fn write(&self, tokens: &[String]) -> Result<(), CoreError> {
        let element = self.element().ok_or(CoreError::Detached)?;
        element.set_attribute(self.inner.attr_name, &tokens.join(" "));
        Ok(())
    }
}

fn validate_token(token: &str) -> Result<(), CoreError> {
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidToken(token.to_string()));
    }
    Ok(())
}

/// Live view over an element's `data-*` attributes, keyed camelCase.
#[derive(Clone)]
pub struct Dataset {
    inner: Rc<ViewInner>,
}

impl Dataset {
    pub(crate) fn new(element: WeakElementRef) -> Self {
        Self {
            inner: Rc::new(ViewInner { element }),
        }
    }

    pub fn element(&self) -> Option<Element> {
        upgrade(&self.inner.element)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.element()?.get_attribute(&data_attr_name(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let element = self.element().ok_or(CoreError::Detached)?;
        element.set_attribute(&data_attr_name(key), value);
        Ok(())
    }

    /// Returns whether the key was present.
    pub fn remove(&self, key: &str) -> Result<bool, CoreError> {
        let element = self.element().ok_or(CoreError::Detached)?;
        Ok(element.remove_attribute(&data_attr_name(key)).is_some())
    }

    pub fn ptr_eq(&self, other: &Dataset) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Maps a camelCase dataset key to its attribute name:
/// `fooBar` -> `data-foo-bar`.
fn data_attr_name(key: &str) -> String {
    let mut name = String::from("data-");
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            name.push('-');
            name.push(c.to_ascii_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}

macro_rules! impl_trackable_view {
    ($view:ident, $kind:ident) => {
        impl Trackable for $view {
            fn kind(&self) -> TargetKind {
                TargetKind::$kind
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
    };
}

impl_trackable_view!(AttrMap, AttrMap);
impl_trackable_view!(StyleView, StyleView);
impl_trackable_view!(TokenList, TokenList);
impl_trackable_view!(Dataset, Dataset);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_map_named_items() {
        let el = Element::new("div");
        let map = el.attribute_map();

        map.set_named_item(Attr::new("id", "main")).unwrap();
        assert_eq!(map.get_named_item("id").unwrap().value(), "main");
        assert_eq!(map.len(), 1);

        let removed = map.remove_named_item("id").unwrap();
        assert_eq!(removed.value(), "main");
        assert!(map.is_empty());
        assert!(matches!(
            map.remove_named_item("id"),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_style_view_properties() {
        let el = Element::new("div");
        let style = el.style_view();

        style.set_property("color", "red").unwrap();
        style.set_property("color", "blue").unwrap();
        assert_eq!(style.get_property("color"), Some("blue".into()));
        assert_eq!(style.properties().len(), 1);

        assert_eq!(style.remove_property("color").unwrap(), Some("blue".into()));
        assert_eq!(style.remove_property("color").unwrap(), None);
    }

    #[test]
    fn test_token_list_backed_by_class_attribute() {
        let el = Element::new("div");
        let list = el.class_list();

        list.add("active").unwrap();
        list.add("active").unwrap();
        list.add("hidden").unwrap();
        assert_eq!(el.get_attribute("class"), Some("active hidden".into()));

        list.remove("active").unwrap();
        assert!(!list.contains("active"));

        assert!(list.toggle("active").unwrap());
        assert!(!list.toggle("active").unwrap());

        assert!(list.replace("hidden", "visible").unwrap());
        assert!(!list.replace("hidden", "visible").unwrap());
        assert_eq!(el.get_attribute("class"), Some("visible".into()));
    }

    #[test]
    fn test_token_validation() {
        let el = Element::new("div");
        let list = el.class_list();
        assert!(matches!(list.add(""), Err(CoreError::InvalidToken(_))));
        assert!(matches!(
            list.add("two words"),
            Err(CoreError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_dataset_key_mapping() {
        assert_eq!(data_attr_name("fooBar"), "data-foo-bar");
        assert_eq!(data_attr_name("x"), "data-x");

        let el = Element::new("div");
        let dataset = el.dataset();
        dataset.set("userId", "42").unwrap();
        assert_eq!(el.get_attribute("data-user-id"), Some("42".into()));
        assert_eq!(dataset.get("userId"), Some("42".into()));
        assert!(dataset.remove("userId").unwrap());
        assert!(!dataset.remove("userId").unwrap());
    }

    #[test]
    fn test_views_detach_when_element_drops() {
        let (style, list) = {
            let el = Element::new("div");
            (el.style_view(), el.class_list())
        };
        assert!(style.element().is_none());
        assert!(matches!(
            style.set_property("color", "red"),
            Err(CoreError::Detached)
        ));
        assert!(matches!(list.add("x"), Err(CoreError::Detached)));
        assert!(list.tokens().is_empty());
    }
}
