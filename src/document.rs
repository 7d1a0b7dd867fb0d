pub mod reader;

use crate::bpmn::Selector;
use std::fmt::Display;

/// Index of an element inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub(crate) namespace: Option<String>,
    pub(crate) local_name: String,
    pub(crate) value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    local_name: String,
    attributes: Vec<Attribute>,
    // Text before the first child element
    text: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    // One past the last descendant
    end: usize,
}

impl Element {
    pub(crate) fn new(
        namespace: Option<String>,
        local_name: String,
        attributes: Vec<Attribute>,
    ) -> Self {
        Self {
            namespace,
            local_name,
            attributes,
            text: None,
            parent: None,
            children: Vec::new(),
            end: 0,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Attribute without a namespace prefix.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.is_none() && attr.local_name == local_name)
            .map(|attr| attr.value.as_str())
    }

    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.as_deref() == Some(namespace) && attr.local_name == local_name)
            .map(|attr| attr.value.as_str())
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

impl Attribute {
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Parsed XML tree. Elements are stored in document order and the first one is the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All elements, root included.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(index, element)| (ElementId(index), element))
    }

    /// Descendants of `id` in document order, `id` excluded.
    pub fn descendants(&self, id: ElementId) -> impl Iterator<Item = (ElementId, &Element)> {
        let range = match self.elements.get(id.0) {
            Some(element) => id.0 + 1..element.end,
            None => 0..0,
        };
        self.elements[range.clone()]
            .iter()
            .zip(range)
            .map(|(element, index)| (ElementId(index), element))
    }

    /// Every element below the root matching `selector`, in document order.
    pub fn select(&self, selector: Selector) -> impl Iterator<Item = (ElementId, &Element)> {
        self.descendants(self.root())
            .filter(move |(_, element)| selector.matches(element))
    }

    /// First descendant of `id` matching `selector`.
    pub fn find(&self, id: ElementId, selector: Selector) -> Option<(ElementId, &Element)> {
        self.descendants(id)
            .find(|(_, element)| selector.matches(element))
    }

    /// `id` itself, then its parent, up to the root.
    pub fn ancestors(&self, id: ElementId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            next: self.get(id).map(|_| id),
        }
    }

    pub fn parent(&self, id: ElementId) -> Option<&Element> {
        self.get(id)?.parent.and_then(|parent| self.get(parent))
    }
}

pub struct Ancestors<'a> {
    document: &'a Document,
    next: Option<ElementId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (ElementId, &'a Element);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let element = self.document.get(id)?;
        self.next = element.parent;
        Some((id, element))
    }
}
