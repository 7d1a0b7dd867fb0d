use crate::{
    document::{Document, Element, ElementId},
    error::{CONTENT_AFTER_ROOT, MISSING_ROOT, UNEXPECTED_EOF},
};

const TEXT_OUTSIDE_ROOT: &str = "text outside the root element";

//
// elements: [ root, child, grandchild, child, ... ]   document (pre-)order
// stack:    [ root, child, grandchild ]               currently open
//
// Closing an element records `end`, one past its last descendant, so a
// subtree is the contiguous range `index + 1..end`.
//

#[derive(Default)]
pub(super) struct TreeBuilder {
    elements: Vec<Element>,
    stack: Vec<usize>,
}

impl TreeBuilder {
    pub(super) fn start(&mut self, mut element: Element) -> Result<(), &'static str> {
        if self.stack.is_empty() && !self.elements.is_empty() {
            return Err(CONTENT_AFTER_ROOT);
        }

        let index = self.elements.len();
        if let Some(parent) = self.stack.last().copied() {
            element.parent = Some(ElementId(parent));
            self.elements[parent].children.push(ElementId(index));
        }
        self.elements.push(element);
        self.stack.push(index);
        Ok(())
    }

    pub(super) fn end(&mut self) {
        if let Some(index) = self.stack.pop() {
            let end = self.elements.len();
            self.elements[index].end = end;
        }
    }

    // Only the text in front of the first child is kept.
    pub(super) fn add_text(&mut self, value: &str) -> Result<(), &'static str> {
        match self.stack.last().copied() {
            Some(index) => {
                let element = &mut self.elements[index];
                if element.children.is_empty() {
                    element.text.get_or_insert_with(String::new).push_str(value);
                }
                Ok(())
            }
            None if value.trim().is_empty() => Ok(()),
            None => Err(TEXT_OUTSIDE_ROOT),
        }
    }

    pub(super) fn finish(self) -> Result<Document, &'static str> {
        if !self.stack.is_empty() {
            return Err(UNEXPECTED_EOF);
        }
        if self.elements.is_empty() {
            return Err(MISSING_ROOT);
        }
        Ok(Document::new(self.elements))
    }
}
