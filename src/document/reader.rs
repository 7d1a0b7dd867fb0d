mod builder;

use crate::document::{Attribute, Document, Element};
use builder::TreeBuilder;
use quick_xml::{
    NsReader,
    encoding::EncodingError,
    escape::resolve_predefined_entity,
    events::{BytesRef, BytesStart, Event, attributes::AttrError},
    name::ResolveResult,
};
use std::{borrow::Cow, str};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    Attr(#[from] AttrError),

    #[error("{0}")]
    Encoding(#[from] EncodingError),

    #[error("{0}")]
    Utf8(#[from] str::Utf8Error),

    #[error("unknown namespace prefix '{0}'")]
    UnknownPrefix(String),

    #[error("unknown entity '&{0};'")]
    UnknownEntity(String),

    #[error("{0}")]
    Structure(&'static str),
}

impl From<&'static str> for ReadError {
    fn from(value: &'static str) -> Self {
        ReadError::Structure(value)
    }
}

/// Parse `xml` into a [`Document`] with resolved namespaces.
pub fn read_document(xml: &[u8]) -> Result<Document, ReadError> {
    let mut reader = NsReader::from_reader(xml);
    let mut builder = TreeBuilder::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(bs) => builder.start(element(&reader, &bs)?)?,
            Event::Empty(bs) => {
                builder.start(element(&reader, &bs)?)?;
                builder.end();
            }
            Event::End(_) => builder.end(),
            Event::Text(bt) => builder.add_text(&bt.decode()?)?,
            Event::CData(bc) => builder.add_text(&bc.decode()?)?,
            Event::GeneralRef(br) => builder.add_text(&resolve_reference(&br)?)?,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(builder.finish()?)
}

fn element<R>(reader: &NsReader<R>, bs: &BytesStart<'_>) -> Result<Element, ReadError> {
    let (resolved, local_name) = reader.resolve_element(bs.name());
    let element_ns = namespace(resolved)?;
    let local_name = str::from_utf8(local_name.as_ref())?.to_string();

    let mut attributes = Vec::new();
    for attr in bs.attributes() {
        let attr = attr?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, attr_name) = reader.resolve_attribute(attr.key);
        attributes.push(Attribute {
            namespace: namespace(resolved)?,
            local_name: str::from_utf8(attr_name.as_ref())?.to_string(),
            value: attr.unescape_value()?.into_owned(),
        });
    }

    Ok(Element::new(element_ns, local_name, attributes))
}

fn namespace(resolved: ResolveResult<'_>) -> Result<Option<String>, ReadError> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(str::from_utf8(ns.as_ref())?.to_string())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ReadError::UnknownPrefix(
            String::from_utf8_lossy(&prefix).into_owned(),
        )),
    }
}

fn resolve_reference<'a>(br: &'a BytesRef<'_>) -> Result<Cow<'a, str>, ReadError> {
    if let Some(ch) = br.resolve_char_ref()? {
        return Ok(Cow::Owned(ch.to_string()));
    }
    let name = br.decode()?;
    match resolve_predefined_entity(&name) {
        Some(value) => Ok(Cow::Borrowed(value)),
        None => Err(ReadError::UnknownEntity(name.into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_leading_text_with_references_and_cdata() -> Result<(), ReadError> {
        let document = read_document(
            br#"<root><a>x &lt; y &#38; <![CDATA[${ z }]]><b/>tail</a></root>"#,
        )?;
        let (_, a) = document.iter().nth(1).ok_or("a missing")?;
        assert_eq!(a.text(), Some("x < y & ${ z }"));
        Ok(())
    }

    #[test]
    fn element_and_attribute_namespaces_resolve_separately() -> Result<(), ReadError> {
        let document = read_document(
            br#"<bpmn:task xmlns:bpmn="urn:bpmn" xmlns:camunda="urn:camunda" id="t" camunda:class="a.B"/>"#,
        )?;
        let root = document.get(document.root()).ok_or("root missing")?;
        assert_eq!(root.namespace(), Some("urn:bpmn"));
        assert_eq!(root.local_name(), "task");
        // Unprefixed attributes have no namespace
        assert_eq!(root.attribute("id"), Some("t"));
        assert_eq!(root.attribute_ns("urn:camunda", "class"), Some("a.B"));
        assert_eq!(root.attribute("class"), None);
        assert_eq!(root.attributes().len(), 2);
        Ok(())
    }

    #[test]
    fn empty_element_has_no_text() -> Result<(), ReadError> {
        let document = read_document(b"<root><a/><b></b></root>")?;
        assert!(document.iter().all(|(_, e)| e.text().is_none()));
        Ok(())
    }

    #[test]
    fn malformed_documents_are_rejected() {
        for xml in [
            "",
            "<root>",
            "<root></other>",
            "<root/><second/>",
            "<x:root/>",
            "<root>&nope;</root>",
            "text<root/>",
        ] {
            assert!(read_document(xml.as_bytes()).is_err(), "accepted {xml:?}");
        }
    }
}
