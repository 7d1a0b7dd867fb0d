use crate::{
    bpmn::{ATTR_ID, ATTR_NAME},
    document::{Document, reader::read_document},
    error::{Error, Result},
};
use log::warn;
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};

const IN_MEMORY: &str = "<memory>";

/// A parsed BPMN file and its `id -> name` index, shared by both extractors.
#[derive(Debug)]
pub struct XmlContext {
    path: PathBuf,
    document: Document,
    id_to_name: HashMap<String, String>,
}

impl XmlContext {
    /// Load and parse the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::FileNotFound(path.into()),
            _ => Error::not_readable(path, err),
        })?;
        if !metadata.is_file() {
            return Err(Error::NotAFile(path.into()));
        }

        let xml = fs::read(path).map_err(|err| Error::not_readable(path, err))?;
        Self::from_bytes(path.into(), &xml)
    }

    fn from_bytes(path: PathBuf, xml: &[u8]) -> Result<Self> {
        let document = read_document(xml).map_err(|err| Error::invalid_xml(&path, err))?;
        let id_to_name = build_id_index(&document);
        Ok(Self {
            path,
            document,
            id_to_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn id_to_name(&self) -> &HashMap<String, String> {
        &self.id_to_name
    }

    /// Display name for `id`, or `id` itself when nothing declares it.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.id_to_name.get(id).map_or(id, String::as_str)
    }
}

impl FromStr for XmlContext {
    type Err = Error;

    /// Parse BPMN held in memory.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(IN_MEMORY.into(), s.as_bytes())
    }
}

// Every element with an id, whatever its namespace. Extension elements are referenced too.
fn build_id_index(document: &Document) -> HashMap<String, String> {
    let mut index = HashMap::new();
    for (_, element) in document.iter() {
        if let Some(id) = element.attribute(ATTR_ID) {
            let name = element.attribute(ATTR_NAME).unwrap_or(id);
            if index.insert(id.to_string(), name.to_string()).is_some() {
                warn!(r#"Element id "{id}" is declared multiple times"#);
            }
        }
    }
    index
}
