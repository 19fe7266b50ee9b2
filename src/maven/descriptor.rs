//! The `.project` descriptor holding the project name, natures and the
//! Bonita version in its `comment` field.

use std::path::Path;

use super::xml::{Element, XmlDocument};
use crate::error::MigrationError;

pub const DESCRIPTOR_FILE_NAME: &str = ".project";

/// Nature marking a project as a Bonita project.
pub const BONITA_NATURE_ID: &str = "org.bonitasoft.studio.common.repository.bonitaNature";

#[derive(Debug, Clone)]
pub struct ProjectDescription {
    document: XmlDocument,
}

impl ProjectDescription {
    /// Load `<project_root>/.project`.
    ///
    /// A missing file is reported as [`MigrationError::NoDescriptor`]; any
    /// other read or parse failure as [`MigrationError::CantReadDescriptor`].
    pub fn load(project_root: &Path) -> Result<Self, MigrationError> {
        let path = project_root.join(DESCRIPTOR_FILE_NAME);
        if !path.is_file() {
            return Err(MigrationError::NoDescriptor(path.display().to_string()));
        }
        let document = XmlDocument::read(&path).map_err(|e| MigrationError::CantReadDescriptor {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        if document.root.name != "projectDescription" {
            return Err(MigrationError::CantReadDescriptor {
                path: path.display().to_string(),
                source: format!("unexpected root element <{}>", document.root.name).into(),
            });
        }
        Ok(Self { document })
    }

    /// A fresh descriptor, used by fixtures and project scaffolding.
    pub fn new(name: &str, version: &str) -> Self {
        let mut root = Element::new("projectDescription");
        root.push(Element::with_text("name", name));
        root.push(Element::with_text("comment", version));
        root.push(Element::new("projects"));
        root.push(Element::new("buildSpec"));
        let mut natures = Element::new("natures");
        natures.push(Element::with_text("nature", BONITA_NATURE_ID));
        root.push(natures);
        Self {
            document: XmlDocument { root },
        }
    }

    pub fn save(&self, project_root: &Path) -> Result<(), MigrationError> {
        self.document.write(&project_root.join(DESCRIPTOR_FILE_NAME))
    }

    pub fn name(&self) -> Option<&str> {
        self.document.root.child_text("name")
    }

    /// The raw comment, trimmed; `None` when absent or blank.
    pub fn comment(&self) -> Option<&str> {
        self.document
            .root
            .child_text("comment")
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.document.root.set_child_text("comment", comment);
    }

    pub fn natures(&self) -> Vec<&str> {
        self.document
            .root
            .child("natures")
            .map(|n| n.children_named("nature").filter_map(Element::text).collect())
            .unwrap_or_default()
    }

    pub fn has_nature(&self, nature: &str) -> bool {
        self.natures().contains(&nature)
    }
}
