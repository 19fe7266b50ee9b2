//! Read and edit Maven `pom.xml` models.

use std::fmt;
use std::path::Path;

use super::xml::{Element, XmlDocument};
use crate::error::MigrationError;

pub const POM_FILE_NAME: &str = "pom.xml";

const EMPTY_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd">
    <modelVersion>4.0.0</modelVersion>
</project>
"#;

/// Maven coordinates of a dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub kind: Option<String>,
}

impl Dependency {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: None,
            scope: None,
            kind: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Maven `<type>`.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn matches(&self, group_id: &str, artifact_id: &str) -> bool {
        self.group_id == group_id && self.artifact_id == artifact_id
    }

    fn from_element(element: &Element) -> Self {
        Self {
            group_id: element.child_text("groupId").unwrap_or_default().to_string(),
            artifact_id: element
                .child_text("artifactId")
                .unwrap_or_default()
                .to_string(),
            version: element.child_text("version").map(str::to_string),
            scope: element.child_text("scope").map(str::to_string),
            kind: element.child_text("type").map(str::to_string),
        }
    }

    fn to_element(&self) -> Element {
        let mut element = Element::new("dependency");
        element.push(Element::with_text("groupId", &self.group_id));
        element.push(Element::with_text("artifactId", &self.artifact_id));
        if let Some(version) = &self.version {
            element.push(Element::with_text("version", version));
        }
        if let Some(kind) = &self.kind {
            element.push(Element::with_text("type", kind));
        }
        if let Some(scope) = &self.scope {
            element.push(Element::with_text("scope", scope));
        }
        element
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

/// The `<parent>` section of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// A Maven project model backed by its XML tree.
#[derive(Debug, Clone)]
pub struct PomModel {
    document: XmlDocument,
}

impl PomModel {
    /// A model with only `modelVersion` set.
    pub fn empty() -> Result<Self, MigrationError> {
        Self::parse(EMPTY_POM, "new pom.xml")
    }

    pub fn parse(input: &str, origin: &str) -> Result<Self, MigrationError> {
        Self::from_document(XmlDocument::parse(input, origin)?, origin)
    }

    pub fn load(path: &Path) -> Result<Self, MigrationError> {
        Self::from_document(XmlDocument::read(path)?, &path.display().to_string())
    }

    fn from_document(document: XmlDocument, origin: &str) -> Result<Self, MigrationError> {
        if document.root.name != "project" {
            return Err(MigrationError::Xml {
                path: origin.to_string(),
                message: format!("expected <project>, found <{}>", document.root.name),
            });
        }
        Ok(Self { document })
    }

    pub fn save(&self, path: &Path) -> Result<(), MigrationError> {
        self.document.write(path)
    }

    pub fn to_xml_string(&self) -> Result<String, MigrationError> {
        self.document.to_xml_string()
    }

    fn root(&self) -> &Element {
        &self.document.root
    }

    fn root_mut(&mut self) -> &mut Element {
        &mut self.document.root
    }

    // =========================================================================
    // Coordinates
    // =========================================================================

    /// Own group id, inherited from the parent when not declared.
    pub fn group_id(&self) -> Option<String> {
        self.root()
            .child_text("groupId")
            .map(str::to_string)
            .or_else(|| self.parent().map(|p| p.group_id))
    }

    pub fn artifact_id(&self) -> Option<&str> {
        self.root().child_text("artifactId")
    }

    /// Own version, inherited from the parent when not declared.
    pub fn version(&self) -> Option<String> {
        self.root()
            .child_text("version")
            .map(str::to_string)
            .or_else(|| self.parent().map(|p| p.version))
    }

    pub fn set_coordinates(&mut self, group_id: &str, artifact_id: &str, version: &str) {
        let root = self.root_mut();
        root.set_child_text("groupId", group_id);
        root.set_child_text("artifactId", artifact_id);
        root.set_child_text("version", version);
    }

    pub fn set_artifact_id(&mut self, artifact_id: &str) {
        self.root_mut().set_child_text("artifactId", artifact_id);
    }

    pub fn set_packaging(&mut self, packaging: &str) {
        self.root_mut().set_child_text("packaging", packaging);
    }

    pub fn set_name(&mut self, name: &str) {
        self.root_mut().set_child_text("name", name);
    }

    pub fn parent(&self) -> Option<Parent> {
        let parent = self.root().child("parent")?;
        Some(Parent {
            group_id: parent.child_text("groupId")?.to_string(),
            artifact_id: parent.child_text("artifactId")?.to_string(),
            version: parent.child_text("version").unwrap_or_default().to_string(),
        })
    }

    pub fn set_parent(&mut self, parent: &Parent) {
        let element = self.root_mut().ensure_child("parent");
        element.set_child_text("groupId", &parent.group_id);
        element.set_child_text("artifactId", &parent.artifact_id);
        element.set_child_text("version", &parent.version);
    }

    /// Update the parent version; false when the model has no parent.
    pub fn set_parent_version(&mut self, version: &str) -> bool {
        match self.root_mut().child_mut("parent") {
            Some(parent) => {
                parent.set_child_text("version", version);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Dependencies
    // =========================================================================

    pub fn dependencies(&self) -> Vec<Dependency> {
        self.root()
            .child("dependencies")
            .map(|deps| {
                deps.children_named("dependency")
                    .map(Dependency::from_element)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn find_dependency(&self, group_id: &str, artifact_id: &str) -> Option<Dependency> {
        self.dependencies()
            .into_iter()
            .find(|d| d.matches(group_id, artifact_id))
    }

    pub fn has_dependency(&self, group_id: &str, artifact_id: &str) -> bool {
        self.find_dependency(group_id, artifact_id).is_some()
    }

    pub fn add_dependency(&mut self, dependency: &Dependency) {
        self.root_mut()
            .ensure_child("dependencies")
            .push(dependency.to_element());
    }

    /// Remove a dependency; returns whether one was found.
    pub fn remove_dependency(&mut self, group_id: &str, artifact_id: &str) -> bool {
        match self.root_mut().child_mut("dependencies") {
            Some(deps) => {
                deps.remove_elements(|e| {
                    e.name == "dependency" && Dependency::from_element(e).matches(group_id, artifact_id)
                }) > 0
            }
            None => false,
        }
    }

    /// Rewrite the coordinates of a dependency in place, keeping its position
    /// and any extra children (exclusions, classifier).
    pub fn replace_dependency(
        &mut self,
        group_id: &str,
        artifact_id: &str,
        replacement: &Dependency,
    ) -> bool {
        let Some(deps) = self.root_mut().child_mut("dependencies") else {
            return false;
        };
        let mut replaced = false;
        for element in deps.children_named_mut("dependency") {
            if Dependency::from_element(element).matches(group_id, artifact_id) {
                element.set_child_text("groupId", &replacement.group_id);
                element.set_child_text("artifactId", &replacement.artifact_id);
                match &replacement.version {
                    Some(version) => element.set_child_text("version", version),
                    None => {
                        element.remove_elements(|e| e.name == "version");
                    }
                }
                replaced = true;
            }
        }
        replaced
    }

    /// Set the version of a dependency; false when not declared.
    pub fn set_dependency_version(
        &mut self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> bool {
        let Some(deps) = self.root_mut().child_mut("dependencies") else {
            return false;
        };
        let mut updated = false;
        for element in deps.children_named_mut("dependency") {
            if Dependency::from_element(element).matches(group_id, artifact_id) {
                element.set_child_text("version", version);
                updated = true;
            }
        }
        updated
    }

    // =========================================================================
    // Modules, properties, profiles, plugins
    // =========================================================================

    pub fn modules(&self) -> Vec<String> {
        self.root()
            .child("modules")
            .map(|modules| {
                modules
                    .children_named("module")
                    .filter_map(Element::text)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Add a module unless already declared; returns whether it was added.
    pub fn add_module(&mut self, module: &str) -> bool {
        if self.modules().iter().any(|m| m == module) {
            return false;
        }
        self.root_mut()
            .ensure_child("modules")
            .push(Element::with_text("module", module));
        true
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.root().path(&["properties", key]).and_then(Element::text)
    }

    pub fn set_property(&mut self, key: &str, value: &str) {
        self.root_mut()
            .ensure_child("properties")
            .set_child_text(key, value);
    }

    pub fn profile(&self, id: &str) -> Option<&Element> {
        self.root()
            .child("profiles")?
            .children_named("profile")
            .find(|p| p.child_text("id") == Some(id))
    }

    pub fn profile_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.root_mut()
            .child_mut("profiles")?
            .children_named_mut("profile")
            .find(|p| p.child_text("id") == Some(id))
    }

    pub fn has_plugin(&self, artifact_id: &str) -> bool {
        self.root()
            .path(&["build", "plugins"])
            .map(|plugins| {
                plugins
                    .children_named("plugin")
                    .any(|p| p.child_text("artifactId") == Some(artifact_id))
            })
            .unwrap_or(false)
    }

    /// Remove a build plugin by artifact id; returns whether one was found.
    pub fn remove_plugin(&mut self, artifact_id: &str) -> bool {
        match self.root_mut().path_mut(&["build", "plugins"]) {
            Some(plugins) => {
                plugins.remove_elements(|p| {
                    p.name == "plugin" && p.child_text("artifactId") == Some(artifact_id)
                }) > 0
            }
            None => false,
        }
    }
}
