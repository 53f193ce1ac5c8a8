use serde::{Deserialize, Serialize};

use partsum_core::{DomainError, DomainResult, Entity, LocationId};

/// Separator used when rendering a location's ancestry as a path string.
pub const PATH_SEPARATOR: &str = "/";

/// A storage location, optionally nested under a parent location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLocation {
    id: LocationId,
    name: String,
    parent_id: Option<LocationId>,
    /// Cached path string as stored upstream (may be empty).
    pathstring: String,
}

impl StockLocation {
    pub fn new(id: LocationId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            parent_id: None,
            pathstring: String::new(),
        })
    }

    pub fn with_parent(mut self, parent_id: LocationId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_pathstring(mut self, pathstring: impl Into<String>) -> Self {
        self.pathstring = pathstring.into();
        self
    }

    pub fn id_typed(&self) -> LocationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<LocationId> {
        self.parent_id
    }

    /// Stored path string, if one was recorded.
    pub fn pathstring(&self) -> Option<&str> {
        let path = self.pathstring.trim();
        (!path.is_empty()).then_some(path)
    }

    /// Stored path string, falling back to the name when none was recorded.
    pub fn display_path(&self) -> &str {
        self.pathstring().unwrap_or(&self.name)
    }
}

impl Entity for StockLocation {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
