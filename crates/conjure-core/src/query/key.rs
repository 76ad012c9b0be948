use std::fmt;

use crate::model::EntityId;

/// The backend collections queries are built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    Effects,
    Triggers,
}

/// Identifies one cached query: a whole collection, or one item in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: Resource,
    id: Option<EntityId>,
}

impl QueryKey {
    pub fn list(resource: Resource) -> Self {
        Self { resource, id: None }
    }

    pub fn item(resource: Resource, id: EntityId) -> Self {
        Self {
            resource,
            id: Some(id),
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{id}", self.resource),
            None => write!(f, "{}", self.resource),
        }
    }
}
