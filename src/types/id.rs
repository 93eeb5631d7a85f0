// ABOUTME: Phantom-typed identifiers for the launcher's three resource kinds.
// ABOUTME: A pipeline id can never be passed where a container id belongs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Uninhabited marker types; they exist only as type parameters.
pub enum PipelineMarker {}
pub enum ContainerMarker {}
pub enum NetworkMarker {}

/// An opaque identifier branded with the kind of resource it names.
///
/// The `PipelineId` is issued by the control plane at registration and keys
/// everything created afterwards: the manager container name, the pipeline
/// network name, and the local state directory. Container and network ids
/// come back from the runtime. Mixing them up is a type error.
#[must_use = "IDs reference resources and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

pub type PipelineId = Id<PipelineMarker>;
pub type ContainerId = Id<ContainerMarker>;
pub type NetworkId = Id<NetworkMarker>;

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// The marker is never instantiated, so every impl below is written by hand
// rather than derived; derives would demand bounds on `T`.

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
