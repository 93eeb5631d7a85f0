// ABOUTME: Owned pipeline node tree and the image descriptor side-table.
// ABOUTME: Nodes reference images by index so deduplication is a set check.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stable index of an image descriptor within an [`ImageStore`].
///
/// Two nodes sharing one image share the index, so "translate each image
/// once" is an explicit set-membership check rather than an object-identity
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageIdx(usize);

/// How a node's image is built: context directory, Dockerfile path, and the
/// directory copied into the build. All three are host paths in whatever
/// convention the defining process used; the path translator rewrites them
/// before launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(default)]
    pub copy_dir: Option<String>,

    #[serde(default)]
    pub context: Option<String>,

    #[serde(default)]
    pub dockerfile: Option<String>,
}

/// Side-table owning every image descriptor in a program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageStore {
    images: Vec<ImageSource>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image: ImageSource) -> ImageIdx {
        self.images.push(image);
        ImageIdx(self.images.len() - 1)
    }

    pub fn get(&self, idx: ImageIdx) -> Option<&ImageSource> {
        self.images.get(idx.0)
    }

    pub fn get_mut(&mut self, idx: ImageIdx) -> Option<&mut ImageSource> {
        self.images.get_mut(idx.0)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// One node in the pipeline tree. Children are owned; the root has name `/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub image: Option<ImageIdx>,

    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    pub fn root() -> Self {
        Self::named("/")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            tags: Vec::new(),
            image: None,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.name == "/"
    }

    /// Depth-first traversal over this node and all descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Node> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter());
            Some(node)
        })
    }

    /// The distinct image indexes reachable from this node, in first-seen
    /// order. A shared image appears exactly once.
    pub fn unique_images(&self) -> Vec<ImageIdx> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for node in self.walk() {
            if let Some(idx) = node.image
                && seen.insert(idx)
            {
                order.push(idx);
            }
        }
        order
    }
}

/// The full program handed to the manager: the node tree plus its images.
/// The serialized form is opaque to the rest of this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub root: Node,
    pub images: ImageStore,
}

impl Program {
    pub fn new(root: Node, images: ImageStore) -> Self {
        Self { root, images }
    }

    pub fn serialize(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
