/// A single-platform image manifest, identified by its `sha256:` digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Image {
    digest: String,
}

impl Image {
    pub fn new(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// A multi-arch index (manifest list) and its platform-specific children.
///
/// Children are always single images; an index never nests another index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexImage {
    digest: String,
    children: Vec<Image>,
}

impl IndexImage {
    pub fn new(digest: impl Into<String>, children: Vec<Image>) -> Self {
        Self {
            digest: digest.into(),
            children,
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn children(&self) -> &[Image] {
        &self.children
    }

    /// Returns true if `digest` belongs to one of the children.
    pub fn has_child(&self, digest: &str) -> bool {
        self.children.iter().any(|child| child.digest() == digest)
    }
}

/// The image a component releases: either a single image or an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseImage {
    Single(Image),
    Index(IndexImage),
}

impl ReleaseImage {
    pub fn digest(&self) -> &str {
        match self {
            ReleaseImage::Single(image) => image.digest(),
            ReleaseImage::Index(index) => index.digest(),
        }
    }

    pub fn as_index(&self) -> Option<&IndexImage> {
        match self {
            ReleaseImage::Index(index) => Some(index),
            ReleaseImage::Single(_) => None,
        }
    }

    /// Every image that carries its own SBOM: the image itself, followed by
    /// the children of an index in manifest order.
    pub fn sbom_targets(&self) -> Vec<ReleaseImage> {
        match self {
            ReleaseImage::Single(_) => vec![self.clone()],
            ReleaseImage::Index(index) => std::iter::once(self.clone())
                .chain(index.children().iter().cloned().map(ReleaseImage::Single))
                .collect(),
        }
    }
}

impl From<Image> for ReleaseImage {
    fn from(image: Image) -> Self {
        ReleaseImage::Single(image)
    }
}

impl From<IndexImage> for ReleaseImage {
    fn from(index: IndexImage) -> Self {
        ReleaseImage::Index(index)
    }
}
