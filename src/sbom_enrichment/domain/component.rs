use super::image::ReleaseImage;
use super::reference::make_reference;

/// A component of a release: one image published to one destination
/// repository under a list of tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    name: String,
    repository: String,
    build_repository: String,
    image: ReleaseImage,
    tags: Vec<String>,
}

impl Component {
    /// # Arguments
    /// * `repository` - Destination repository the image is published to
    /// * `build_repository` - Repository holding the build-time image, its SBOMs and attestations
    /// * `tags` - Release tags, in release order
    pub fn new(
        name: impl Into<String>,
        repository: impl Into<String>,
        build_repository: impl Into<String>,
        image: ReleaseImage,
        tags: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repository: repository.into(),
            build_repository: build_repository.into(),
            image,
            tags,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn build_repository(&self) -> &str {
        &self.build_repository
    }

    pub fn image(&self) -> &ReleaseImage {
        &self.image
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Tag qualifiers to emit, one purl per entry. An untagged component
    /// still gets exactly one purl, without a tag.
    pub fn purl_tags(&self) -> Vec<Option<&str>> {
        if self.tags.is_empty() {
            return vec![None];
        }
        self.tags.iter().map(|tag| Some(tag.as_str())).collect()
    }

    /// The first release tag, if any.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// Reference to `digest` in the build repository.
    pub fn build_reference(&self, digest: &str) -> String {
        make_reference(&self.build_repository, digest)
    }
}

/// All components of a release, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    components: Vec<Component>,
}

impl Snapshot {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_enrichment::domain::Image;

    fn component(tags: &[&str]) -> Component {
        Component::new(
            "comp",
            "registry.example.io/org/comp",
            "quay.io/build/comp",
            ReleaseImage::from(Image::new("sha256:aaaa")),
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn test_purl_tags_in_release_order() {
        let comp = component(&["1.0", "latest"]);
        assert_eq!(comp.purl_tags(), vec![Some("1.0"), Some("latest")]);
        assert_eq!(comp.primary_tag(), Some("1.0"));
    }

    #[test]
    fn test_purl_tags_untagged() {
        let comp = component(&[]);
        assert_eq!(comp.purl_tags(), vec![None]);
        assert_eq!(comp.primary_tag(), None);
    }

    #[test]
    fn test_build_reference() {
        let comp = component(&["1.0"]);
        assert_eq!(
            comp.build_reference("sha256:bbbb"),
            "quay.io/build/comp@sha256:bbbb"
        );
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let snapshot = Snapshot::new(vec![component(&["a"]), component(&["b"])]);
        assert_eq!(snapshot.components().len(), 2);
        assert_eq!(snapshot.components()[1].tags(), &["b".to_string()]);
        assert!(!snapshot.is_empty());
        assert!(Snapshot::default().is_empty());
    }
}
