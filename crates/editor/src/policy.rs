//! Per-kind delete eligibility.
//!
//! Each media kind decides on its own whether the selected node may be
//! deleted and which backend asset id it refers to. Images must come from
//! the configured storage origin; videos only need an id.

use std::fmt;

use crate::markup::FALLBACK_ID_ATTR;
use crate::surface::SelectedNode;

/// Attribute holding the engine's original image source.
pub const STORED_SOURCE_ATTR: &str = "data-mce-src";

/// Why a delete request was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NothingSelected,
    NotAnImage,
    NoStorageOrigin,
    ForeignOrigin,
    MissingAssetId,
    NoVideoWrapper,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IgnoreReason::NothingSelected => "nothing selected",
            IgnoreReason::NotAnImage => "selection is not an image",
            IgnoreReason::NoStorageOrigin => "no storage origin configured",
            IgnoreReason::ForeignOrigin => "asset is hosted elsewhere",
            IgnoreReason::MissingAssetId => "selection carries no asset id",
            IgnoreReason::NoVideoWrapper => "selection is not inside a video container",
        })
    }
}

/// Resolves a selected node to the backend asset it references.
pub trait DeletePolicy: Send + Sync {
    fn resolve(&self, node: &SelectedNode) -> Result<String, IgnoreReason>;
}

/// Image policy: `img` nodes whose stored source contains the storage origin.
#[derive(Debug, Clone, Default)]
pub struct ImageOriginPolicy {
    origin: Option<String>,
}

impl ImageOriginPolicy {
    pub fn new(origin: Option<String>) -> Self {
        Self {
            origin: origin.filter(|o| !o.is_empty()),
        }
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

impl DeletePolicy for ImageOriginPolicy {
    fn resolve(&self, node: &SelectedNode) -> Result<String, IgnoreReason> {
        if !node.tag.eq_ignore_ascii_case("img") {
            return Err(IgnoreReason::NotAnImage);
        }
        let origin = self.origin.as_deref().ok_or(IgnoreReason::NoStorageOrigin)?;
        let source = node
            .attr(STORED_SOURCE_ATTR)
            .or_else(|| node.attr("src"))
            .filter(|s| !s.is_empty())
            .ok_or(IgnoreReason::MissingAssetId)?;
        if !source.contains(origin) {
            return Err(IgnoreReason::ForeignOrigin);
        }
        source
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .ok_or(IgnoreReason::MissingAssetId)
    }
}

/// Video policy: any node with an id or fallback id attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoIdPolicy;

impl DeletePolicy for VideoIdPolicy {
    fn resolve(&self, node: &SelectedNode) -> Result<String, IgnoreReason> {
        node.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| node.attr(FALLBACK_ID_ATTR).filter(|id| !id.is_empty()))
            .map(str::to_string)
            .ok_or(IgnoreReason::MissingAssetId)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::surface::NodeHandle;

    fn node(tag: &str, attrs: &[(&str, &str)]) -> SelectedNode {
        let attributes: Vec<(String, String)> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SelectedNode::new(NodeHandle::new(1), tag, attributes)
    }

    #[test]
    fn image_from_storage_origin_is_eligible() {
        let policy = ImageOriginPolicy::new(Some("cdn.example.com".to_string()));
        let img = node("img", &[("data-mce-src", "https://cdn.example.com/abc123.png")]);
        assert_eq!(policy.resolve(&img), Ok("abc123.png".to_string()));
    }

    #[test]
    fn image_from_elsewhere_is_ignored() {
        let policy = ImageOriginPolicy::new(Some("cdn.example.com".to_string()));
        let img = node("img", &[("src", "https://other.com/x.png")]);
        assert_eq!(policy.resolve(&img), Err(IgnoreReason::ForeignOrigin));
    }

    #[test]
    fn image_policy_requires_origin_and_tag() {
        let unset = ImageOriginPolicy::new(None);
        let empty = ImageOriginPolicy::new(Some(String::new()));
        let img = node("img", &[("src", "https://cdn.example.com/a.png")]);
        assert_eq!(unset.resolve(&img), Err(IgnoreReason::NoStorageOrigin));
        assert_eq!(empty.resolve(&img), Err(IgnoreReason::NoStorageOrigin));

        let policy = ImageOriginPolicy::new(Some("cdn.example.com".to_string()));
        let para = node("p", &[]);
        assert_eq!(policy.resolve(&para), Err(IgnoreReason::NotAnImage));
        let trailing = node("img", &[("src", "https://cdn.example.com/")]);
        assert_eq!(policy.resolve(&trailing), Err(IgnoreReason::MissingAssetId));
    }

    #[test]
    fn stored_source_wins_over_src() {
        let policy = ImageOriginPolicy::new(Some("cdn.example.com".to_string()));
        let img = node(
            "IMG",
            &[
                ("src", "blob:local-preview"),
                ("data-mce-src", "https://cdn.example.com/files/doc/images/k9.png"),
            ],
        );
        assert_eq!(policy.resolve(&img), Ok("k9.png".to_string()));
    }

    #[test]
    fn video_id_falls_back_to_data_attribute() {
        let policy = VideoIdPolicy;
        assert_eq!(policy.resolve(&node("video", &[("id", "v1")])), Ok("v1".to_string()));
        assert_eq!(
            policy.resolve(&node("video", &[("id", ""), ("data-mce-p-id", "v2")])),
            Ok("v2".to_string())
        );
        assert_eq!(
            policy.resolve(&node("video", &[])),
            Err(IgnoreReason::MissingAssetId)
        );
    }
}
