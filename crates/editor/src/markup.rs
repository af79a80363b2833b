//! Generated markup for uploaded media.

use crate::dom::{Element, FragmentNode};
use crate::gateway::UploadedAsset;

/// Class marking the removable container around an uploaded video.
pub const VIDEO_WRAPPER_CLASS: &str = "video-wrapper";

/// Data attribute some engines use to carry a node's original id.
pub const FALLBACK_ID_ATTR: &str = "data-mce-p-id";

/// Attribute carrying the asset id on the video container.
pub const CONTAINER_ID_ATTR: &str = "data-container-id";

/// Build the container fragment inserted after a successful video upload.
///
/// The asset id is set as the DOM id of both the wrapper and the video so
/// the delete handler can resolve it from either node.
pub fn video_container(asset: &UploadedAsset) -> FragmentNode {
    let wrapper = Element::new("div")
        .with_attr("class", format!("help-center-video-content {VIDEO_WRAPPER_CLASS}"))
        .with_attr("style", "text-align:center")
        .with_attr("id", asset.id.as_str())
        .with_attr(CONTAINER_ID_ATTR, asset.id.as_str());

    let video = Element::new("video")
        .with_attr("class", "help-center-video")
        .with_attr("width", "90%")
        .with_attr("height", "240")
        .with_attr("controls", "")
        .with_attr("src", asset.url.as_str())
        .with_attr("id", asset.id.as_str())
        .with_attr("data-filename", asset.file_name.as_str());

    FragmentNode::element(wrapper).with_child(FragmentNode::element(video))
}
