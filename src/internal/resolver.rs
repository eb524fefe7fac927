//! Turns a [`ReferenceSource`] into a decoded bitmap.
//!
//! Inline images short-circuit. URLs are reduced to a file/node pair, and node
//! references go through two sequential requests: the export endpoint, then the
//! returned image URL.

use std::sync::Arc;

use url::Url;

use crate::api::DesignService;
use crate::internal::models::{Bitmap, ReferenceSource};

/// Query parameter carrying the node id in a design share link.
pub const NODE_ID_PARAM: &str = "node-id";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("malformed reference: {0}")]
    MalformedReference(String),

    #[error("no image URL for node {node_id}{}", service_detail(.detail))]
    ImageUrlUnavailable {
        node_id: String,
        detail: Option<String>,
    },

    #[error("could not decode reference image: {0}")]
    ImageDecodeFailure(String),

    #[error("design service request failed: {0}")]
    Transport(String),
}

fn service_detail(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

/// File and node identifiers extracted from a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTarget {
    pub file_id: String,
    pub node_id: String,
}

/// Parse a share link into its file and node identifiers.
///
/// Components are counted with the root `/` as the first one, so the file id is
/// the third component: `/file/<file_id>/<name>` or `/design/<file_id>`.
pub fn parse_reference_url(raw: &str) -> Result<NodeTarget, ResolveError> {
    let url = Url::parse(raw)
        .map_err(|e| ResolveError::MalformedReference(format!("{raw}: {e}")))?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    // Root plus at least two segments
    if segments.len() + 1 < 3 {
        return Err(ResolveError::MalformedReference(format!(
            "{raw}: path has no file id segment"
        )));
    }
    let file_id = segments[1].to_string();

    let node_id = url
        .query_pairs()
        .find(|(name, _)| name == NODE_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ResolveError::MalformedReference(format!("{raw}: missing `{NODE_ID_PARAM}` parameter"))
        })?;

    Ok(NodeTarget { file_id, node_id })
}

/// Key under which the export endpoint reports a node's image URL.
pub fn lookup_key(node_id: &str) -> String {
    node_id.replace('-', ":")
}

/// Decode raw bytes into an RGBA bitmap, guessing the format from the content.
pub fn decode_bitmap(bytes: &[u8]) -> Result<Bitmap, ResolveError> {
    image::load_from_memory(bytes)
        .map(|img| Arc::new(img.to_rgba8()))
        .map_err(|e| ResolveError::ImageDecodeFailure(e.to_string()))
}

/// Resolves reference sources against a design service.
#[derive(Clone)]
pub struct Resolver {
    service: DesignService,
}

impl Resolver {
    pub fn new(service: DesignService) -> Self {
        Self { service }
    }

    #[tracing::instrument(skip(self, source, credential), fields(source = %source))]
    pub async fn resolve(
        &self,
        source: &ReferenceSource,
        credential: &str,
    ) -> Result<Bitmap, ResolveError> {
        match source {
            ReferenceSource::InlineImage(bitmap) => Ok(bitmap.clone()),
            ReferenceSource::RemoteUrl(raw) => {
                let target = parse_reference_url(raw)?;
                self.resolve_node(&target.file_id, &target.node_id, credential)
                    .await
            }
            ReferenceSource::NodeReference { file_id, node_id } => {
                self.resolve_node(file_id, node_id, credential).await
            }
        }
    }

    async fn resolve_node(
        &self,
        file_id: &str,
        node_id: &str,
        credential: &str,
    ) -> Result<Bitmap, ResolveError> {
        let response = self
            .service
            .fetch_image_urls(file_id, node_id, credential)
            .await
            .map_err(|e| ResolveError::Transport(format!("{e:#}")))?;

        let key = lookup_key(node_id);
        let image_url = match response.images.get(&key) {
            Some(Some(url)) => url.clone(),
            _ => {
                return Err(ResolveError::ImageUrlUnavailable {
                    node_id: key,
                    detail: response.err,
                });
            }
        };
        tracing::debug!(key, image_url, "Resolved export URL");

        let bytes = self
            .service
            .fetch_image_bytes(&image_url)
            .await
            .map_err(|e| ResolveError::Transport(format!("{e:#}")))?;

        let bitmap = decode_bitmap(&bytes)?;
        tracing::info!(
            width = bitmap.width(),
            height = bitmap.height(),
            "Decoded reference image"
        );
        Ok(bitmap)
    }
}
