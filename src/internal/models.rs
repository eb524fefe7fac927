use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use serde::Deserialize;

/// Decoded reference bitmap. Shared because it crosses from the resolution task
/// into the UI loop and is read on every frame.
pub type Bitmap = Arc<RgbaImage>;

/// Where the reference image comes from. Chosen once when the overlay is attached.
#[derive(Clone)]
pub enum ReferenceSource {
    /// A design-tool share link such as `https://www.figma.com/file/<id>/<name>?node-id=1-2`.
    RemoteUrl(String),
    /// An already decoded image, no I/O needed.
    InlineImage(Bitmap),
    /// Explicit file and node identifiers.
    NodeReference { file_id: String, node_id: String },
}

impl ReferenceSource {
    pub fn node(file_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self::NodeReference {
            file_id: file_id.into(),
            node_id: node_id.into(),
        }
    }

    pub fn inline(image: RgbaImage) -> Self {
        Self::InlineImage(Arc::new(image))
    }
}

// Bitmaps are large; keep debug output to dimensions.
impl fmt::Debug for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteUrl(url) => f.debug_tuple("RemoteUrl").field(url).finish(),
            Self::InlineImage(img) => write!(f, "InlineImage({}x{})", img.width(), img.height()),
            Self::NodeReference { file_id, node_id } => f
                .debug_struct("NodeReference")
                .field("file_id", file_id)
                .field("node_id", node_id)
                .finish(),
        }
    }
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteUrl(url) => write!(f, "{url}"),
            Self::InlineImage(img) => write!(f, "inline image {}x{}", img.width(), img.height()),
            Self::NodeReference { file_id, node_id } => write!(f, "{file_id} / {node_id}"),
        }
    }
}

/// Body of the design service's image-export endpoint.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ImagesResponse {
    #[serde(default)]
    pub err: Option<String>,
    /// Export URLs keyed by node id in colon form. A node that failed to render maps to `null`.
    #[serde(default)]
    pub images: HashMap<String, Option<String>>,
}
