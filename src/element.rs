use chromiumoxide::cdp::browser_protocol::dom::BackendNodeId;
use chromiumoxide::element::Element as CrElement;

use crate::error::{Error, Result};

/// Wrapper around a chromiumoxide Element, providing a simplified API.
pub struct Element {
    inner: CrElement,
}

impl Element {
    pub(crate) fn new(inner: CrElement) -> Self {
        Self { inner }
    }

    /// DOM node id used by CDP commands such as `DOM.setFileInputFiles`.
    pub fn backend_node_id(&self) -> BackendNodeId {
        self.inner.backend_node_id.clone()
    }

    /// Click this element (scrolls into view first).
    pub async fn click(&self) -> Result<()> {
        self.inner.click().await.map_err(Error::from_cdp)?;
        Ok(())
    }

    /// Press a key on this element (e.g. "Enter", "Escape").
    pub async fn press_key(&self, key: &str) -> Result<()> {
        self.inner.press_key(key).await.map_err(Error::from_cdp)?;
        Ok(())
    }
}
