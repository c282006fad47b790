//! OS clipboard access. Failures are logged and reported as `false`/`None`
//! so callers can fall back to their own register.

use arboard::Clipboard;
use tracing::{debug, warn};

pub fn copy(text: &str) -> bool {
    match Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_text(text) {
            Ok(_) => {
                debug!(chars = text.len(), "copied to clipboard");
                true
            }
            Err(e) => {
                warn!("Failed to copy to clipboard: {}", e);
                false
            }
        },
        Err(e) => {
            warn!("Failed to initialize clipboard: {}", e);
            false
        }
    }
}

pub fn paste() -> Option<String> {
    match Clipboard::new() {
        Ok(mut clipboard) => match clipboard.get_text() {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("Clipboard has no text: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to initialize clipboard: {}", e);
            None
        }
    }
}
