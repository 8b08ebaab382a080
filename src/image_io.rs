use image::{DynamicImage, ImageFormat};
use std::time::Duration;
use web_time::Instant;

/// Name the processed image is saved under.
pub const DOWNLOAD_FILE_NAME: &str = "bg-removed-image.png";

/// How long a download's object URL stays alive after the click.
pub const REVOKE_DELAY: Duration = Duration::from_secs(1);

/// File extensions of every format this build can decode.
pub fn image_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = ImageFormat::all()
        .filter(|format| format.reading_enabled())
        .flat_map(|format| format.extensions_str().iter().copied())
        .collect();
    extensions.sort_unstable();
    extensions.dedup();
    extensions
}

pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, String> {
    image::load_from_memory(bytes).map_err(|e| format!("Failed to decode image: {e}"))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn read_selected(path: &std::path::Path) -> Result<crate::cloud::SelectedFile, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    Ok(crate::cloud::SelectedFile { name, bytes })
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_bytes(bytes: &[u8], path: &std::path::Path) -> Result<(), String> {
    std::fs::write(path, bytes).map_err(|e| format!("Failed to save image: {e}"))
}

/// Object URLs handed to the browser, released once the download has had
/// time to start. Revoking in the same tick as the click can cancel it.
#[derive(Debug, Default)]
pub struct DeferredRevokes {
    pending: Vec<(String, Instant)>,
}

impl DeferredRevokes {
    pub fn push(&mut self, url: String, now: Instant) {
        self.pending.push((url, now + REVOKE_DELAY));
    }

    /// URLs whose delay has passed at `now`; they are forgotten here.
    pub fn due(&mut self, now: Instant) -> Vec<String> {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(_, deadline)| *deadline <= now);
        self.pending = waiting;
        due.into_iter().map(|(url, _)| url).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Hand `bytes` to the browser as a file download named `file_name`.
/// Returns the object URL, which the caller revokes later.
#[cfg(target_arch = "wasm32")]
pub fn download_bytes(bytes: &[u8], file_name: &str) -> Result<String, String> {
    use wasm_bindgen::JsCast;

    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type("image/png");
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|e| format!("Failed to create blob: {e:?}"))?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|e| format!("Failed to create object URL: {e:?}"))?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "No document available".to_owned())?;
    let anchor = document
        .create_element("a")
        .map_err(|e| format!("Failed to create link: {e:?}"))?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| "Created element is not a link".to_owned())?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();
    Ok(url)
}

#[cfg(target_arch = "wasm32")]
pub fn revoke_object_url(url: &str) -> Result<(), String> {
    web_sys::Url::revoke_object_url(url).map_err(|e| format!("Failed to revoke object URL: {e:?}"))
}
