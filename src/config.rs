//! Cloud account settings.
//!
//! Native builds read `CLOUD_NAME` and `CLOUD_UPLOAD_PRESET` from the
//! environment at startup and fall back to whatever was set when the binary
//! was built. Web builds only have the build-time values. Unset means empty;
//! the service rejects the upload in that case, nothing is checked here.

pub const CLOUD_NAME_VAR: &str = "CLOUD_NAME";
pub const UPLOAD_PRESET_VAR: &str = "CLOUD_UPLOAD_PRESET";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloudConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

impl CloudConfig {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
        }
    }

    /// Settings for the running platform.
    pub fn from_env() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        #[cfg(target_arch = "wasm32")]
        let config = Self::from_lookup(|_| None);

        if config.cloud_name.is_empty() || config.upload_preset.is_empty() {
            log::warn!(
                "{CLOUD_NAME_VAR} or {UPLOAD_PRESET_VAR} is not set; uploads will be rejected"
            );
        }
        config
    }

    /// Resolve each value through `lookup`, then the build-time value, then
    /// the empty string.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let resolve = |key: &str, built_in: Option<&'static str>| {
            lookup(key)
                .or_else(|| built_in.map(str::to_owned))
                .unwrap_or_default()
        };
        Self {
            cloud_name: resolve(CLOUD_NAME_VAR, option_env!("CLOUD_NAME")),
            upload_preset: resolve(UPLOAD_PRESET_VAR, option_env!("CLOUD_UPLOAD_PRESET")),
        }
    }
}
