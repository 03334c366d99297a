use serde::{Deserialize, Serialize};

/// Body posted by the image form
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    /// Text description of the desired image
    #[serde(default)]
    pub prompt: Option<String>,
    /// Image to edit or draw inspiration from, as a data URL or web URL
    #[serde(default)]
    pub reference_image: Option<String>,
}

/// Validated request handed to a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub reference_image: Option<String>,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

/// Raw provider output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageGeneration {
    /// Image locations in the order returned, data URLs or web URLs
    pub images: Vec<String>,
    /// Text the model produced alongside the images
    pub text: String,
    pub usage: ImageUsage,
}

/// Response returned to the browser
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    /// First generated image
    pub image_url: String,
    pub text: String,
    pub usage: ImageUsage,
}

/// Whether a provider-returned location can be shown in an `<img>` tag
pub(crate) fn is_displayable_image(location: &str) -> bool {
    if let Some(rest) = location.strip_prefix("data:") {
        return rest.starts_with("image/") && rest.contains(";base64,");
    }

    url::Url::parse(location).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
