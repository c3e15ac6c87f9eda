//! Brand records returned by `getAllBrand`.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder the API uses for an unset text field.
const PLACEHOLDER: &str = "-";

/// A brand as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(deserialize_with = "string_or_number")]
    pub brand_id: String,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub brand_logo: Option<String>,
    #[serde(default)]
    pub brand_cover_image: Option<String>,
    #[serde(default)]
    pub brand_introduction: Option<String>,
    #[serde(default)]
    pub brand_url: Option<String>,
    /// Instagram link.
    #[serde(default)]
    pub brand_ins: Option<String>,
}

impl Brand {
    pub fn name(&self) -> Option<&str> {
        present(&self.brand_name)
    }

    pub fn logo(&self) -> Option<&str> {
        present(&self.brand_logo)
    }

    pub fn cover_image(&self) -> Option<&str> {
        present(&self.brand_cover_image)
    }

    pub fn introduction(&self) -> Option<&str> {
        present(&self.brand_introduction)
    }

    pub fn website(&self) -> Option<&str> {
        present(&self.brand_url)
    }

    pub fn instagram(&self) -> Option<&str> {
        present(&self.brand_ins)
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != PLACEHOLDER)
}

/// Brand IDs arrive as either JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
