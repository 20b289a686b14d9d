// SPDX-License-Identifier: MPL-2.0
//! Generation option types and pricing.

use std::fmt;
use std::str::FromStr;

// =============================================================================
// AspectRatio
// =============================================================================

/// Output aspect ratio accepted by the generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AspectRatio {
    Square,
    Portrait3x4,
    Landscape4x3,
    Portrait9x16,
    Landscape16x9,
}

impl AspectRatio {
    #[must_use]
    pub fn all() -> &'static [AspectRatio] {
        &[
            AspectRatio::Square,
            AspectRatio::Portrait3x4,
            AspectRatio::Landscape4x3,
            AspectRatio::Portrait9x16,
            AspectRatio::Landscape16x9,
        ]
    }

    /// Wire representation, e.g. `"16:9"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::all()
            .iter()
            .copied()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

// =============================================================================
// ResolutionTier
// =============================================================================

/// Output resolution tier. Only "pro" models honor it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionTier {
    OneK,
    TwoK,
    FourK,
}

impl ResolutionTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionTier::OneK => "1K",
            ResolutionTier::TwoK => "2K",
            ResolutionTier::FourK => "4K",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionTier {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(ResolutionTier::OneK),
            "2K" => Ok(ResolutionTier::TwoK),
            "4K" => Ok(ResolutionTier::FourK),
            _ => Err(UnknownOption(s.to_string())),
        }
    }
}

// =============================================================================
// GenerationModel
// =============================================================================

/// Which remote service hosts a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Fal,
    Gemini,
}

/// Image generation models known to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationModel {
    NanoBanana,
    NanoBananaPro,
    GptImage15,
    GeminiFlashImage,
    GeminiProImage,
}

impl GenerationModel {
    #[must_use]
    pub fn all() -> &'static [GenerationModel] {
        &[
            GenerationModel::NanoBanana,
            GenerationModel::NanoBananaPro,
            GenerationModel::GptImage15,
            GenerationModel::GeminiFlashImage,
            GenerationModel::GeminiProImage,
        ]
    }

    /// Provider-side model identifier.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            GenerationModel::NanoBanana => "fal-ai/nano-banana",
            GenerationModel::NanoBananaPro => "fal-ai/nano-banana-pro",
            GenerationModel::GptImage15 => "fal-ai/gpt-image-1.5",
            GenerationModel::GeminiFlashImage => "gemini-2.5-flash-image",
            GenerationModel::GeminiProImage => "gemini-3-pro-image-preview",
        }
    }

    #[must_use]
    pub fn provider(self) -> Provider {
        match self {
            GenerationModel::NanoBanana
            | GenerationModel::NanoBananaPro
            | GenerationModel::GptImage15 => Provider::Fal,
            GenerationModel::GeminiFlashImage | GenerationModel::GeminiProImage => {
                Provider::Gemini
            }
        }
    }

    /// Whether the model accepts a [`ResolutionTier`].
    #[must_use]
    pub fn supports_resolution(self) -> bool {
        matches!(
            self,
            GenerationModel::NanoBananaPro | GenerationModel::GeminiProImage
        )
    }

    /// Identifier used for pricing and history, with the `/edit` suffix when
    /// the call edits an existing image.
    #[must_use]
    pub fn billing_key(self, is_edit: bool) -> String {
        if is_edit && self.provider() == Provider::Fal {
            format!("{}/edit", self.id())
        } else {
            self.id().to_string()
        }
    }
}

impl fmt::Display for GenerationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GenerationModel {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GenerationModel::all()
            .iter()
            .copied()
            .find(|model| model.id() == s.trim())
            .ok_or_else(|| UnknownOption(s.to_string()))
    }
}

/// Error returned when parsing an unrecognized option string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption(pub String);

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown option: {}", self.0)
    }
}

impl std::error::Error for UnknownOption {}

// =============================================================================
// CostTable
// =============================================================================

/// Default per-call prices in USD.
pub mod cost_defaults {
    pub const NANO_BANANA: f64 = 0.0396;
    pub const NANO_BANANA_PRO: f64 = 0.134;
    pub const GPT_IMAGE_SQUARE: f64 = 0.133;
    pub const GPT_IMAGE_TALL_OR_WIDE: f64 = 0.200;
    /// Price assumed for models missing from the table.
    pub const FALLBACK: f64 = NANO_BANANA;
}

/// Per-model price lookup.
///
/// `gpt-image-1.5` is priced by output size; every other model has a flat
/// price per call.
#[derive(Debug, Clone, PartialEq)]
pub struct CostTable {
    entries: Vec<(String, f64)>,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            entries: vec![
                ("fal-ai/nano-banana".into(), cost_defaults::NANO_BANANA),
                ("fal-ai/nano-banana-pro".into(), cost_defaults::NANO_BANANA_PRO),
                ("fal-ai/nano-banana/edit".into(), cost_defaults::NANO_BANANA),
                ("fal-ai/nano-banana-pro/edit".into(), cost_defaults::NANO_BANANA_PRO),
            ],
        }
    }
}

impl CostTable {
    /// Overrides (or adds) the flat price for a billing key.
    pub fn set(&mut self, key: impl Into<String>, cost: f64) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = cost,
            None => self.entries.push((key, cost)),
        }
    }

    /// Price for a billing key such as `fal-ai/nano-banana/edit`.
    #[must_use]
    pub fn cost(&self, key: &str, width: Option<u32>, height: Option<u32>) -> f64 {
        if key == "fal-ai/gpt-image-1.5" || key == "fal-ai/gpt-image-1.5/edit" {
            return gpt_image_cost(width, height);
        }
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(cost_defaults::FALLBACK, |(_, cost)| *cost)
    }

    /// Price for a model call, resolving the `/edit` variant.
    #[must_use]
    pub fn cost_for(&self, model: GenerationModel, is_edit: bool, width: u32, height: u32) -> f64 {
        self.cost(&model.billing_key(is_edit), Some(width), Some(height))
    }
}

fn gpt_image_cost(width: Option<u32>, height: Option<u32>) -> f64 {
    match (width, height) {
        (Some(1024), Some(1536)) | (Some(1536), Some(1024)) => {
            cost_defaults::GPT_IMAGE_TALL_OR_WIDE
        }
        _ => cost_defaults::GPT_IMAGE_SQUARE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_round_trips_through_strings() {
        for ratio in AspectRatio::all() {
            assert_eq!(ratio.as_str().parse::<AspectRatio>(), Ok(*ratio));
        }
        assert!("2:1".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn resolution_parses_case_insensitively() {
        assert_eq!("2k".parse::<ResolutionTier>(), Ok(ResolutionTier::TwoK));
        assert!("8K".parse::<ResolutionTier>().is_err());
    }

    #[test]
    fn only_pro_models_support_resolution() {
        assert!(GenerationModel::NanoBananaPro.supports_resolution());
        assert!(GenerationModel::GeminiProImage.supports_resolution());
        assert!(!GenerationModel::NanoBanana.supports_resolution());
        assert!(!GenerationModel::GeminiFlashImage.supports_resolution());
    }

    #[test]
    fn billing_key_adds_edit_suffix_for_fal_only() {
        assert_eq!(
            GenerationModel::NanoBanana.billing_key(true),
            "fal-ai/nano-banana/edit"
        );
        assert_eq!(
            GenerationModel::GeminiFlashImage.billing_key(true),
            "gemini-2.5-flash-image"
        );
    }

    #[test]
    fn cost_table_flat_prices() {
        let table = CostTable::default();
        assert!((table.cost("fal-ai/nano-banana-pro/edit", None, None) - 0.134).abs() < 1e-9);
        assert!((table.cost("unknown-model", None, None) - 0.0396).abs() < 1e-9);
    }

    #[test]
    fn gpt_image_priced_by_dimensions() {
        let table = CostTable::default();
        let wide = table.cost_for(GenerationModel::GptImage15, false, 1536, 1024);
        let square = table.cost_for(GenerationModel::GptImage15, true, 1024, 1024);
        let odd = table.cost_for(GenerationModel::GptImage15, false, 640, 480);
        assert!((wide - 0.200).abs() < 1e-9);
        assert!((square - 0.133).abs() < 1e-9);
        assert!((odd - 0.133).abs() < 1e-9);
    }

    #[test]
    fn cost_table_override() {
        let mut table = CostTable::default();
        table.set("fal-ai/nano-banana", 0.05);
        assert!((table.cost("fal-ai/nano-banana", None, None) - 0.05).abs() < 1e-9);
    }
}
