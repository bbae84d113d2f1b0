use serde::{Deserialize, Serialize};

use crate::{error::Error, title::TitleId};

/// Host-facing settings of the HLE layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hle3dConfig {
    /// Integer upscale factor of the output buffers.
    pub scale: usize,
    /// Outline every sprite drawn by the V3D backend on the committed frame.
    pub debug_draw: bool,
    /// Per-title overrides of the Drome suppression policy.
    pub suppression: Vec<SuppressionOverride>,
}

impl Default for Hle3dConfig {
    fn default() -> Self {
        Self {
            scale: 1,
            debug_draw: false,
            suppression: Vec::new(),
        }
    }
}

impl Hle3dConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.scale == 0 {
            return Err(Error::InvalidScale(self.scale));
        }

        Ok(())
    }

    /// The policy for `title`: `default` with the first matching override applied on top.
    #[must_use]
    pub fn suppression_for(&self, title: TitleId, default: SuppressionPolicy) -> SuppressionPolicy {
        self.suppression
            .iter()
            .find(|o| o.title == title)
            .map_or(default, |o| SuppressionPolicy {
                hook_transform: o.hook_transform.unwrap_or(default.hook_transform),
                disable_real_transform: o.disable_real_transform.unwrap_or(default.disable_real_transform),
                disable_real_rasterizer: o.disable_real_rasterizer.unwrap_or(default.disable_real_rasterizer),
            })
    }
}

/// How much of a title's own 3D pipeline keeps running next to the HLE one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionPolicy {
    /// Intercept the transform stage at all.
    pub hook_transform: bool,
    /// Hand the interpreted transform stage an empty object list.
    pub disable_real_transform: bool,
    /// Hand the interpreted rasterizer an empty primitive stream.
    pub disable_real_rasterizer: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionOverride {
    pub title: TitleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_transform: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_real_transform: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_real_rasterizer: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DEFAULT: SuppressionPolicy = SuppressionPolicy {
        hook_transform: false,
        disable_real_transform: false,
        disable_real_rasterizer: true,
    };

    #[test]
    fn defaults() {
        let config: Hle3dConfig = toml::from_str("").unwrap();
        assert_eq!(config, Hle3dConfig::default());
        assert_eq!(config.scale, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_overrides() {
        let config: Hle3dConfig = toml::from_str(
            r#"
            scale = 3
            debug_draw = true

            [[suppression]]
            title = "AOEX"
            disable_real_rasterizer = false
            "#,
        )
        .unwrap();

        assert_eq!(config.scale, 3);
        assert!(config.debug_draw);

        let drome = TitleId::from_code(b"AOEX");
        assert_eq!(
            config.suppression_for(drome, DEFAULT),
            SuppressionPolicy {
                disable_real_rasterizer: false,
                ..DEFAULT
            }
        );
        assert_eq!(config.suppression_for(TitleId::from_code(b"BHEE"), DEFAULT), DEFAULT);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(toml::from_str::<Hle3dConfig>("[[suppression]]\ntitle = \"TOOLONG\"").is_err());

        let config = Hle3dConfig {
            scale: 0,
            ..Hle3dConfig::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidScale(0)));
    }

    #[test]
    fn round_trip() {
        let config = Hle3dConfig {
            scale: 2,
            debug_draw: false,
            suppression: vec![SuppressionOverride {
                title: TitleId::from_code(b"BQJE"),
                hook_transform: Some(true),
                disable_real_transform: None,
                disable_real_rasterizer: None,
            }],
        };

        let text = toml::to_string(&config).unwrap();
        assert_eq!(toml::from_str::<Hle3dConfig>(&text).unwrap(), config);
    }
}
