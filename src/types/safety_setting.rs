use serde::{Deserialize, Serialize};

/// Categories of harmful content the service can filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    /// Negative or harmful comments targeting identity or protected attributes.
    HarmCategoryHarassment,
    /// Content that is rude, disrespectful, or profane.
    HarmCategoryHateSpeech,
    /// References to sexual acts or other lewd content.
    HarmCategorySexuallyExplicit,
    /// Promotes or enables access to harmful goods, services, and activities.
    HarmCategoryDangerousContent,
    /// Content that may be used to harm civic integrity.
    HarmCategoryCivicIntegrity,
}

/// How aggressively content in a category is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    /// Block when low, medium or high probability of unsafe content.
    BlockLowAndAbove,
    /// Block when medium or high probability of unsafe content.
    BlockMediumAndAbove,
    /// Block when high probability of unsafe content.
    BlockOnlyHigh,
    /// Always show regardless of probability of unsafe content.
    BlockNone,
    /// Turn off the safety filter.
    Off,
}

/// A single (category, threshold) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    /// The harm category this setting applies to.
    pub category: HarmCategory,
    /// The blocking threshold for the category.
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Create a new `SafetySetting`.
    pub fn new(category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        Self {
            category,
            threshold,
        }
    }
}

/// An ordered collection of safety settings, one per harm category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SafetyPolicy {
    settings: Vec<SafetySetting>,
}

impl SafetyPolicy {
    /// Create an empty policy that defers to the service defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// The policy every chat session uses: harassment, hate speech, sexually
    /// explicit and dangerous content all blocked at medium and above.
    pub fn chat_defaults() -> Self {
        [
            HarmCategory::HarmCategoryHarassment,
            HarmCategory::HarmCategoryHateSpeech,
            HarmCategory::HarmCategorySexuallyExplicit,
            HarmCategory::HarmCategoryDangerousContent,
        ]
        .into_iter()
        .fold(Self::new(), |policy, category| {
            policy.with_setting(SafetySetting::new(
                category,
                HarmBlockThreshold::BlockMediumAndAbove,
            ))
        })
    }

    /// Append a setting, replacing any existing setting for the same category
    /// in place so that order is preserved.
    pub fn with_setting(mut self, setting: SafetySetting) -> Self {
        match self
            .settings
            .iter_mut()
            .find(|existing| existing.category == setting.category)
        {
            Some(existing) => existing.threshold = setting.threshold,
            None => self.settings.push(setting),
        }
        self
    }

    /// Returns the settings in order.
    pub fn settings(&self) -> &[SafetySetting] {
        &self.settings
    }

    /// Returns true if no settings are configured.
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}
