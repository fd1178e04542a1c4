use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("low cards threshold must be > 0")]
    InvalidLowCardsThreshold,

    #[error("debounce must be between 1 and 10000 ms")]
    InvalidDebounceMs,

    #[error("category weight must be between 1 and {MAX_ROLL_WEIGHT}")]
    InvalidCategoryWeight,

    #[error("choose weight must be at most {MAX_ROLL_WEIGHT}")]
    InvalidChooseWeight,

    #[error("storage key cannot be empty")]
    EmptyStorageKey,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

pub const DEFAULT_STORAGE_KEY: &str = "trivia.session.v1";

/// Upper bound for a single die-face weight.
pub const MAX_ROLL_WEIGHT: u32 = 10_000;

/// Policy constants for the session engine.
///
/// Controls the low-cards warning, the roll weights, and persistence pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    low_cards_threshold: usize,
    debounce_ms: u64,
    category_weight: u32,
    choose_weight: u32,
    storage_key: String,
}

impl Default for EngineSettings {
    /// Defaults:
    /// - warn when fewer than 5 cards remain in a topic
    /// - every eligible roll face weighs the same (1/6 each with a full deck)
    /// - collapse writes within a 300 ms window
    fn default() -> Self {
        Self {
            low_cards_threshold: 5,
            debounce_ms: 300,
            category_weight: 1,
            choose_weight: 1,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl EngineSettings {
    /// Creates custom engine settings.
    ///
    /// `choose_weight` may be zero, which disables the manual-choice faces.
    /// Both weights are capped at [`MAX_ROLL_WEIGHT`].
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any value is out of range.
    pub fn new(
        low_cards_threshold: usize,
        debounce_ms: u64,
        category_weight: u32,
        choose_weight: u32,
        storage_key: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        if low_cards_threshold == 0 {
            return Err(SettingsError::InvalidLowCardsThreshold);
        }
        if !(1..=10_000).contains(&debounce_ms) {
            return Err(SettingsError::InvalidDebounceMs);
        }
        if !(1..=MAX_ROLL_WEIGHT).contains(&category_weight) {
            return Err(SettingsError::InvalidCategoryWeight);
        }
        if choose_weight > MAX_ROLL_WEIGHT {
            return Err(SettingsError::InvalidChooseWeight);
        }
        let storage_key = storage_key.into();
        if storage_key.trim().is_empty() {
            return Err(SettingsError::EmptyStorageKey);
        }

        Ok(Self {
            low_cards_threshold,
            debounce_ms,
            category_weight,
            choose_weight,
            storage_key,
        })
    }

    /// Copy of these settings with a different debounce window.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidDebounceMs` if out of range.
    pub fn with_debounce_ms(self, debounce_ms: u64) -> Result<Self, SettingsError> {
        Self::new(
            self.low_cards_threshold,
            debounce_ms,
            self.category_weight,
            self.choose_weight,
            self.storage_key,
        )
    }

    /// Copy of these settings with a different low-cards threshold.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidLowCardsThreshold` if zero.
    pub fn with_low_cards_threshold(self, threshold: usize) -> Result<Self, SettingsError> {
        Self::new(
            threshold,
            self.debounce_ms,
            self.category_weight,
            self.choose_weight,
            self.storage_key,
        )
    }

    // Accessors
    #[must_use]
    pub fn low_cards_threshold(&self) -> usize {
        self.low_cards_threshold
    }

    #[must_use]
    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    #[must_use]
    pub fn category_weight(&self) -> u32 {
        self.category_weight
    }

    #[must_use]
    pub fn choose_weight(&self) -> u32 {
        self.choose_weight
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }
}
