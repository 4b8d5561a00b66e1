//! Per-platform behavior behind one interface.

use commlens_model::{Platform, RawTable, SchemaError};

use crate::extract::{RulesTable, extract_rules};
use crate::language::{
    ClassificationInput, ClassifiedRules, FilterOptions, FilteredRules, english_communities,
    filter_by_declared_language, filter_by_english_share,
};
use crate::normalize::{CanonicalTable, NormalizeOptions, SchemaNormalizer};

pub trait PlatformAdapter {
    fn platform(&self) -> Platform;

    fn normalize(&self, raw: RawTable) -> Result<CanonicalTable, SchemaError>;

    fn extract_rules(&self, table: &CanonicalTable) -> Result<RulesTable, SchemaError> {
        if table.platform() != self.platform() {
            return Err(SchemaError::PlatformMismatch {
                expected: self.platform(),
                found: table.platform(),
            });
        }
        extract_rules(table)
    }

    /// Text handed to the language classifier for each rule.
    fn classification_input(&self) -> ClassificationInput;

    fn filter_english(
        &self,
        table: &CanonicalTable,
        rules: ClassifiedRules,
        options: &FilterOptions,
    ) -> FilteredRules;
}

/// Structured rule payloads, filtered by each server's English share.
#[derive(Debug, Clone)]
pub struct MastodonAdapter {
    normalizer: SchemaNormalizer,
}

impl MastodonAdapter {
    pub fn new(options: NormalizeOptions) -> Result<Self, SchemaError> {
        Ok(Self {
            normalizer: SchemaNormalizer::new(Platform::Mastodon)?.with_options(options),
        })
    }
}

impl PlatformAdapter for MastodonAdapter {
    fn platform(&self) -> Platform {
        Platform::Mastodon
    }

    fn normalize(&self, raw: RawTable) -> Result<CanonicalTable, SchemaError> {
        self.normalizer.normalize(raw)
    }

    fn classification_input(&self) -> ClassificationInput {
        ClassificationInput::DocumentTokens
    }

    fn filter_english(
        &self,
        _table: &CanonicalTable,
        rules: ClassifiedRules,
        options: &FilterOptions,
    ) -> FilteredRules {
        filter_by_english_share(rules, options)
    }
}

/// Delimited rule text, filtered by the community's declared language.
#[derive(Debug, Clone)]
pub struct RedditAdapter {
    normalizer: SchemaNormalizer,
}

impl RedditAdapter {
    pub fn new(options: NormalizeOptions) -> Result<Self, SchemaError> {
        Ok(Self {
            normalizer: SchemaNormalizer::new(Platform::Reddit)?.with_options(options),
        })
    }
}

impl PlatformAdapter for RedditAdapter {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    fn normalize(&self, raw: RawTable) -> Result<CanonicalTable, SchemaError> {
        self.normalizer.normalize(raw)
    }

    fn classification_input(&self) -> ClassificationInput {
        ClassificationInput::StandardizedText
    }

    fn filter_english(
        &self,
        table: &CanonicalTable,
        rules: ClassifiedRules,
        _options: &FilterOptions,
    ) -> FilteredRules {
        filter_by_declared_language(rules, &english_communities(table))
    }
}

pub fn adapter_for(
    platform: Platform,
    options: NormalizeOptions,
) -> Result<Box<dyn PlatformAdapter>, SchemaError> {
    Ok(match platform {
        Platform::Mastodon => Box::new(MastodonAdapter::new(options)?),
        Platform::Reddit => Box::new(RedditAdapter::new(options)?),
    })
}
