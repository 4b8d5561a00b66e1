//! Schema normalization: native column names to canonical ones, then
//! per-column coercion through an explicit registry.
//!
//! The registry is validated when it is built, so a strategy keyed by a
//! misspelled column is a construction error rather than a silent no-op.
//! Normalization consumes a [`RawTable`] and yields a [`CanonicalTable`];
//! every strategy accepts its own output, so feeding a canonical table
//! back in (via [`CanonicalTable::into_raw`]) reproduces it exactly.

use commlens_model::{CellValue, Column, Platform, RawTable, SchemaError, Table};
use tracing::{debug, info, warn};

use crate::coercion::CoercionStrategy;
use crate::schema::{
    self, ACTIVE_MONTH, BLACKLIST, BLACKLIST_COUNT, COMMON_COLUMNS, DESCRIPTION, IS_RESTRICTED,
    LANGUAGES, MODERATORS_COUNT, OVER18, QUARANTINE, RULES, SOURCE_URL, TOTAL_POSTS, TOTAL_USERS,
};

/// Registry entry: coerce `source` into `target` with `strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoercionRule {
    pub target: &'static str,
    pub source: &'static str,
    pub strategy: CoercionStrategy,
}

impl CoercionRule {
    pub const fn new(column: &'static str, strategy: CoercionStrategy) -> Self {
        Self {
            target: column,
            source: column,
            strategy,
        }
    }

    /// A column computed from another one, leaving the source intact.
    pub const fn derived(
        target: &'static str,
        source: &'static str,
        strategy: CoercionStrategy,
    ) -> Self {
        Self {
            target,
            source,
            strategy,
        }
    }
}

const MASTODON_RULES: &[CoercionRule] = &[
    CoercionRule::new(DESCRIPTION, CoercionStrategy::FreeText),
    CoercionRule::new(LANGUAGES, CoercionStrategy::LiteralList),
    CoercionRule::new(TOTAL_USERS, CoercionStrategy::Integer),
    CoercionRule::new(ACTIVE_MONTH, CoercionStrategy::Integer),
    CoercionRule::new(RULES, CoercionStrategy::RecordList),
    CoercionRule::new(TOTAL_POSTS, CoercionStrategy::Integer),
    CoercionRule::derived(BLACKLIST_COUNT, BLACKLIST, CoercionStrategy::EntryCount('|')),
    CoercionRule::new(SOURCE_URL, CoercionStrategy::ScalarText),
];

const REDDIT_RULES: &[CoercionRule] = &[
    CoercionRule::new(DESCRIPTION, CoercionStrategy::FreeText),
    CoercionRule::new(LANGUAGES, CoercionStrategy::ScalarText),
    CoercionRule::new(TOTAL_USERS, CoercionStrategy::Integer),
    CoercionRule::new(ACTIVE_MONTH, CoercionStrategy::Integer),
    CoercionRule::new(RULES, CoercionStrategy::DelimitedList(';')),
    CoercionRule::new(OVER18, CoercionStrategy::Boolean),
    CoercionRule::new(QUARANTINE, CoercionStrategy::Boolean),
    CoercionRule::new(IS_RESTRICTED, CoercionStrategy::Boolean),
    CoercionRule::new(MODERATORS_COUNT, CoercionStrategy::Integer),
];

/// Mapping from canonical column name to its coercion strategy.
#[derive(Debug, Clone)]
pub struct ColumnRegistry {
    platform: Platform,
    rules: Vec<CoercionRule>,
}

impl ColumnRegistry {
    /// Builds a registry, rejecting unknown or duplicate targets.
    pub fn new(platform: Platform, rules: Vec<CoercionRule>) -> Result<Self, SchemaError> {
        for (idx, rule) in rules.iter().enumerate() {
            for column in [rule.target, rule.source] {
                if !schema::is_known_column(platform, column) {
                    return Err(SchemaError::UnknownColumn {
                        column: column.to_string(),
                        platform,
                    });
                }
            }
            if rules[..idx].iter().any(|earlier| earlier.target == rule.target) {
                return Err(SchemaError::DuplicateStrategy(rule.target.to_string()));
            }
        }
        Ok(Self { platform, rules })
    }

    /// The built-in registry for a platform.
    pub fn for_platform(platform: Platform) -> Result<Self, SchemaError> {
        let rules = match platform {
            Platform::Mastodon => MASTODON_RULES,
            Platform::Reddit => REDDIT_RULES,
        };
        Self::new(platform, rules.to_vec())
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn rules(&self) -> &[CoercionRule] {
        &self.rules
    }

    pub fn strategy(&self, target: &str) -> Option<CoercionStrategy> {
        self.rules
            .iter()
            .find(|rule| rule.target == target)
            .map(|rule| rule.strategy)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Keep only the columns both platforms share.
    pub keep_common_only: bool,
}

/// A table in the canonical schema. Only [`SchemaNormalizer`] creates one.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    platform: Platform,
    table: Table,
}

impl CanonicalTable {
    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.table.column(name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.table.get(row, column)
    }

    /// The `rules` column, checked to hold a list in every row.
    pub fn rules_column(&self) -> Result<&Column, SchemaError> {
        let column = self
            .table
            .column(RULES)
            .ok_or(SchemaError::MissingRulesColumn)?;
        if let Some((row, cell)) = column
            .values
            .iter()
            .enumerate()
            .find(|(_, cell)| cell.as_list().is_none())
        {
            return Err(SchemaError::RulesNotList {
                row,
                found: cell.type_name(),
            });
        }
        Ok(column)
    }

    /// Hands the table back as raw input, e.g. to re-run normalization.
    pub fn into_raw(self) -> RawTable {
        RawTable::new(self.platform, self.table)
    }
}

/// Maps one platform's native tables into the canonical schema.
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    registry: ColumnRegistry,
    options: NormalizeOptions,
}

impl SchemaNormalizer {
    pub fn new(platform: Platform) -> Result<Self, SchemaError> {
        Ok(Self::with_registry(ColumnRegistry::for_platform(platform)?))
    }

    pub fn with_registry(registry: ColumnRegistry) -> Self {
        Self {
            registry,
            options: NormalizeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn platform(&self) -> Platform {
        self.registry.platform()
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    /// Renames columns, then coerces every registered column present.
    ///
    /// Malformed cells fall back to column defaults; only structural
    /// problems (wrong platform, name collisions after renaming, a
    /// strategy producing a column of the wrong height) are errors.
    pub fn normalize(&self, raw: RawTable) -> Result<CanonicalTable, SchemaError> {
        let platform = self.platform();
        if raw.platform != platform {
            return Err(SchemaError::PlatformMismatch {
                expected: platform,
                found: raw.platform,
            });
        }
        let renamed: Vec<Column> = raw
            .table
            .into_columns()
            .into_iter()
            .map(|column| {
                let canonical = schema::canonical_name(platform, &column.name).to_string();
                column.with_name(canonical)
            })
            .collect();
        let mut table = Table::new(renamed)?;
        if self.options.keep_common_only {
            table = table.select(&COMMON_COLUMNS);
        }

        let mut defaulted_total = 0usize;
        for rule in self.registry.rules() {
            let Some(source) = table.column(rule.source) else {
                continue;
            };
            let coerced = rule.strategy.apply(source, rule.target);
            debug!(
                platform = %platform,
                column = rule.target,
                source = rule.source,
                strategy = rule.strategy.display_name(),
                defaulted = coerced.defaulted,
                "coerced column"
            );
            if coerced.defaulted > 0 {
                warn!(
                    platform = %platform,
                    column = rule.target,
                    defaulted = coerced.defaulted,
                    "unreadable cells replaced by defaults"
                );
            }
            defaulted_total += coerced.defaulted;
            table.with_column(coerced.column)?;
        }

        info!(
            platform = %platform,
            rows = table.height(),
            columns = table.width(),
            defaulted_cells = defaulted_total,
            "normalized table"
        );
        Ok(CanonicalTable { platform, table })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_registries_validate() {
        for platform in Platform::ALL {
            let registry = ColumnRegistry::for_platform(platform).expect("registry");
            assert!(registry.strategy(RULES).is_some());
            assert!(registry.strategy(schema::IDENTIFIER).is_none());
        }
    }

    #[test]
    fn misspelled_column_is_a_construction_error() {
        let err = ColumnRegistry::new(
            Platform::Reddit,
            vec![CoercionRule::new("subscriber", CoercionStrategy::Integer)],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownColumn { .. }));
    }

    #[test]
    fn platform_specific_columns_are_not_shared() {
        let err = ColumnRegistry::new(
            Platform::Mastodon,
            vec![CoercionRule::new(OVER18, CoercionStrategy::Boolean)],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownColumn { .. }));
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let err = ColumnRegistry::new(
            Platform::Reddit,
            vec![
                CoercionRule::new(TOTAL_USERS, CoercionStrategy::Integer),
                CoercionRule::new(TOTAL_USERS, CoercionStrategy::FreeText),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateStrategy(_)));
    }
}
