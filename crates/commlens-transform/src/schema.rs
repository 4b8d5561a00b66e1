//! Canonical column names and the per-platform equivalence table.

use commlens_model::Platform;

pub const IDENTIFIER: &str = "identifier";
pub const TITLE: &str = "title";
pub const DESCRIPTION: &str = "description";
pub const LANGUAGES: &str = "languages";
pub const TOTAL_USERS: &str = "total_users";
pub const ACTIVE_MONTH: &str = "active_month";
pub const RULES: &str = "rules";

/// Columns both platforms map into, in canonical order.
pub const COMMON_COLUMNS: [&str; 7] = [
    IDENTIFIER,
    TITLE,
    DESCRIPTION,
    LANGUAGES,
    TOTAL_USERS,
    ACTIVE_MONTH,
    RULES,
];

// Mastodon-only columns.
pub const TOP_TRENDS: &str = "top_5_trends";
pub const TOTAL_POSTS: &str = "total_posts";
pub const BLACKLIST: &str = "blacklist";
pub const BLACKLIST_COUNT: &str = "blacklist_count";
pub const SOURCE_URL: &str = "source_url";

// Reddit-only columns.
pub const OVER18: &str = "over18";
pub const QUARANTINE: &str = "quarantine";
pub const IS_RESTRICTED: &str = "is_restricted";
pub const MODERATORS_COUNT: &str = "moderators_count";

/// `(native, canonical)` pairs whose names differ.
const MASTODON_EQUIVALENCES: &[(&str, &str)] = &[("domain", IDENTIFIER)];

const REDDIT_EQUIVALENCES: &[(&str, &str)] = &[
    ("name", IDENTIFIER),
    ("language", LANGUAGES),
    ("subscribers", TOTAL_USERS),
    ("active_user_count", ACTIVE_MONTH),
];

fn equivalences(platform: Platform) -> &'static [(&'static str, &'static str)] {
    match platform {
        Platform::Mastodon => MASTODON_EQUIVALENCES,
        Platform::Reddit => REDDIT_EQUIVALENCES,
    }
}

/// Canonical name of a native column; unmapped names pass through.
pub fn canonical_name(platform: Platform, native: &str) -> &str {
    equivalences(platform)
        .iter()
        .find(|(from, _)| *from == native)
        .map_or(native, |&(_, to)| to)
}

/// Native name of a canonical column; unmapped names pass through.
pub fn native_name(platform: Platform, canonical: &str) -> &str {
    equivalences(platform)
        .iter()
        .find(|(_, to)| *to == canonical)
        .map_or(canonical, |&(from, _)| from)
}

/// Platform-specific columns carried alongside the common ones.
pub fn specific_columns(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Mastodon => &[TOP_TRENDS, TOTAL_POSTS, BLACKLIST, BLACKLIST_COUNT, SOURCE_URL],
        Platform::Reddit => &[OVER18, QUARANTINE, IS_RESTRICTED, MODERATORS_COUNT],
    }
}

/// Whether `column` belongs to the canonical schema of `platform`.
pub fn is_known_column(platform: Platform, column: &str) -> bool {
    COMMON_COLUMNS.contains(&column) || specific_columns(platform).contains(&column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_is_bidirectional() {
        for platform in Platform::ALL {
            for (native, canonical) in equivalences(platform) {
                assert_eq!(canonical_name(platform, native), *canonical);
                assert_eq!(native_name(platform, canonical), *native);
            }
        }
    }

    #[test]
    fn identifier_sources_differ_per_platform() {
        assert_eq!(canonical_name(Platform::Mastodon, "domain"), IDENTIFIER);
        assert_eq!(canonical_name(Platform::Reddit, "name"), IDENTIFIER);
        // "name" is not an identifier alias on the directory side.
        assert_eq!(canonical_name(Platform::Mastodon, "name"), "name");
    }

    #[test]
    fn canonical_names_map_to_themselves() {
        for platform in Platform::ALL {
            for column in COMMON_COLUMNS {
                assert_eq!(canonical_name(platform, column), column);
            }
        }
    }
}
