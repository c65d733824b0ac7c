//! Home-organization identity rules.
//!
//! The pipeline analyzes every subject from the vantage point of one fixed
//! first-party organization. When the analysis subject itself normalizes to
//! an alias of that organization, the news prompt must switch to first-person
//! framing; otherwise every strength/weakness label downstream inverts.

use regex::Regex;
use std::sync::LazyLock;

/// The fixed first-party organization.
pub const HOME_ORG: &str = "KT DS";

/// Spellings that resolve to the home organization after normalization.
const HOME_ORG_ALIASES: &[&str] = &["KT DS", "kt ds", "케이티디에스", "KTDS", "케이티 DS", "케이티 디에스"];

static NON_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z가-힣]").unwrap());

/// Case-fold a company name and strip everything that is not alphanumeric or
/// Hangul, so "케이티 디에스" and "KTDS" compare equal to their canonical forms.
pub fn normalize_org_name(name: &str) -> String {
    NON_NAME_CHARS.replace_all(name, "").to_lowercase()
}

/// Whether `company` refers to the home organization. An empty name counts:
/// "no specific company" analysis defaults to the first-party perspective.
pub fn is_home_org(company: &str) -> bool {
    let normalized = normalize_org_name(company);
    if normalized.is_empty() {
        return true;
    }
    HOME_ORG_ALIASES
        .iter()
        .any(|alias| normalize_org_name(alias) == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_spacing_and_case() {
        assert_eq!(normalize_org_name("KT DS"), "ktds");
        assert_eq!(normalize_org_name("케이티 디에스"), "케이티디에스");
        assert_eq!(normalize_org_name("  K-T/D.S  "), "ktds");
    }

    #[test]
    fn hangul_alias_matches() {
        assert!(is_home_org("케이티디에스"));
        assert!(is_home_org("케이티 DS"));
        assert!(is_home_org("ktds"));
    }

    #[test]
    fn empty_company_is_first_party() {
        assert!(is_home_org(""));
        assert!(is_home_org("   "));
    }

    #[test]
    fn other_companies_are_not_home() {
        assert!(!is_home_org("삼성SDS"));
        assert!(!is_home_org("LG CNS"));
    }
}
