//! Column naming rules.

use once_cell::sync::Lazy;
use regex::Regex;

/// Explicit renames for source fields whose generic conversion reads badly.
pub const COLUMN_OVERRIDES: [(&str, &str); 6] = [
    ("yearOfRegistration", "registration_year"),
    ("monthOfRegistration", "registration_month"),
    ("notRepairedDamage", "unrepaired_damage"),
    ("dateCreated", "ad_created"),
    ("abtest", "ab_test"),
    ("nrOfPictures", "num_photos"),
];

// A capitalized word following any character: "vehicleType" -> "vehicle_Type"
static CAPITALIZED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("Invalid regex: capitalized word"));

// A capital following a lowercase letter or digit: "powerPS" -> "power_PS"
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid regex: lower-upper boundary"));

/// Convert a camelCase or PascalCase name to snake_case.
///
/// Names that are already snake_case come back unchanged.
pub fn to_snake_case(name: &str) -> String {
    let separated = CAPITALIZED_WORD.replace_all(name, "${1}_${2}");
    LOWER_UPPER
        .replace_all(&separated, "${1}_${2}")
        .to_lowercase()
}

/// Normalize one column name: explicit override first, generic rule otherwise.
pub fn normalize_name(name: &str) -> String {
    let name = name.trim();
    COLUMN_OVERRIDES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| to_snake_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("vehicleType"), "vehicle_type");
        assert_eq!(to_snake_case("dateCrawled"), "date_crawled");
        assert_eq!(to_snake_case("powerPS"), "power_ps");
        assert_eq!(to_snake_case("lastSeen"), "last_seen");
        assert_eq!(to_snake_case("PostalCode"), "postal_code");
        assert_eq!(to_snake_case("kilometer"), "kilometer");
    }

    #[test]
    fn test_overrides_take_precedence() {
        assert_eq!(normalize_name("yearOfRegistration"), "registration_year");
        assert_eq!(normalize_name("nrOfPictures"), "num_photos");
        assert_eq!(normalize_name("abtest"), "ab_test");
        // The generic rule alone would give "date_created"
        assert_eq!(normalize_name("dateCreated"), "ad_created");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize_name("  fuelType "), "fuel_type");
    }

    #[test]
    fn test_normalized_names_are_fixed_points() {
        for raw in ["vehicleType", "yearOfRegistration", "powerPS", "abtest", "dateCreated"] {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once, "not idempotent for {raw}");
        }
    }
}
