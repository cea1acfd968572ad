// ABOUTME: Integration tests for colors, versions, and status values.
// ABOUTME: Includes property tests for version validation and color parsing.

use bluegreen::types::*;
use proptest::prelude::*;

mod color_tests {
    use super::*;

    #[test]
    fn other_is_an_involution() {
        for color in Color::ALL {
            assert_ne!(color.other(), color);
            assert_eq!(color.other().other(), color);
        }
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Color::Green).unwrap(), "\"green\"");
        let parsed: Color = serde_json::from_str("\"blue\"").unwrap();
        assert_eq!(parsed, Color::Blue);
    }

    #[test]
    fn display_honors_width() {
        assert_eq!(format!("[{:<6}]", Color::Blue), "[blue  ]");
    }
}

mod version_tests {
    use super::*;

    #[test]
    fn accepts_common_tags() {
        for tag in ["v1", "1.2.3", "2024-01-01T00:00:00.000Z", "sha-abc123"] {
            assert_eq!(Version::new(tag).unwrap().as_str(), tag);
        }
    }

    #[test]
    fn rejects_bad_tags() {
        assert_eq!(Version::new(""), Err(VersionError::Empty));
        assert_eq!(Version::new("v 1"), Err(VersionError::InvalidChar(' ')));
        assert_eq!(Version::new(&"x".repeat(129)), Err(VersionError::TooLong));
    }

    #[test]
    fn timestamped_versions_are_valid() {
        let version = Version::timestamped();
        assert!(version.as_str().ends_with('Z'));
        Version::new(version.as_str()).unwrap();
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Version>("\"v2\"").is_ok());
        assert!(serde_json::from_str::<Version>("\"\"").is_err());
    }
}

mod status_tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(Status::default(), Status::Inactive);
        assert_eq!(HealthStatus::default(), HealthStatus::Unknown);
        assert!(!HealthStatus::Unknown.is_healthy());
        assert!(!HealthStatus::Unhealthy.is_healthy());
        assert!(HealthStatus::Healthy.is_healthy());
    }

    #[test]
    fn history_values_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Outcome::Failed).unwrap(), "\"failed\"");
        assert_eq!(
            serde_json::to_string(&SwitchKind::Rollback).unwrap(),
            "\"rollback\""
        );
    }
}

proptest! {
    #[test]
    fn printable_tags_round_trip(tag in "[A-Za-z0-9._:+-]{1,128}") {
        let version = Version::new(&tag).unwrap();
        prop_assert_eq!(version.as_str(), tag.as_str());
        prop_assert_eq!(version.to_string(), tag);
    }

    #[test]
    fn tags_with_whitespace_are_rejected(
        prefix in "[a-z0-9]{0,10}",
        suffix in "[a-z0-9]{0,10}",
        ws in "[ \t\n]"
    ) {
        let tag = format!("{prefix}{ws}{suffix}");
        prop_assert!(Version::new(&tag).is_err());
    }

    #[test]
    fn color_parse_ignores_case(name in "(?i)(blue|green)") {
        let color: Color = name.parse().unwrap();
        prop_assert_eq!(color.as_str(), name.to_ascii_lowercase());
    }

    #[test]
    fn other_words_are_not_colors(word in "[a-z]{1,8}") {
        prop_assume!(word != "blue" && word != "green");
        prop_assert!(word.parse::<Color>().is_err());
    }
}
