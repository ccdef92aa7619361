use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The serde representation is the same string as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(BiomarkerStatus {
    Low => "low",
    Normal => "normal",
    High => "high",
    Unknown => "unknown",
});

str_enum!(RangeStatus {
    Low => "low",
    Normal => "normal",
    High => "high",
});

str_enum!(OAuthProviderKind {
    Google => "google",
});

impl From<RangeStatus> for BiomarkerStatus {
    fn from(status: RangeStatus) -> Self {
        match status {
            RangeStatus::Low => Self::Low,
            RangeStatus::Normal => Self::Normal,
            RangeStatus::High => Self::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn biomarker_status_round_trip() {
        for (variant, s) in [
            (BiomarkerStatus::Low, "low"),
            (BiomarkerStatus::Normal, "normal"),
            (BiomarkerStatus::High, "high"),
            (BiomarkerStatus::Unknown, "unknown"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(BiomarkerStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn biomarker_status_serializes_lowercase() {
        let json = serde_json::to_string(&BiomarkerStatus::Unknown).unwrap();
        assert_eq!(json, "\"unknown\"");
        let parsed: BiomarkerStatus = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, BiomarkerStatus::High);
    }

    #[test]
    fn range_status_maps_into_biomarker_status() {
        assert_eq!(BiomarkerStatus::from(RangeStatus::Low), BiomarkerStatus::Low);
        assert_eq!(BiomarkerStatus::from(RangeStatus::Normal), BiomarkerStatus::Normal);
        assert_eq!(BiomarkerStatus::from(RangeStatus::High), BiomarkerStatus::High);
    }

    #[test]
    fn invalid_enum_value_rejected() {
        let err = BiomarkerStatus::from_str("bas").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn oauth_provider_round_trip() {
        assert_eq!(OAuthProviderKind::Google.as_str(), "google");
        assert_eq!(
            OAuthProviderKind::from_str("google").unwrap(),
            OAuthProviderKind::Google
        );
    }
}
