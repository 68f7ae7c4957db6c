//! Status enumerations
//!
//! Each enum parses case- and separator-insensitively and keeps values it
//! does not recognize in `Other`, so a record read from an older backend
//! is written back unchanged.

use std::fmt;

use dc_core::normalize_token;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

macro_rules! lenient_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $wire:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            /// A value outside the known set, kept verbatim
            Other(String),
        }

        impl $name {
            /// Known members in display order
            pub const KNOWN: &'static [$name] = &[$($name::$variant),+];

            /// Canonical wire spelling
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other(raw) => raw.as_str(),
                }
            }

            pub fn parse(raw: &str) -> Self {
                let token = normalize_token(raw);
                $(
                    if token == normalize_token($wire) $(|| token == normalize_token($alias))* {
                        return $name::$variant;
                    }
                )+
                $name::Other(raw.trim().to_string())
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Other(_))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                $name::parse(raw)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name::parse(s))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok($name::parse(&raw))
            }
        }
    };
}

lenient_enum! {
    /// Permitting stage of a project
    ProjectStatus {
        PrePermit => "PRE_PERMIT" | "Pre permit",
        PostPermit => "POST_PERMIT" | "Post permit",
        Final => "FINAL",
    }
}

lenient_enum! {
    /// License standing of a professional
    ProfessionalStatus {
        Active => "Active",
        Warning => "Warning",
        Expired => "Expired",
    }
}

lenient_enum! {
    /// Lifecycle of a project document
    DocumentStatus {
        Pending => "Pending",
        Signed => "Signed",
        Delivered => "Delivered",
        Missing => "Missing",
        Uploaded => "Uploaded",
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::PrePermit
    }
}

impl ProjectStatus {
    /// Human label used in listings
    pub fn label(&self) -> &str {
        match self {
            ProjectStatus::PrePermit => "Pre permit",
            ProjectStatus::PostPermit => "Post permit",
            ProjectStatus::Final => "Final",
            ProjectStatus::Other(raw) => raw.as_str(),
        }
    }
}

impl ProfessionalStatus {
    /// Whether the license still allows assignment to new work
    pub fn is_usable(&self) -> bool {
        !matches!(self, ProfessionalStatus::Expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_spellings() {
        for raw in ["PRE_PERMIT", "Pre permit", "pre-permit", "PrePermit"] {
            assert_eq!(ProjectStatus::parse(raw), ProjectStatus::PrePermit, "{raw}");
        }
        assert_eq!(ProjectStatus::parse("Post permit"), ProjectStatus::PostPermit);
        assert_eq!(ProjectStatus::parse("final"), ProjectStatus::Final);
    }

    #[test]
    fn test_legacy_values_round_trip() {
        let status: ProjectStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, ProjectStatus::Other("in_progress".into()));
        assert!(!status.is_known());
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"in_progress\"");
    }

    #[test]
    fn test_canonical_encoding() {
        let status: ProjectStatus = serde_json::from_str("\"Pre permit\"").unwrap();
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"PRE_PERMIT\"");
        assert_eq!(status.label(), "Pre permit");
        assert_eq!(ProjectStatus::KNOWN.len(), 3);
    }

    #[test]
    fn test_professional_and_document_status() {
        assert_eq!(ProfessionalStatus::parse("active"), ProfessionalStatus::Active);
        assert!(!ProfessionalStatus::Expired.is_usable());
        assert_eq!(
            ProfessionalStatus::parse("pending"),
            ProfessionalStatus::Other("pending".into())
        );
        assert_eq!(DocumentStatus::parse("UPLOADED"), DocumentStatus::Uploaded);
        assert_eq!(DocumentStatus::Signed.to_string(), "Signed");
    }
}
