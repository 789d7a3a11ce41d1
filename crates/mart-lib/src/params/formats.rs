use crate::error::MartError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Document formats the processor can produce.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Md,
    Html,
    Pdf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Md, OutputFormat::Html, OutputFormat::Pdf];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Md => "md",
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Source formats the processor understands.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Md,
    Html,
}

impl InputFormat {
    pub const ALL: [InputFormat; 2] = [InputFormat::Md, InputFormat::Html];

    pub fn as_str(self) -> &'static str {
        match self {
            InputFormat::Md => "md",
            InputFormat::Html => "html",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// How downloaded images with equal content or names are collapsed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeduplicationType {
    #[default]
    Disabled,
    ByContent,
    ByFilename,
}

impl DeduplicationType {
    pub const ALL: [DeduplicationType; 3] = [
        DeduplicationType::Disabled,
        DeduplicationType::ByContent,
        DeduplicationType::ByFilename,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeduplicationType::Disabled => "disabled",
            DeduplicationType::ByContent => "by-content",
            DeduplicationType::ByFilename => "by-filename",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

macro_rules! impl_name_parsing {
    ($ty:ty, $kind:literal) => {
        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = MartError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                <$ty>::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| MartError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                        expected: <$ty>::ALL.iter().map(|v| v.as_str()).join(", "),
                    })
            }
        }
    };
}

impl_name_parsing!(OutputFormat, "output format");
impl_name_parsing!(InputFormat, "input format");
impl_name_parsing!(DeduplicationType, "deduplication type");
