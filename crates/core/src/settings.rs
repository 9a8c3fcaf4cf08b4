//! Singleton settings shown on the guest page.
//!
//! Each settings type is replaced wholesale on update. Fields a client leaves
//! out of an update fall back to their defaults rather than keeping the stored
//! value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Background image of the guest page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Image URL; empty when no background is set.
    pub url: String,
}

impl BackgroundConfig {
    pub fn is_set(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Fonts the guest page knows how to render the couple names in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameFont {
    #[default]
    Arial,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    Georgia,
    #[serde(rename = "Great Vibes")]
    GreatVibes,
    #[serde(rename = "Dancing Script")]
    DancingScript,
    Pacifico,
    Parisienne,
    Cairo,
    Amiri,
    Lateef,
}

impl NameFont {
    pub const ALL: [NameFont; 10] = [
        NameFont::Arial,
        NameFont::TimesNewRoman,
        NameFont::Georgia,
        NameFont::GreatVibes,
        NameFont::DancingScript,
        NameFont::Pacifico,
        NameFont::Parisienne,
        NameFont::Cairo,
        NameFont::Amiri,
        NameFont::Lateef,
    ];

    /// CSS font-family name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arial => "Arial",
            Self::TimesNewRoman => "Times New Roman",
            Self::Georgia => "Georgia",
            Self::GreatVibes => "Great Vibes",
            Self::DancingScript => "Dancing Script",
            Self::Pacifico => "Pacifico",
            Self::Parisienne => "Parisienne",
            Self::Cairo => "Cairo",
            Self::Amiri => "Amiri",
            Self::Lateef => "Lateef",
        }
    }
}

impl fmt::Display for NameFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Couple names displayed over the background.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NamesConfig {
    pub top_name: String,
    pub bottom_name: String,
    pub font: NameFont,
    /// Render an "&" between the two names.
    pub show_and_symbol: bool,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            top_name: String::new(),
            bottom_name: String::new(),
            font: NameFont::default(),
            show_and_symbol: true,
        }
    }
}

fn default_heading_font() -> String {
    "Cairo".to_string()
}

/// Heading shown at the bottom of the guest page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadingConfig {
    pub title: String,
    pub subtitle: String,
    /// Free-form CSS font-family.
    pub font: String,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            font: default_heading_font(),
        }
    }
}
