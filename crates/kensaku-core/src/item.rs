//! Result items
//!
//! Backend results are either videos or entity bios. Bios carry a
//! backend-assigned display tier controlling how much of the profile the
//! UI discloses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultItem {
    /// A video
    Video(Video),
    /// A person profile
    EntityBio(EntityBio),
}

impl ResultItem {
    /// Identifier of the item (video id or person name)
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Video(video) => &video.identifier,
            Self::EntityBio(bio) => &bio.name,
        }
    }

    /// Check if this is a bio
    #[must_use]
    pub fn is_bio(&self) -> bool {
        matches!(self, Self::EntityBio(_))
    }

    /// Borrow as a video
    #[must_use]
    pub fn as_video(&self) -> Option<&Video> {
        match self {
            Self::Video(video) => Some(video),
            Self::EntityBio(_) => None,
        }
    }

    /// Borrow as a bio
    #[must_use]
    pub fn as_bio(&self) -> Option<&EntityBio> {
        match self {
            Self::EntityBio(bio) => Some(bio),
            Self::Video(_) => None,
        }
    }
}

/// Video result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Catalogue identifier (e.g. `ABC-123`)
    pub identifier: String,
    /// Title
    pub title: String,
    /// Title in the original language
    pub native_title: Option<String>,
    /// Release date as sent by the backend
    pub release_date: Option<String>,
    /// Cover image URL
    pub image: Option<String>,
    /// Semantic score (0.0 to 1.0)
    pub score: f64,
    /// Credited performers
    #[serde(default)]
    pub actress_names: Vec<String>,
    /// Link to the item's page
    pub permalink: Option<String>,
}

impl Video {
    /// Create a video with only identifier and title
    #[must_use]
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            native_title: None,
            release_date: None,
            image: None,
            score: 0.0,
            actress_names: Vec::new(),
            permalink: None,
        }
    }

    /// Set the score
    #[must_use]
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Set the performers
    #[must_use]
    pub fn with_actresses<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actress_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the release date
    #[must_use]
    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    /// Score as a rounded percentage
    #[must_use]
    pub fn match_percent(&self) -> u32 {
        let pct = (self.score * 100.0).round();
        if pct.is_finite() && pct > 0.0 {
            pct as u32
        } else {
            0
        }
    }

    /// Release date formatted as `Mon YYYY`, if parseable
    #[must_use]
    pub fn display_date(&self) -> Option<String> {
        let raw = self.release_date.as_deref()?.trim();
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .ok()
            .map(|date| date.format("%b %Y").to_string())
    }

    /// First two performers, for card meta lines
    #[must_use]
    pub fn headline_names(&self) -> Vec<&str> {
        self.actress_names.iter().take(2).map(String::as_str).collect()
    }

    /// Split a comma-separated performer list
    #[must_use]
    pub fn parse_names(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Backend-assigned disclosure level for bios (0 to 3)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DisplayTier(u8);

impl DisplayTier {
    /// Highest tier
    pub const MAX: u8 = 3;

    /// Create a tier, clamped to `0..=3`
    #[must_use]
    pub fn new(tier: u8) -> Self {
        Self(tier.min(Self::MAX))
    }

    /// Create from the backend's numeric tier (fractional tiers round down)
    #[must_use]
    pub fn from_raw(raw: f64) -> Self {
        if !raw.is_finite() || raw <= 0.0 {
            return Self(0);
        }
        Self::new(raw.floor().min(f64::from(Self::MAX)) as u8)
    }

    /// Numeric value
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Render an entity header in the result list
    #[must_use]
    pub fn shows_header(&self) -> bool {
        self.0 >= 1
    }

    /// Populate the sidebar knowledge panel
    #[must_use]
    pub fn shows_sidebar(&self) -> bool {
        self.0 >= 2
    }

    /// Include the long-form description
    #[must_use]
    pub fn shows_description(&self) -> bool {
        self.0 >= 3
    }
}

/// A labelled profile fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Display label
    pub label: String,
    /// Display value
    pub value: String,
}

impl Fact {
    /// Create a fact, discarding blank and placeholder values
    ///
    /// Newlines in scraped values are folded into comma lists.
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl AsRef<str>) -> Option<Self> {
        let value = value.as_ref().trim();
        if value.is_empty() || value == "?" || value == "N/A" {
            return None;
        }
        let value = value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        Some(Self {
            label: label.into(),
            value,
        })
    }
}

/// An external profile link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    /// Short label (e.g. `X`)
    pub label: String,
    /// Target URL
    pub url: String,
}

impl SocialLink {
    /// Link to an X (Twitter) profile
    #[must_use]
    pub fn x(handle: &str) -> Self {
        let handle = handle.trim().trim_start_matches('@');
        Self {
            label: "X".to_string(),
            url: format!("https://twitter.com/{handle}"),
        }
    }

    /// Web search for the person's name
    #[must_use]
    pub fn web_search(name: &str) -> Self {
        let query: String =
            url::form_urlencoded::byte_serialize(format!("{} actress", name.trim()).as_bytes())
                .collect();
        Self {
            label: "Google".to_string(),
            url: format!("https://www.google.com/search?q={query}"),
        }
    }
}

/// Person profile result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBio {
    /// Display name (also the identifier)
    pub name: String,
    /// Name in the original script
    pub native_name: Option<String>,
    /// Disclosure tier
    pub tier: DisplayTier,
    /// Avatar image URL
    pub avatar: Option<String>,
    /// Personal facts, in display order
    #[serde(default)]
    pub personal_facts: Vec<Fact>,
    /// Physical facts, in display order
    #[serde(default)]
    pub physical_facts: Vec<Fact>,
    /// External profile links
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
    /// Long-form description
    pub description: Option<String>,
}

impl EntityBio {
    /// Create a bio with a name and tier
    #[must_use]
    pub fn new(name: impl Into<String>, tier: DisplayTier) -> Self {
        Self {
            name: name.into(),
            native_name: None,
            tier,
            avatar: None,
            personal_facts: Vec::new(),
            physical_facts: Vec::new(),
            social_links: Vec::new(),
            description: None,
        }
    }
}
