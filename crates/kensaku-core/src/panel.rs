//! Presentation models
//!
//! DOM-agnostic view models carried by render instructions. A view port
//! decides how to draw them; nothing here knows about markup.

use serde::{Deserialize, Serialize};

use crate::item::{EntityBio, Fact, SocialLink, Video};

/// Fallback snippet for videos without a native title
pub const MISSING_NATIVE_TITLE: &str = "No Japanese title available.";

/// Longest description shown in the knowledge panel
pub const DESCRIPTION_LIMIT: usize = 400;

/// Standard result card for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCard {
    /// Catalogue identifier (copyable)
    pub identifier: String,
    /// Title
    pub title: String,
    /// Native title or a fallback line
    pub snippet: String,
    /// Rounded match percentage
    pub match_percent: u32,
    /// Release date as `Mon YYYY`
    pub release_date: Option<String>,
    /// Up to two performer names
    pub names: Vec<String>,
    /// Thumbnail URL
    pub image: Option<String>,
    /// Item page link
    pub permalink: Option<String>,
}

impl VideoCard {
    /// Meta line: identifier, date and names joined by `›`
    #[must_use]
    pub fn meta_line(&self) -> String {
        let mut parts = vec![self.identifier.clone()];
        if let Some(date) = &self.release_date {
            parts.push(date.clone());
        }
        if !self.names.is_empty() {
            parts.push(self.names.join(", "));
        }
        parts.join(" › ")
    }
}

impl From<&Video> for VideoCard {
    fn from(video: &Video) -> Self {
        Self {
            identifier: video.identifier.clone(),
            title: video.title.clone(),
            snippet: video
                .native_title
                .clone()
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| MISSING_NATIVE_TITLE.to_string()),
            match_percent: video.match_percent(),
            release_date: video.display_date(),
            names: video
                .headline_names()
                .into_iter()
                .map(String::from)
                .collect(),
            image: video.image.clone(),
            permalink: video.permalink.clone(),
        }
    }
}

/// In-list header for a person result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityHeader {
    /// Display name
    pub name: String,
    /// Subtitle (native name and role)
    pub subtitle: String,
    /// Avatar image URL
    pub avatar: Option<String>,
}

impl From<&EntityBio> for EntityHeader {
    fn from(bio: &EntityBio) -> Self {
        let subtitle = match bio.native_name.as_deref().map(str::trim) {
            Some(native) if !native.is_empty() => format!("{native} • Actress"),
            _ => "Actress".to_string(),
        };
        Self {
            name: bio.name.clone(),
            subtitle,
            avatar: bio.avatar.clone(),
        }
    }
}

/// Knowledge panel heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum PanelHeading {
    /// Long-form overview (highest tier only)
    Overview(String),
    /// Generic heading without description
    About,
}

impl PanelHeading {
    /// Heading title
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Overview(_) => "Overview",
            Self::About => "About",
        }
    }
}

/// Sidebar profile for a person result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgePanel {
    /// Display name
    pub name: String,
    /// Main image URL
    pub avatar: Option<String>,
    /// Heading and optional description
    pub heading: PanelHeading,
    /// "Personal Info" group
    pub personal_facts: Vec<Fact>,
    /// "Physical Stats" group
    pub physical_facts: Vec<Fact>,
    /// "Profiles" links
    pub social_links: Vec<SocialLink>,
}

impl KnowledgePanel {
    /// Build the panel for a bio
    ///
    /// Returns `None` below the sidebar tier.
    #[must_use]
    pub fn for_bio(bio: &EntityBio) -> Option<Self> {
        if !bio.tier.shows_sidebar() {
            return None;
        }

        let description = bio
            .description
            .as_deref()
            .map(str::trim)
            .filter(|desc| !desc.is_empty() && bio.tier.shows_description());
        let heading = match description {
            Some(desc) => PanelHeading::Overview(truncate(desc, DESCRIPTION_LIMIT)),
            None => PanelHeading::About,
        };

        Some(Self {
            name: bio.name.clone(),
            avatar: bio.avatar.clone(),
            heading,
            personal_facts: bio.personal_facts.clone(),
            physical_facts: bio.physical_facts.clone(),
            social_links: bio.social_links.clone(),
        })
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Profile row of a recommendations block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorProfile {
    /// Display name
    pub name: String,
    /// Name in the original script
    pub native_name: Option<String>,
    /// Avatar image URL
    pub avatar: Option<String>,
}

impl CollaboratorProfile {
    /// Create a profile with only a name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_name: None,
            avatar: None,
        }
    }
}

/// Top items of a collaborator, appended to the sidebar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// Who the videos belong to
    pub profile: CollaboratorProfile,
    /// Recommended videos
    pub videos: Vec<Video>,
}

impl Recommendations {
    /// Check if there is nothing to show
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

/// Sidebar region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sidebar {
    /// Knowledge panel for the top person result
    pub panel: Option<KnowledgePanel>,
    /// Appended recommendations
    pub recommendations: Option<Recommendations>,
}

impl Sidebar {
    /// Check if the sidebar has any content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panel.is_none() && self.recommendations.is_none()
    }
}

/// One entry in the result list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListEntry {
    /// Standard video card
    Card(VideoCard),
    /// Person header
    EntityHeader(EntityHeader),
}

/// Placeholder content for the result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placeholder {
    /// Skeleton rows with a status line
    Skeleton {
        /// Status text
        status: String,
    },
    /// A text search completed with zero results
    NoResults {
        /// The query that found nothing
        query: String,
    },
    /// A similarity stream completed with zero matches
    NoSimilarItems,
}

impl Placeholder {
    /// Skeleton for a text search
    #[must_use]
    pub fn searching() -> Self {
        Self::Skeleton {
            status: "Initializing search protocol...".to_string(),
        }
    }

    /// Skeleton for a similarity stream
    #[must_use]
    pub fn connecting(identifier: &str) -> Self {
        Self::Skeleton {
            status: format!("Establishing socket for ID: {identifier}..."),
        }
    }

    /// User-facing text
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Skeleton { status } => status.clone(),
            Self::NoResults { query } => format!("No results found for {query}."),
            Self::NoSimilarItems => "No similar items found.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::DisplayTier;

    #[test]
    fn test_video_card() {
        let mut video = Video::new("ABC-123", "Title")
            .with_score(0.82)
            .with_release_date("2020-02-01")
            .with_actresses(["Aoi", "Mei", "Rin"]);
        video.native_title = Some(" ".to_string());

        let card = VideoCard::from(&video);
        assert_eq!(card.match_percent, 82);
        assert_eq!(card.snippet, MISSING_NATIVE_TITLE);
        assert_eq!(card.names, vec!["Aoi", "Mei"]);
        assert_eq!(card.meta_line(), "ABC-123 › Feb 2020 › Aoi, Mei");
    }

    #[test]
    fn test_entity_header_subtitle() {
        let mut bio = EntityBio::new("Aoi", DisplayTier::new(1));
        assert_eq!(EntityHeader::from(&bio).subtitle, "Actress");

        bio.native_name = Some("葵".to_string());
        assert_eq!(EntityHeader::from(&bio).subtitle, "葵 • Actress");
    }

    #[test]
    fn test_knowledge_panel_requires_tier_two() {
        let bio = EntityBio::new("Aoi", DisplayTier::new(1));
        assert!(KnowledgePanel::for_bio(&bio).is_none());
    }

    #[test]
    fn test_description_only_at_tier_three() {
        let mut bio = EntityBio::new("Aoi", DisplayTier::new(2));
        bio.description = Some("A long career.".to_string());
        let panel = KnowledgePanel::for_bio(&bio).unwrap();
        assert_eq!(panel.heading, PanelHeading::About);

        bio.tier = DisplayTier::new(3);
        let panel = KnowledgePanel::for_bio(&bio).unwrap();
        assert_eq!(panel.heading, PanelHeading::Overview("A long career.".to_string()));
        assert_eq!(panel.heading.title(), "Overview");
    }

    #[test]
    fn test_description_truncated() {
        let mut bio = EntityBio::new("Aoi", DisplayTier::new(3));
        bio.description = Some("あ".repeat(450));
        let panel = KnowledgePanel::for_bio(&bio).unwrap();
        match panel.heading {
            PanelHeading::Overview(text) => {
                assert!(text.ends_with("..."));
                assert_eq!(text.chars().count(), DESCRIPTION_LIMIT + 3);
            }
            PanelHeading::About => panic!("expected overview"),
        }
    }

    #[test]
    fn test_placeholder_messages() {
        assert_eq!(
            Placeholder::connecting("ABC-123").message(),
            "Establishing socket for ID: ABC-123..."
        );
        assert_eq!(
            Placeholder::NoResults {
                query: "x".to_string()
            }
            .message(),
            "No results found for x."
        );
        assert_ne!(
            Placeholder::NoSimilarItems.message(),
            Placeholder::searching().message()
        );
    }
}
