//! Backend wire format
//!
//! Decodes REST responses and similarity-stream messages into core result
//! items. Backend rows are loosely typed: field names come in two
//! spellings and bios arrive as flat maps of optional facts.

use kensaku_core::{
    CollaboratorProfile, DisplayTier, EntityBio, Fact, Recommendations, ResultItem, SocialLink,
    SourceMeta, Video,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};

/// Response of `/api/search` and `/api/similar`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Search mode label
    #[serde(default)]
    pub mode: String,
    /// Result rows
    #[serde(default)]
    pub results: Vec<Hit>,
    /// Anchor item (similarity snapshots only)
    #[serde(default)]
    pub source: Option<RawSource>,
}

/// One result row
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    /// Row payload
    pub data: Value,
    /// Semantic score
    #[serde(default)]
    pub sem_score: Option<f64>,
    /// Lexical or fused score
    #[serde(default)]
    pub score: Option<f64>,
    /// Bio marker
    #[serde(default)]
    pub is_bio: Option<bool>,
}

impl Hit {
    /// Decode into a result item
    pub fn into_item(self) -> Result<ResultItem> {
        let score = self.sem_score.or(self.score);
        item_from_value(&self.data, score, self.is_bio.unwrap_or(false))
    }
}

/// Anchor item metadata
#[derive(Debug, Clone, Deserialize)]
pub struct RawSource {
    /// Catalogue identifier
    #[serde(alias = "dvdId")]
    pub dvdid: String,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Cover image
    #[serde(default)]
    pub image: Option<String>,
    /// Native title
    #[serde(default, alias = "jpTitle")]
    pub jptitle: Option<String>,
}

impl From<RawSource> for SourceMeta {
    fn from(raw: RawSource) -> Self {
        Self {
            identifier: raw.dvdid,
            title: raw.title,
            image: usable_image(raw.image),
            native_title: non_blank(raw.jptitle),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Names {
    Joined(String),
    List(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawVideo {
    #[serde(alias = "dvdId")]
    dvdid: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "jpTitle")]
    jptitle: Option<String>,
    #[serde(default, alias = "releaseDate")]
    releasedate: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    actress_names: Option<Names>,
    #[serde(default)]
    generated_url: Option<String>,
    #[serde(default)]
    sem_score: Option<f64>,
}

impl RawVideo {
    fn into_video(self, score: Option<f64>) -> Video {
        let actress_names = match self.actress_names {
            Some(Names::Joined(raw)) => Video::parse_names(&raw),
            Some(Names::List(names)) => names
                .into_iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            None => Vec::new(),
        };
        Video {
            title: self.title.unwrap_or_else(|| self.dvdid.clone()),
            identifier: self.dvdid,
            native_title: non_blank(self.jptitle),
            release_date: non_blank(self.releasedate),
            image: usable_image(self.image),
            score: score.or(self.sem_score).unwrap_or(0.0),
            actress_names,
            permalink: non_blank(self.generated_url),
        }
    }
}

/// Message from the similarity channel
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Anchor item
    Source {
        /// Anchor metadata
        data: RawSource,
    },
    /// One similar item
    Match {
        /// Row payload, score included
        data: Value,
    },
    /// End of stream
    Done {
        /// Number of matches sent
        #[serde(default)]
        count: usize,
    },
    /// The server gave up
    Error {
        /// Reason, shown verbatim
        #[serde(default)]
        message: String,
    },
}

/// Configuration message opening a similarity stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRequest {
    /// Anchor identifier
    pub dvd_id: String,
    /// Maximum number of matches
    pub top_k: u32,
    /// Minimum score
    pub threshold: f64,
}

/// Response of `/api/actress_top_videos`
#[derive(Debug, Clone, Deserialize)]
pub struct TopVideosResponse {
    /// Collaborator profile
    #[serde(default)]
    pub profile: Option<RawProfile>,
    /// Their top videos
    #[serde(default)]
    pub videos: Vec<Value>,
}

/// Collaborator profile row
#[derive(Debug, Clone, Deserialize)]
pub struct RawProfile {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Native name
    #[serde(default, rename = "jpName")]
    pub jp_name: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub avatar: Option<String>,
}

impl TopVideosResponse {
    /// Build recommendations, falling back to the requested name
    #[must_use]
    pub fn into_recommendations(self, requested: &str) -> Recommendations {
        let profile = match self.profile {
            Some(raw) => CollaboratorProfile {
                name: non_blank(raw.name).unwrap_or_else(|| requested.to_string()),
                native_name: non_blank(raw.jp_name),
                avatar: usable_image(raw.avatar),
            },
            None => CollaboratorProfile::new(requested),
        };
        let videos = self
            .videos
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<RawVideo>(row) {
                Ok(raw) => Some(raw.into_video(None)),
                Err(err) => {
                    warn!(error = %err, "Skipping undecodable recommendation row");
                    None
                }
            })
            .collect();
        Recommendations { profile, videos }
    }
}

/// FastAPI-style error body
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Error detail (string or validation list)
    pub detail: Value,
}

impl ErrorBody {
    /// Human-readable detail
    #[must_use]
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Decode a backend row into a result item
///
/// Rows flagged `is_bio` (on the hit or the row) or typed `bio` become
/// entity bios; everything else is a video.
pub fn item_from_value(data: &Value, score: Option<f64>, is_bio: bool) -> Result<ResultItem> {
    let map = data
        .as_object()
        .ok_or_else(|| Error::protocol("result row is not an object"))?;

    let flagged = is_bio
        || map.get("is_bio").and_then(Value::as_bool).unwrap_or(false)
        || map.get("type").and_then(Value::as_str) == Some("bio");
    if flagged {
        return Ok(ResultItem::EntityBio(bio_from_map(map)?));
    }

    let raw: RawVideo = serde_json::from_value(data.clone())?;
    Ok(ResultItem::Video(raw.into_video(score)))
}

const PERSONAL_FACTS: &[(&str, &str)] = &[
    ("Born", "birthday"),
    ("Sign", "sign"),
    ("Birthplace", "birthplace"),
    ("Nationality", "nationality"),
    ("Ethnicity", "ethnicity"),
    ("Debut", "debut"),
    ("Years Active", "yearsActive"),
    ("Aliases", "alsoKnownAs"),
];

fn bio_from_map(map: &Map<String, Value>) -> Result<EntityBio> {
    let name = text(map, "name").ok_or_else(|| Error::protocol("bio row without a name"))?;
    let tier = DisplayTier::from_raw(number(map, "tier").unwrap_or(0.0));

    let personal_facts = PERSONAL_FACTS
        .iter()
        .filter_map(|(label, key)| Fact::new(*label, text(map, key)?))
        .collect();

    let mut social_links = Vec::new();
    if let Some(handle) = text(map, "twitter") {
        social_links.push(SocialLink::x(&handle));
    }
    social_links.push(SocialLink::web_search(&name));

    Ok(EntityBio {
        native_name: text(map, "jpName"),
        tier,
        avatar: usable_image(text(map, "avatar")),
        personal_facts,
        physical_facts: physical_facts(map),
        social_links,
        description: text(map, "wiki_desc"),
        name,
    })
}

fn physical_facts(map: &Map<String, Value>) -> Vec<Fact> {
    let mut facts = Vec::new();
    let mut push = |label: &str, value: Option<String>| {
        if let Some(fact) = value.and_then(|value| Fact::new(label, value)) {
            facts.push(fact);
        }
    };

    push("Height", text(map, "height").map(|h| format!("{h} cm")));
    // "type" doubles as the bio marker
    push("Body Type", text(map, "type").filter(|t| t != "bio"));
    push("Measurements", measurements(map));
    push("Breast Type", text(map, "boobs"));
    push("Blood Type", text(map, "blood_type"));
    push("Shoe Size", text(map, "shoe_size"));
    push("Eye Color", text(map, "eyeColor"));
    match text(map, "hair_color") {
        Some(color) => push("Hair Color", Some(color)),
        None => push("Hair", text(map, "hair")),
    }
    push("Hair Length", text(map, "hair_length"));
    push("Underarm", text(map, "underarmHair"));
    push("Pubic Hair", text(map, "pubicHair"));
    facts
}

fn measurements(map: &Map<String, Value>) -> Option<String> {
    let mut out = String::new();
    if let Some(bust) = text(map, "bust") {
        out.push_str(&format!("B{bust}"));
    }
    if let Some(cup) = text(map, "cup") {
        out.push_str(&format!("({cup})"));
    }
    if let Some(waist) = text(map, "waist") {
        out.push_str(&format!(" W{waist}"));
    }
    if let Some(hip) = text(map, "hip") {
        out.push_str(&format!(" H{hip}"));
    }
    let out = out.trim().to_string();
    (!out.is_empty()).then_some(out)
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => non_blank(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values
                .iter()
                .filter_map(|value| match value {
                    Value::String(s) => non_blank(Some(s.clone())),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("\n"))
        }
        _ => None,
    }
}

fn number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn usable_image(value: Option<String>) -> Option<String> {
    non_blank(value).filter(|v| v != "N/A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_video_row_with_aliases() {
        let row = json!({
            "dvdId": "ABC-123",
            "title": "Title",
            "jpTitle": "タイトル",
            "releaseDate": "2022-03-04",
            "image": "N/A",
            "actress_names": "Aoi, Mei",
            "generated_url": "https://example.com/ABC-123"
        });
        let item = item_from_value(&row, Some(0.81), false).unwrap();
        let video = item.as_video().unwrap();
        assert_eq!(video.identifier, "ABC-123");
        assert_eq!(video.native_title.as_deref(), Some("タイトル"));
        assert!(video.image.is_none());
        assert_eq!(video.actress_names, vec!["Aoi", "Mei"]);
        assert_eq!(video.match_percent(), 81);
    }

    #[test]
    fn test_stream_match_carries_its_score() {
        let row = json!({"dvdid": "X-1", "title": "t", "sem_score": 0.7});
        let item = item_from_value(&row, None, false).unwrap();
        assert_eq!(item.as_video().unwrap().match_percent(), 70);
    }

    #[test]
    fn test_bio_row() {
        let row = json!({
            "type": "bio",
            "name": "Aoi",
            "jpName": "葵",
            "tier": 2.5,
            "birthday": "1990-01-01",
            "sign": "?",
            "alsoKnownAs": "Ao\nAo-chan",
            "height": 160,
            "bust": 85, "cup": "D", "waist": 58, "hip": 86,
            "hair_color": "Black",
            "hair": "ignored",
            "twitter": "aoi_official"
        });
        let item = item_from_value(&row, None, false).unwrap();
        let bio = item.as_bio().unwrap();
        assert_eq!(bio.tier.value(), 2);
        assert_eq!(bio.native_name.as_deref(), Some("葵"));

        let personal: Vec<_> = bio.personal_facts.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(personal, vec!["Born", "Aliases"]);
        assert_eq!(bio.personal_facts[1].value, "Ao, Ao-chan");

        let physical: Vec<_> = bio
            .physical_facts
            .iter()
            .map(|f| (f.label.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            physical,
            vec![
                ("Height", "160 cm"),
                ("Measurements", "B85(D) W58 H86"),
                ("Hair Color", "Black"),
            ]
        );
        assert_eq!(bio.social_links.len(), 2);
        assert_eq!(bio.social_links[0].label, "X");
    }

    #[test]
    fn test_hit_level_bio_flag() {
        let hit: Hit = serde_json::from_value(json!({
            "data": {"name": "Mei", "tier": 1},
            "sem_score": 1.0,
            "is_bio": true
        }))
        .unwrap();
        assert!(hit.into_item().unwrap().is_bio());
    }

    #[test]
    fn test_bio_without_name_is_rejected() {
        let row = json!({"is_bio": true, "tier": 3});
        assert!(item_from_value(&row, None, false).is_err());
    }

    #[test]
    fn test_stream_messages() {
        let msg: StreamMessage =
            serde_json::from_str(r#"{"type":"done","count":4}"#).unwrap();
        assert!(matches!(msg, StreamMessage::Done { count: 4 }));

        let msg: StreamMessage =
            serde_json::from_str(r#"{"type":"error","message":"Movie not found"}"#).unwrap();
        assert!(matches!(msg, StreamMessage::Error { message } if message == "Movie not found"));

        let msg: StreamMessage = serde_json::from_str(
            r#"{"type":"source","data":{"dvdid":"ABC-123","title":"Anchor","image":""}}"#,
        )
        .unwrap();
        match msg {
            StreamMessage::Source { data } => {
                let meta = SourceMeta::from(data);
                assert_eq!(meta.identifier, "ABC-123");
                assert!(meta.image.is_none());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_top_videos_fallback_profile() {
        let response: TopVideosResponse = serde_json::from_value(json!({
            "videos": [{"dvdid": "R-1", "title": "Rec"}, {"title": "no id"}]
        }))
        .unwrap();
        let recs = response.into_recommendations("Aoi");
        assert_eq!(recs.profile.name, "Aoi");
        assert_eq!(recs.videos.len(), 1);
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"Index not ready"}"#).unwrap();
        assert_eq!(body.message(), "Index not ready");
    }
}
