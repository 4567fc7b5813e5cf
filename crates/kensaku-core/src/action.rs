//! User actions
//!
//! Everything a user can do to the search UI, as one discriminated type.
//! Hosts translate clicks and key presses into these and hand them to
//! [`crate::app::SearchApp::dispatch`].

use url::Url;

/// A user action
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Submit the search box
    Submit(String),
    /// Stream items similar to a result
    FindSimilar {
        /// Identifier of the anchor item
        identifier: String,
        /// Its title
        title: String,
        /// Its cover image
        image: Option<String>,
    },
    /// Copy an identifier to the clipboard
    CopyId(String),
    /// Open the image viewer
    ViewImage {
        /// Image URL
        src: String,
        /// Caption
        caption: String,
    },
    /// Change the result limit
    SetLimit(u32),
    /// Change the score threshold
    SetThreshold(f64),
    /// Expand or collapse the options panel
    ToggleOptions,
    /// Leave similarity mode
    CloseSimilar,
    /// Back to the landing page
    Reset,
    /// History navigation (back/forward) landed on a URL
    Navigate(Url),
}

impl UiAction {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::FindSimilar { .. } => "find_similar",
            Self::CopyId(_) => "copy_id",
            Self::ViewImage { .. } => "view_image",
            Self::SetLimit(_) => "set_limit",
            Self::SetThreshold(_) => "set_threshold",
            Self::ToggleOptions => "toggle_options",
            Self::CloseSimilar => "close_similar",
            Self::Reset => "reset",
            Self::Navigate(_) => "navigate",
        }
    }
}
