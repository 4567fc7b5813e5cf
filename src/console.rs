//! Console view
//!
//! Renders instructions as plain text lines for terminal use.

use std::io::Write;

use kensaku_core::{
    KnowledgePanel, ListEntry, PanelHeading, Recommendations, RenderInstruction, ViewPort,
};

/// Text renderer writing to any `Write`
pub struct ConsoleView<W: Write> {
    out: W,
    verbose: bool,
}

impl ConsoleView<std::io::Stdout> {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(std::io::stdout(), verbose)
    }
}

impl<W: Write> ConsoleView<W> {
    /// Create a view; `verbose` also prints transient loading state
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        // Terminal output is best effort
        let _ = writeln!(self.out, "{}", text.as_ref());
    }

    fn entry(&mut self, entry: &ListEntry) {
        match entry {
            ListEntry::Card(card) => {
                self.line(format!("[{:>3}%] {}", card.match_percent, card.title));
                self.line(format!("       {}", card.snippet));
                self.line(format!("       {}", card.meta_line()));
            }
            ListEntry::EntityHeader(header) => {
                self.line(format!("== {} ({})", header.name, header.subtitle));
            }
        }
    }

    fn panel(&mut self, panel: &KnowledgePanel) {
        self.line(format!("-- {}", panel.name));
        if let PanelHeading::Overview(description) = &panel.heading {
            self.line(format!("   {}: {description}", panel.heading.title()));
        }
        for fact in panel.personal_facts.iter().chain(&panel.physical_facts) {
            self.line(format!("   {}: {}", fact.label, fact.value));
        }
        for link in &panel.social_links {
            self.line(format!("   {} <{}>", link.label, link.url));
        }
    }

    fn recommendations(&mut self, recs: &Recommendations) {
        self.line(format!("-- More from {}", recs.profile.name));
        for video in &recs.videos {
            self.line(format!("   {} {}", video.identifier, video.title));
        }
    }
}

impl<W: Write> ViewPort for ConsoleView<W> {
    fn apply(&mut self, instruction: &RenderInstruction) {
        match instruction {
            RenderInstruction::SetMeta(Some(meta)) => self.line(meta),
            RenderInstruction::ShowPlaceholder(placeholder) => self.line(placeholder.message()),
            RenderInstruction::ReplaceList(entries) => {
                for entry in entries {
                    self.entry(entry);
                }
            }
            RenderInstruction::AppendItem(entry) => self.entry(entry),
            RenderInstruction::ShowSidebar(panel) => self.panel(panel),
            RenderInstruction::AppendSidebar(recs) => self.recommendations(recs),
            RenderInstruction::ShowSimilarHeader(source) => {
                self.line(format!("Similar to {} {}", source.identifier, source.title));
            }
            RenderInstruction::ShowError(message) => self.line(format!("Error: {message}")),
            RenderInstruction::OpenImage { src, caption } => {
                self.line(format!("{caption}: {src}"));
            }
            other if self.verbose => self.line(format!("{other:?}")),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kensaku_core::{Placeholder, Video, VideoCard};

    fn render(instructions: &[RenderInstruction]) -> String {
        let mut view = ConsoleView::new(Vec::new(), false);
        for instruction in instructions {
            view.apply(instruction);
        }
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_renders_cards() {
        let video = Video::new("ABC-123", "Title")
            .with_score(0.9)
            .with_release_date("2023-05-12");
        let out = render(&[
            RenderInstruction::SetMeta(Some("About 1 results • Mode: Hybrid".to_string())),
            RenderInstruction::ReplaceList(vec![ListEntry::Card(VideoCard::from(&video))]),
        ]);
        assert!(out.contains("About 1 results"));
        assert!(out.contains("[ 90%] Title"));
        assert!(out.contains("ABC-123 › May 2023"));
    }

    #[test]
    fn test_quiet_skips_transient_state() {
        let out = render(&[
            RenderInstruction::SetLoading(true),
            RenderInstruction::ShowPlaceholder(Placeholder::NoSimilarItems),
        ]);
        assert_eq!(out, "No similar items found.\n");
    }
}
