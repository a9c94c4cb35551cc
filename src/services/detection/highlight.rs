// Highlight Renderer
// Merges scored sections back into the original text as inline annotations.
//
// Two passes: sections are first turned into an ordered list of fragments
// (plain text or marked span), then a single render pass escapes every piece of
// text and emits the only markup this module knows about.
//
// Sections from the section scorer never overlap. Sections from anywhere else
// may: when two overlap, the one starting later is kept and the other is
// skipped with a warning, in every build profile.

use tracing::warn;

use crate::models::{Section, SuspicionLevel};

/// The only element the renderer emits.
pub const ALLOWED_TAG: &str = "span";
/// The only attributes the renderer emits on [`ALLOWED_TAG`].
pub const ALLOWED_ATTRIBUTES: [&str; 2] = ["class", "title"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment<'a> {
    Plain(&'a str),
    Marked {
        text: &'a str,
        level: SuspicionLevel,
        reasoning: &'a str,
    },
}

pub fn level_class(level: SuspicionLevel) -> &'static str {
    match level {
        SuspicionLevel::High => "bg-red-200 px-1 rounded",
        SuspicionLevel::Medium => "bg-orange-200 px-1 rounded",
        SuspicionLevel::Low => "bg-yellow-200 px-1 rounded",
    }
}

/// Escape text for both element content and quoted attribute values
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn section_matches(text: &str, section: &Section) -> bool {
    section.start_position < section.end_position
        && text.get(section.start_position..section.end_position) == Some(section.text.as_str())
}

/// Cut `text` into plain and marked fragments, in reading order.
///
/// Sections are walked by descending `start_position` so that every offset still
/// to be processed lies to the left of the cut already made.
pub fn plan_fragments<'a>(text: &'a str, sections: &'a [Section]) -> Vec<Fragment<'a>> {
    let mut ordered: Vec<&Section> = Vec::with_capacity(sections.len());
    for section in sections {
        if section_matches(text, section) {
            ordered.push(section);
        } else {
            warn!(
                start = section.start_position,
                end = section.end_position,
                "[HIGHLIGHT] Section does not match the text, skipped"
            );
        }
    }
    ordered.sort_by(|a, b| b.start_position.cmp(&a.start_position));

    let mut fragments = Vec::with_capacity(ordered.len() * 2 + 1);
    let mut tail_end = text.len();

    for section in ordered {
        if section.end_position > tail_end {
            warn!(
                start = section.start_position,
                end = section.end_position,
                "[HIGHLIGHT] Overlapping section skipped"
            );
            continue;
        }

        if section.end_position < tail_end {
            fragments.push(Fragment::Plain(&text[section.end_position..tail_end]));
        }
        fragments.push(Fragment::Marked {
            text: &text[section.start_position..section.end_position],
            level: section.suspicion_level,
            reasoning: &section.reasoning,
        });
        tail_end = section.start_position;
    }

    if tail_end > 0 {
        fragments.push(Fragment::Plain(&text[..tail_end]));
    }

    fragments.reverse();
    fragments
}

pub fn render_fragments(fragments: &[Fragment<'_>]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Plain(text) => out.push_str(&html_escape(text)),
            Fragment::Marked {
                text,
                level,
                reasoning,
            } => {
                out.push('<');
                out.push_str(ALLOWED_TAG);
                out.push_str(" class=\"");
                out.push_str(level_class(*level));
                out.push_str("\" title=\"");
                out.push_str(&html_escape(reasoning));
                out.push_str("\">");
                out.push_str(&html_escape(text));
                out.push_str("</");
                out.push_str(ALLOWED_TAG);
                out.push('>');
            }
        }
    }
    out
}

/// Escaped HTML of `text` with every valid section wrapped in a span
pub fn render_highlighted(text: &str, sections: &[Section]) -> String {
    render_fragments(&plan_fragments(text, sections))
}
