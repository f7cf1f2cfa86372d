//! Index rows: identity and cost of a record without its content

use tidemark_core::{IndexRow, Observation, PromptRecord, RecordKind, SessionRecord, TimelineItem};
use tidemark_telemetry::estimate_tokens;

const SESSION_GLYPH: &str = "🎯";
const PROMPT_GLYPH: &str = "💬";
const PROMPT_TITLE_CHARS: usize = 80;

/// Anything that can be listed in a search index
pub trait IndexEntry {
    fn index_row(&self) -> IndexRow;
}

impl IndexEntry for Observation {
    fn index_row(&self) -> IndexRow {
        let read_tokens = self.token_estimate();
        let work_tokens = usize::try_from(self.discovery_tokens)
            .ok()
            .filter(|&t| t > 0)
            .unwrap_or(read_tokens);
        IndexRow {
            kind: RecordKind::Observation,
            id: self.id,
            created_at_epoch: self.created_at_epoch,
            glyph: self.obs_type.glyph().to_string(),
            title: self.display_title().to_string(),
            read_tokens,
            work_tokens,
        }
    }
}

impl IndexEntry for SessionRecord {
    fn index_row(&self) -> IndexRow {
        let tokens = estimate_tokens(&self.content_text());
        IndexRow {
            kind: RecordKind::Session,
            id: self.id,
            created_at_epoch: self.created_at_epoch,
            glyph: SESSION_GLYPH.to_string(),
            title: self.display_title().to_string(),
            read_tokens: tokens,
            work_tokens: tokens,
        }
    }
}

impl IndexEntry for PromptRecord {
    fn index_row(&self) -> IndexRow {
        let tokens = estimate_tokens(&self.prompt_text);
        IndexRow {
            kind: RecordKind::Prompt,
            id: self.id,
            created_at_epoch: self.created_at_epoch,
            glyph: PROMPT_GLYPH.to_string(),
            title: prompt_title(&self.prompt_text),
            read_tokens: tokens,
            work_tokens: tokens,
        }
    }
}

impl IndexEntry for TimelineItem {
    fn index_row(&self) -> IndexRow {
        match self {
            TimelineItem::Session(s) => s.index_row(),
            TimelineItem::Prompt(p) => p.index_row(),
            TimelineItem::Observation(o) => o.index_row(),
        }
    }
}

fn prompt_title(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() <= PROMPT_TITLE_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(PROMPT_TITLE_CHARS).collect();
    format!("{}…", cut.trim_end())
}
