//! Chronological window around an anchor in the merged record stream

use crate::dates::{parse_instant, DateBound};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tidemark_core::{
    Direction, Error, OrderBy, RecordKind, Result, RetrievalStore, SearchFilter, TimelineItem,
    TimelineKey,
};
use tracing::debug;

/// Where a timeline is centered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Observation(i64),
    Session(i64),
    Prompt(i64),
    /// Epoch ms; resolves to the latest item at or before it
    Timestamp(i64),
}

impl FromStr for Anchor {
    type Err = Error;

    /// `123` is an observation, `S12` a session, `P4` a prompt; anything else
    /// must be an RFC 3339 or `YYYY-MM-DD` instant.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(Anchor::Observation(id));
        }
        let prefixed = |prefix: char| {
            s.strip_prefix(prefix)
                .or_else(|| s.strip_prefix(prefix.to_ascii_lowercase()))
                .and_then(|rest| rest.parse::<i64>().ok())
        };
        if let Some(id) = prefixed('S') {
            return Ok(Anchor::Session(id));
        }
        if let Some(id) = prefixed('P') {
            return Ok(Anchor::Prompt(id));
        }
        parse_instant(s, DateBound::Start)
            .map(Anchor::Timestamp)
            .ok_or_else(|| {
                Error::invalid(
                    "anchor",
                    format!("expected an id, S<id>, P<id> or a timestamp, got {:?}", s),
                )
            })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Observation(id) => write!(f, "{}", id),
            Anchor::Session(id) => write!(f, "S{}", id),
            Anchor::Prompt(id) => write!(f, "P{}", id),
            Anchor::Timestamp(ms) => write!(f, "@{}", ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimelineRequest {
    pub project: Option<String>,
    pub anchor: Option<Anchor>,
    /// Alternative to `anchor`: center on the most recent matching observation
    pub query: Option<String>,
    pub depth_before: usize,
    pub depth_after: usize,
}

impl TimelineRequest {
    pub const DEFAULT_DEPTH: usize = 5;

    pub fn at(project: impl Into<String>, anchor: Anchor) -> Self {
        Self {
            project: Some(project.into()),
            anchor: Some(anchor),
            query: None,
            depth_before: Self::DEFAULT_DEPTH,
            depth_after: Self::DEFAULT_DEPTH,
        }
    }

    pub fn around_query(project: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            anchor: None,
            query: Some(query.into()),
            ..Self::at(project, Anchor::Observation(0))
        }
    }

    fn validate(&self) -> Result<&str> {
        let project = self
            .project
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::missing("project"))?;
        let query = self.query.as_deref().filter(|q| !q.trim().is_empty());
        match (self.anchor, query) {
            (None, None) => Err(Error::missing("anchor")),
            (Some(_), Some(_)) => Err(Error::invalid(
                "anchor",
                "give either an anchor or a query, not both",
            )),
            _ => Ok(project),
        }
    }
}

/// Items around the anchor in chronological order
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    pub anchor: TimelineKey,
    /// Position of the anchor within `items`
    pub anchor_index: usize,
    pub items: Vec<TimelineItem>,
}

impl Timeline {
    pub fn before(&self) -> &[TimelineItem] {
        &self.items[..self.anchor_index]
    }

    pub fn after(&self) -> &[TimelineItem] {
        &self.items[self.anchor_index + 1..]
    }
}

/// Window of `depth_before + 1 + depth_after` items centered on the anchor.
///
/// A side with fewer items than requested is cut short; the other side is
/// never extended to make up the difference.
pub fn timeline<S: RetrievalStore + ?Sized>(
    store: &S,
    request: &TimelineRequest,
) -> Result<Timeline> {
    let project = request.validate()?;
    let anchor = resolve_anchor(store, project, request)?;
    let key = anchor.key();

    let before = store.neighbors(project, key, Direction::Before, request.depth_before)?;
    let after = store.neighbors(project, key, Direction::After, request.depth_after)?;

    debug!(
        project,
        anchor = ?key,
        before = before.len(),
        after = after.len(),
        "timeline window"
    );

    let anchor_index = before.len();
    let mut items = before;
    items.push(anchor);
    items.extend(after);
    Ok(Timeline {
        anchor: key,
        anchor_index,
        items,
    })
}

fn resolve_anchor<S: RetrievalStore + ?Sized>(
    store: &S,
    project: &str,
    request: &TimelineRequest,
) -> Result<TimelineItem> {
    let Some(anchor) = request.anchor else {
        let query = request.query.as_deref().unwrap_or_default().trim();
        return anchor_for_query(store, project, query);
    };

    let (kind, id) = match anchor {
        Anchor::Observation(id) => (RecordKind::Observation, id),
        Anchor::Session(id) => (RecordKind::Session, id),
        Anchor::Prompt(id) => (RecordKind::Prompt, id),
        Anchor::Timestamp(ms) => return anchor_at_time(store, project, ms, anchor),
    };
    store
        .find_item(kind, id)?
        .filter(|item| item.project() == project)
        .ok_or_else(|| Error::AnchorNotFound(anchor.to_string()))
}

fn anchor_for_query<S: RetrievalStore + ?Sized>(
    store: &S,
    project: &str,
    query: &str,
) -> Result<TimelineItem> {
    let filter = SearchFilter {
        query: Some(query.to_string()),
        project: Some(project.to_string()),
        order: OrderBy::DateDesc,
        limit: 1,
        ..Default::default()
    };
    let hit = store.search_observations(&filter)?.into_iter().next();
    debug!(query, hit = ?hit.as_ref().map(|o| o.id), "timeline query anchor");
    hit.map(TimelineItem::Observation)
        .ok_or_else(|| Error::NoMatches(query.to_string()))
}

fn anchor_at_time<S: RetrievalStore + ?Sized>(
    store: &S,
    project: &str,
    epoch_ms: i64,
    anchor: Anchor,
) -> Result<TimelineItem> {
    // Bounds that sort after and before every item stamped `epoch_ms`
    let upper = TimelineKey::new(epoch_ms, RecordKind::Observation, i64::MAX);
    let lower = TimelineKey::new(epoch_ms, RecordKind::Session, i64::MIN);

    if let Some(item) = store.neighbors(project, upper, Direction::Before, 1)?.pop() {
        return Ok(item);
    }
    store
        .neighbors(project, lower, Direction::After, 1)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::AnchorNotFound(anchor.to_string()))
}
