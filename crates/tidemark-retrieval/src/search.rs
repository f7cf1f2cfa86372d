//! Index search across observations, sessions and prompts

use crate::index::IndexEntry;
use tidemark_core::{
    Error, IndexRow, ObservationType, OrderBy, ProjectScope, Result, RetrievalStore,
    SearchFilter, SearchType,
};
use tracing::debug;

/// One search call. `scope` is required; `None` is rejected.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free text; empty lists by filter only
    pub query: String,
    pub scope: Option<ProjectScope>,
    pub limit: usize,
    /// Restrict to one record kind; `None` merges all three
    pub search_type: Option<SearchType>,
    pub date_start: Option<i64>,
    pub date_end: Option<i64>,
    pub obs_types: Vec<ObservationType>,
    pub order: OrderBy,
}

impl SearchRequest {
    pub const DEFAULT_LIMIT: usize = 20;

    pub fn new(query: impl Into<String>, scope: ProjectScope) -> Self {
        Self {
            query: query.into(),
            scope: Some(scope),
            limit: Self::DEFAULT_LIMIT,
            search_type: None,
            date_start: None,
            date_end: None,
            obs_types: Vec::new(),
            order: OrderBy::DateDesc,
        }
    }

    fn validate(&self) -> Result<&ProjectScope> {
        let scope = self.scope.as_ref().ok_or_else(|| Error::missing("project"))?;
        if let ProjectScope::Project(name) = scope {
            if name.trim().is_empty() {
                return Err(Error::missing("project"));
            }
        }
        if self.limit == 0 {
            return Err(Error::invalid("limit", "must be at least 1"));
        }
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if start > end {
                return Err(Error::invalid("dateStart", "must not be after dateEnd"));
            }
        }
        if self.order == OrderBy::Relevance && self.query.trim().is_empty() {
            return Err(Error::invalid("orderBy", "relevance ordering needs a query"));
        }
        if !self.obs_types.is_empty()
            && matches!(
                self.search_type,
                Some(SearchType::Sessions) | Some(SearchType::Prompts)
            )
        {
            return Err(Error::invalid(
                "obs_type",
                "only applies to observation searches",
            ));
        }
        Ok(scope)
    }

    fn filter(&self, scope: &ProjectScope) -> SearchFilter {
        let query = self.query.trim();
        SearchFilter {
            query: (!query.is_empty()).then(|| query.to_string()),
            project: scope.as_filter().map(str::to_string),
            date_start: self.date_start,
            date_end: self.date_end,
            obs_types: self.obs_types.clone(),
            order: self.order,
            limit: self.limit,
        }
    }
}

/// Lightweight index of matching records, at most `limit` rows.
///
/// With no `search_type` all kinds are searched and merged by date; relevance
/// ordering then lists observations, sessions and prompts in that order, each
/// ranked on its own. Giving `obs_types` alone narrows the search to
/// observations.
pub fn search<S: RetrievalStore + ?Sized>(
    store: &S,
    request: &SearchRequest,
) -> Result<Vec<IndexRow>> {
    let scope = request.validate()?;
    let filter = request.filter(scope);

    let search_type = request
        .search_type
        .or_else(|| (!request.obs_types.is_empty()).then_some(SearchType::Observations));

    let rows = match search_type {
        Some(SearchType::Observations) => rows_of(store.search_observations(&filter)?),
        Some(SearchType::Sessions) => rows_of(store.search_sessions(&filter)?),
        Some(SearchType::Prompts) => rows_of(store.search_prompts(&filter)?),
        None => {
            let mut rows = rows_of(store.search_observations(&filter)?);
            rows.extend(rows_of(store.search_sessions(&filter)?));
            rows.extend(rows_of(store.search_prompts(&filter)?));
            merge_order(&mut rows, request.order);
            rows.truncate(request.limit);
            rows
        }
    };

    debug!(
        query = %request.query,
        project = scope.as_filter().unwrap_or("*"),
        kind = ?search_type,
        results = rows.len(),
        "search resolved"
    );
    Ok(rows)
}

fn rows_of<T: IndexEntry>(records: Vec<T>) -> Vec<IndexRow> {
    records.iter().map(IndexEntry::index_row).collect()
}

fn merge_order(rows: &mut [IndexRow], order: OrderBy) {
    let key = |row: &IndexRow| (row.created_at_epoch, row.kind, row.id);
    match order {
        OrderBy::DateDesc => rows.sort_by(|a, b| key(b).cmp(&key(a))),
        OrderBy::DateAsc => rows.sort_by_key(key),
        // Per-kind rank order is already in place
        OrderBy::Relevance => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: tidemark_core::RecordKind, id: i64, at: i64) -> IndexRow {
        IndexRow {
            kind,
            id,
            created_at_epoch: at,
            glyph: String::new(),
            title: String::new(),
            read_tokens: 0,
            work_tokens: 0,
        }
    }

    #[test]
    fn test_merge_order_breaks_ties_by_kind() {
        use tidemark_core::RecordKind::*;
        let mut rows = vec![row(Observation, 1, 10), row(Session, 9, 10), row(Prompt, 2, 5)];

        merge_order(&mut rows, OrderBy::DateAsc);
        let order: Vec<(i64, i64)> = rows.iter().map(|r| (r.created_at_epoch, r.id)).collect();
        assert_eq!(order, vec![(5, 2), (10, 9), (10, 1)]);

        merge_order(&mut rows, OrderBy::DateDesc);
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 9, 2]);
    }

    #[test]
    fn test_validation() {
        let ok = SearchRequest::new("pool", ProjectScope::Project("api".into()));
        assert!(ok.validate().is_ok());

        let no_project = SearchRequest {
            scope: None,
            ..ok.clone()
        };
        assert!(matches!(
            no_project.validate(),
            Err(Error::MissingParameter(name)) if name == "project"
        ));

        let blank = SearchRequest::new("pool", ProjectScope::Project("  ".into()));
        assert!(blank.validate().is_err());

        let zero = SearchRequest { limit: 0, ..ok.clone() };
        assert!(zero.validate().unwrap_err().is_validation());

        let inverted = SearchRequest {
            date_start: Some(10),
            date_end: Some(5),
            ..ok.clone()
        };
        assert!(inverted.validate().is_err());

        let relevance_without_query = SearchRequest {
            order: OrderBy::Relevance,
            ..SearchRequest::new("", ProjectScope::All)
        };
        assert!(relevance_without_query.validate().is_err());

        let obs_type_on_prompts = SearchRequest {
            search_type: Some(SearchType::Prompts),
            obs_types: vec![ObservationType::Bugfix],
            ..ok
        };
        assert!(obs_type_on_prompts.validate().is_err());
    }

    #[test]
    fn test_empty_query_is_filter_only() {
        let request = SearchRequest::new("   ", ProjectScope::All);
        let filter = request.filter(&ProjectScope::All);
        assert_eq!(filter.query, None);
        assert_eq!(filter.project, None);
        assert_eq!(filter.limit, 20);
    }
}
