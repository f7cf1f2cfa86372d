use crate::fts::fts_query;
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use tidemark_core::{
    Direction, NewObservation, NewPrompt, NewSession, Observation, ObservationStore,
    ObservationType, OrderBy, PromptRecord, RecordKind, RetrievalStore, SearchFilter,
    SessionRecord, TimelineItem, TimelineKey,
};
use tracing::debug;

const OBSERVATION_COLUMNS: &str = "observations.id, observations.project, observations.type, \
     observations.title, observations.subtitle, observations.narrative, observations.facts, \
     observations.concepts, observations.discovery_tokens, observations.created_at_epoch";
const SESSION_COLUMNS: &str = "sessions.id, sessions.project, sessions.request, \
     sessions.summary, sessions.created_at_epoch";
const PROMPT_COLUMNS: &str =
    "prompts.id, prompts.project, prompts.prompt_text, prompts.created_at_epoch";

/// Ids bound per statement, well under SQLite's variable limit
const ID_CHUNK: usize = 500;

/// Per-kind table layout used to build queries
struct Table {
    name: &'static str,
    fts: &'static str,
    columns: &'static str,
    kind: RecordKind,
}

const OBSERVATIONS: Table = Table {
    name: "observations",
    fts: "observations_fts",
    columns: OBSERVATION_COLUMNS,
    kind: RecordKind::Observation,
};
const SESSIONS: Table = Table {
    name: "sessions",
    fts: "sessions_fts",
    columns: SESSION_COLUMNS,
    kind: RecordKind::Session,
};
const PROMPTS: Table = Table {
    name: "prompts",
    fts: "prompts_fts",
    columns: PROMPT_COLUMNS,
    kind: RecordKind::Prompt,
};

/// Row counts per record kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub observations: usize,
    pub sessions: usize,
    pub prompts: usize,
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    // AUTOINCREMENT keeps deleted ids from being reused, so a stale id never
    // resolves to a newer record.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project TEXT NOT NULL,
                type TEXT NOT NULL,
                title TEXT,
                subtitle TEXT,
                narrative TEXT,
                facts TEXT,
                concepts TEXT,
                discovery_tokens INTEGER NOT NULL DEFAULT 0,
                created_at_epoch INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_observations_project_time
                ON observations(project, created_at_epoch);
            CREATE INDEX IF NOT EXISTS idx_observations_time ON observations(created_at_epoch);

            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project TEXT NOT NULL,
                request TEXT,
                summary TEXT,
                created_at_epoch INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_project_time
                ON sessions(project, created_at_epoch);

            CREATE TABLE IF NOT EXISTS prompts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project TEXT NOT NULL,
                prompt_text TEXT NOT NULL,
                created_at_epoch INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_prompts_project_time
                ON prompts(project, created_at_epoch);

            CREATE VIRTUAL TABLE IF NOT EXISTS observations_fts USING fts5(
                title, subtitle, narrative, facts, concepts,
                content=observations, content_rowid=id
            );
            CREATE TRIGGER IF NOT EXISTS observations_ai AFTER INSERT ON observations BEGIN
                INSERT INTO observations_fts(rowid, title, subtitle, narrative, facts, concepts)
                VALUES (new.id, new.title, new.subtitle, new.narrative, new.facts, new.concepts);
            END;
            CREATE TRIGGER IF NOT EXISTS observations_ad AFTER DELETE ON observations BEGIN
                INSERT INTO observations_fts(observations_fts, rowid, title, subtitle, narrative, facts, concepts)
                VALUES ('delete', old.id, old.title, old.subtitle, old.narrative, old.facts, old.concepts);
            END;

            CREATE VIRTUAL TABLE IF NOT EXISTS sessions_fts USING fts5(
                request, summary,
                content=sessions, content_rowid=id
            );
            CREATE TRIGGER IF NOT EXISTS sessions_ai AFTER INSERT ON sessions BEGIN
                INSERT INTO sessions_fts(rowid, request, summary)
                VALUES (new.id, new.request, new.summary);
            END;
            CREATE TRIGGER IF NOT EXISTS sessions_ad AFTER DELETE ON sessions BEGIN
                INSERT INTO sessions_fts(sessions_fts, rowid, request, summary)
                VALUES ('delete', old.id, old.request, old.summary);
            END;

            CREATE VIRTUAL TABLE IF NOT EXISTS prompts_fts USING fts5(
                prompt_text,
                content=prompts, content_rowid=id
            );
            CREATE TRIGGER IF NOT EXISTS prompts_ai AFTER INSERT ON prompts BEGIN
                INSERT INTO prompts_fts(rowid, prompt_text) VALUES (new.id, new.prompt_text);
            END;
            CREATE TRIGGER IF NOT EXISTS prompts_ad AFTER DELETE ON prompts BEGIN
                INSERT INTO prompts_fts(prompts_fts, rowid, prompt_text)
                VALUES ('delete', old.id, old.prompt_text);
            END;
            ",
        )?;
        Ok(())
    }

    pub fn insert_session(&self, session: &NewSession) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (project, request, summary, created_at_epoch)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.project,
                session.request,
                session.summary,
                session.created_at_epoch
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_prompt(&self, prompt: &NewPrompt) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO prompts (project, prompt_text, created_at_epoch) VALUES (?1, ?2, ?3)",
            params![prompt.project, prompt.prompt_text, prompt.created_at_epoch],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn projects(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT project FROM observations
             UNION SELECT project FROM sessions
             UNION SELECT project FROM prompts
             ORDER BY project",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn counts(&self, project: Option<&str>) -> Result<StoreCounts> {
        Ok(StoreCounts {
            observations: self.count_rows(&OBSERVATIONS, project)?,
            sessions: self.count_rows(&SESSIONS, project)?,
            prompts: self.count_rows(&PROMPTS, project)?,
        })
    }

    fn count_rows(&self, table: &Table, project: Option<&str>) -> Result<usize> {
        let count: i64 = match project {
            Some(p) => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE project = ?1", table.name),
                params![p],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", table.name),
                [],
                |row| row.get(0),
            )?,
        };
        Ok(usize::try_from(count)?)
    }

    fn query_all<T>(
        &self,
        sql: &str,
        values: &[Value],
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), map)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn search_table<T>(
        &self,
        table: &Table,
        filter: &SearchFilter,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let mut sql = format!("SELECT {} FROM {}", table.columns, table.name);
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        let text = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let matched = match text {
            Some(q) => match fts_query(q) {
                Some(expr) => {
                    sql.push_str(&format!(
                        " JOIN {fts} ON {fts}.rowid = {name}.id",
                        fts = table.fts,
                        name = table.name
                    ));
                    clauses.push(format!("{} MATCH ?", table.fts));
                    values.push(Value::Text(expr));
                    true
                }
                // Text with no searchable terms matches nothing
                None => return Ok(Vec::new()),
            },
            None => false,
        };

        if let Some(project) = &filter.project {
            clauses.push(format!("{}.project = ?", table.name));
            values.push(Value::Text(project.clone()));
        }
        if let Some(start) = filter.date_start {
            clauses.push(format!("{}.created_at_epoch >= ?", table.name));
            values.push(Value::Integer(start));
        }
        if let Some(end) = filter.date_end {
            clauses.push(format!("{}.created_at_epoch <= ?", table.name));
            values.push(Value::Integer(end));
        }
        if table.kind == RecordKind::Observation && !filter.obs_types.is_empty() {
            let marks = vec!["?"; filter.obs_types.len()].join(", ");
            clauses.push(format!("{}.type IN ({})", table.name, marks));
            values.extend(
                filter
                    .obs_types
                    .iter()
                    .map(|t| Value::Text(t.as_str().to_string())),
            );
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let order = match filter.order {
            OrderBy::Relevance if matched => format!("{}.rank", table.fts),
            OrderBy::DateAsc => format!("{0}.created_at_epoch ASC, {0}.id ASC", table.name),
            _ => format!("{0}.created_at_epoch DESC, {0}.id DESC", table.name),
        };
        sql.push_str(&format!(" ORDER BY {} LIMIT ?", order));
        values.push(Value::Integer(sql_limit(Some(filter.limit))));

        debug!(table = table.name, %sql, "search");
        self.query_all(&sql, &values, map)
    }

    fn neighbors_in(
        &self,
        table: &Table,
        project: &str,
        pivot: TimelineKey,
        direction: Direction,
        limit: usize,
        map: fn(&Row) -> rusqlite::Result<TimelineItem>,
    ) -> Result<Vec<TimelineItem>> {
        let (cmp, order) = match direction {
            Direction::Before => ("<", "DESC"),
            Direction::After => (">", "ASC"),
        };
        let sql = format!(
            "SELECT {columns} FROM {name}
             WHERE project = ?1 AND (created_at_epoch, ?2, id) {cmp} (?3, ?4, ?5)
             ORDER BY created_at_epoch {order}, id {order}
             LIMIT ?6",
            columns = table.columns,
            name = table.name,
        );
        let values = [
            Value::Text(project.to_string()),
            Value::Integer(table.kind.rank()),
            Value::Integer(pivot.created_at_epoch),
            Value::Integer(pivot.kind.rank()),
            Value::Integer(pivot.id),
            Value::Integer(sql_limit(Some(limit))),
        ];
        self.query_all(&sql, &values, map)
    }
}

fn sql_limit(limit: Option<usize>) -> i64 {
    // SQLite treats a negative LIMIT as unbounded
    limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX))
}

fn encode_list(items: &[String]) -> Result<Option<String>> {
    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(items)?))
}

fn map_observation(row: &Row) -> rusqlite::Result<Observation> {
    Ok(Observation {
        id: row.get(0)?,
        project: row.get(1)?,
        obs_type: ObservationType::parse(&row.get::<_, String>(2)?),
        title: row.get(3)?,
        subtitle: row.get(4)?,
        narrative: row.get(5)?,
        facts: row.get(6)?,
        concepts: row.get(7)?,
        discovery_tokens: row.get(8)?,
        created_at_epoch: row.get(9)?,
    })
}

fn map_session(row: &Row) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        project: row.get(1)?,
        request: row.get(2)?,
        summary: row.get(3)?,
        created_at_epoch: row.get(4)?,
    })
}

fn map_prompt(row: &Row) -> rusqlite::Result<PromptRecord> {
    Ok(PromptRecord {
        id: row.get(0)?,
        project: row.get(1)?,
        prompt_text: row.get(2)?,
        created_at_epoch: row.get(3)?,
    })
}

fn observation_item(row: &Row) -> rusqlite::Result<TimelineItem> {
    map_observation(row).map(TimelineItem::Observation)
}

fn session_item(row: &Row) -> rusqlite::Result<TimelineItem> {
    map_session(row).map(TimelineItem::Session)
}

fn prompt_item(row: &Row) -> rusqlite::Result<TimelineItem> {
    map_prompt(row).map(TimelineItem::Prompt)
}

impl ObservationStore for SqliteStore {
    fn observations_created_before(
        &self,
        project: Option<&str>,
        cutoff_epoch: i64,
    ) -> Result<Vec<Observation>> {
        let mut sql = format!(
            "SELECT {} FROM observations WHERE created_at_epoch < ?",
            OBSERVATION_COLUMNS
        );
        let mut values = vec![Value::Integer(cutoff_epoch)];
        if let Some(p) = project {
            sql.push_str(" AND project = ?");
            values.push(Value::Text(p.to_string()));
        }
        sql.push_str(" ORDER BY created_at_epoch ASC, id ASC");
        self.query_all(&sql, &values, map_observation)
    }

    fn count_observations(&self, project: Option<&str>) -> Result<usize> {
        self.count_rows(&OBSERVATIONS, project)
    }

    fn observations_by_ids(
        &self,
        ids: &[i64],
        order: OrderBy,
        limit: Option<usize>,
        project: Option<&str>,
    ) -> Result<Vec<Observation>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for chunk in ids.chunks(ID_CHUNK) {
            let marks = vec!["?"; chunk.len()].join(", ");
            let mut sql = format!(
                "SELECT {} FROM observations WHERE id IN ({})",
                OBSERVATION_COLUMNS, marks
            );
            let mut values: Vec<Value> = chunk.iter().map(|&id| Value::Integer(id)).collect();
            if let Some(p) = project {
                sql.push_str(" AND project = ?");
                values.push(Value::Text(p.to_string()));
            }
            found.extend(self.query_all(&sql, &values, map_observation)?);
        }

        // Chunks are queried separately, so order, dedupe and cap after merging
        found.sort_by_key(|o| (o.created_at_epoch, o.id));
        found.dedup_by_key(|o| o.id);
        if !matches!(order, OrderBy::DateAsc) {
            found.reverse();
        }
        if let Some(n) = limit {
            found.truncate(n);
        }
        Ok(found)
    }

    fn delete_observation(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM observations WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn insert_observation(&self, obs: &NewObservation) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO observations
                (project, type, title, subtitle, narrative, facts, concepts, discovery_tokens, created_at_epoch)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                obs.project,
                obs.obs_type.as_str(),
                obs.title,
                obs.subtitle,
                obs.narrative,
                encode_list(&obs.facts)?,
                encode_list(&obs.concepts)?,
                obs.discovery_tokens,
                obs.created_at_epoch,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl RetrievalStore for SqliteStore {
    fn search_observations(&self, filter: &SearchFilter) -> Result<Vec<Observation>> {
        self.search_table(&OBSERVATIONS, filter, map_observation)
    }

    fn search_sessions(&self, filter: &SearchFilter) -> Result<Vec<SessionRecord>> {
        self.search_table(&SESSIONS, filter, map_session)
    }

    fn search_prompts(&self, filter: &SearchFilter) -> Result<Vec<PromptRecord>> {
        self.search_table(&PROMPTS, filter, map_prompt)
    }

    fn find_item(&self, kind: RecordKind, id: i64) -> Result<Option<TimelineItem>> {
        let (table, map): (&Table, fn(&Row) -> rusqlite::Result<TimelineItem>) = match kind {
            RecordKind::Observation => (&OBSERVATIONS, observation_item),
            RecordKind::Session => (&SESSIONS, session_item),
            RecordKind::Prompt => (&PROMPTS, prompt_item),
        };
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", table.columns, table.name);
        self.conn
            .query_row(&sql, params![id], map)
            .optional()
            .map_err(Into::into)
    }

    fn neighbors(
        &self,
        project: &str,
        pivot: TimelineKey,
        direction: Direction,
        limit: usize,
    ) -> Result<Vec<TimelineItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for (table, map) in [
            (&OBSERVATIONS, observation_item as fn(&Row) -> rusqlite::Result<TimelineItem>),
            (&SESSIONS, session_item),
            (&PROMPTS, prompt_item),
        ] {
            items.extend(self.neighbors_in(table, project, pivot, direction, limit, map)?);
        }

        items.sort_by_key(TimelineItem::key);
        let items = match direction {
            Direction::Before => {
                let skip = items.len().saturating_sub(limit);
                items.into_iter().skip(skip).collect()
            }
            Direction::After => items.into_iter().take(limit).collect(),
        };
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_obs(project: &str, title: &str, created_at_epoch: i64) -> NewObservation {
        NewObservation {
            project: project.to_string(),
            obs_type: ObservationType::Bugfix,
            title: Some(title.to_string()),
            subtitle: None,
            narrative: Some(format!("{} narrative", title)),
            facts: vec!["fact one".to_string()],
            concepts: vec!["gotcha".to_string()],
            discovery_tokens: 120,
            created_at_epoch,
        }
    }

    fn filter(project: &str, query: Option<&str>) -> SearchFilter {
        SearchFilter {
            query: query.map(String::from),
            project: Some(project.to_string()),
            limit: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_db_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(&temp.path().join("nested").join("tm.db")).unwrap();

        let id = store.insert_observation(&new_obs("api", "Pool leak", 1_000)).unwrap();
        let found = store
            .observations_by_ids(&[id], OrderBy::DateDesc, None, None)
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title.as_deref(), Some("Pool leak"));
        assert_eq!(found[0].facts.as_deref(), Some(r#"["fact one"]"#));
        assert_eq!(found[0].concept_tags().unwrap().len(), 1);
        assert_eq!(found[0].discovery_tokens, 120);
    }

    #[test]
    fn test_empty_lists_stored_as_null() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut obs = new_obs("api", "Bare", 1);
        obs.facts.clear();
        obs.concepts.clear();
        let id = store.insert_observation(&obs).unwrap();

        let found = store
            .observations_by_ids(&[id], OrderBy::DateDesc, None, None)
            .unwrap();
        assert_eq!(found[0].facts, None);
        assert_eq!(found[0].concepts, None);
    }

    #[test]
    fn test_fts_search_scoped_by_project() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_observation(&new_obs("api", "Authentication bug in login", 1)).unwrap();
        store.insert_observation(&new_obs("api", "Database migration", 2)).unwrap();
        store.insert_observation(&new_obs("web", "Authentication middleware", 3)).unwrap();

        let hits = store.search_observations(&filter("api", Some("authentication"))).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].project, "api");

        let none = store
            .search_observations(&filter("api", Some("nonexistent_term_xyz")))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_deleted_rows_leave_fts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert_observation(&new_obs("api", "Flaky retry logic", 1)).unwrap();

        assert!(store.delete_observation(id).unwrap());
        assert!(!store.delete_observation(id).unwrap());
        let hits = store
            .search_observations(&filter("api", Some("retry")))
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.insert_observation(&new_obs("api", "one", 1)).unwrap();
        store.delete_observation(first).unwrap();
        let second = store.insert_observation(&new_obs("api", "two", 2)).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_filter_only_listing_orders_by_date() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (title, ts) in [("b", 20), ("a", 10), ("c", 30)] {
            store.insert_observation(&new_obs("api", title, ts)).unwrap();
        }

        let desc = store.search_observations(&filter("api", None)).unwrap();
        let titles: Vec<_> = desc.iter().map(|o| o.display_title()).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);

        let mut asc_filter = filter("api", None);
        asc_filter.order = OrderBy::DateAsc;
        asc_filter.date_start = Some(15);
        let asc = store.search_observations(&asc_filter).unwrap();
        let titles: Vec<_> = asc.iter().map(|o| o.display_title()).collect();
        assert_eq!(titles, vec!["b", "c"]);
    }

    #[test]
    fn test_type_filter() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_observation(&new_obs("api", "bug", 1)).unwrap();
        let mut decision = new_obs("api", "choice", 2);
        decision.obs_type = ObservationType::Decision;
        store.insert_observation(&decision).unwrap();

        let mut f = filter("api", None);
        f.obs_types = vec![ObservationType::Decision];
        let hits = store.search_observations(&f).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].obs_type, ObservationType::Decision);
    }

    #[test]
    fn test_punctuation_query_matches_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_observation(&new_obs("api", "anything", 1)).unwrap();
        let hits = store.search_observations(&filter("api", Some("?!"))).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_created_before_and_counts() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_observation(&new_obs("api", "old", 100)).unwrap();
        store.insert_observation(&new_obs("api", "new", 900)).unwrap();
        store.insert_observation(&new_obs("web", "old web", 50)).unwrap();

        let old = store.observations_created_before(Some("api"), 900).unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].display_title(), "old");

        let all_old = store.observations_created_before(None, 500).unwrap();
        assert_eq!(all_old.len(), 2);
        assert_eq!(all_old[0].display_title(), "old web");

        assert_eq!(store.count_observations(Some("api")).unwrap(), 2);
        assert_eq!(store.count_observations(None).unwrap(), 3);
    }

    #[test]
    fn test_by_ids_omits_missing_and_respects_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        let a = store.insert_observation(&new_obs("api", "a", 10)).unwrap();
        let b = store.insert_observation(&new_obs("api", "b", 20)).unwrap();
        let c = store.insert_observation(&new_obs("web", "c", 30)).unwrap();

        let found = store
            .observations_by_ids(&[a, b, c, 9_999], OrderBy::DateAsc, None, None)
            .unwrap();
        assert_eq!(found.iter().map(|o| o.id).collect::<Vec<_>>(), vec![a, b, c]);

        let capped = store
            .observations_by_ids(&[a, b, c], OrderBy::DateDesc, Some(2), None)
            .unwrap();
        assert_eq!(capped.iter().map(|o| o.id).collect::<Vec<_>>(), vec![c, b]);

        let scoped = store
            .observations_by_ids(&[a, b, c], OrderBy::DateDesc, None, Some("web"))
            .unwrap();
        assert_eq!(scoped.len(), 1);
    }

    #[test]
    fn test_by_ids_spans_many_chunks() {
        let store = SqliteStore::open_in_memory().unwrap();
        let early = store.insert_observation(&new_obs("api", "early", 10)).unwrap();
        let late = store.insert_observation(&new_obs("api", "late", 20)).unwrap();

        // Far more ids than SQLite binds in one statement, found rows in different chunks
        let mut ids: Vec<i64> = (1_000..41_000).collect();
        ids.insert(0, late);
        ids.push(early);
        ids.push(late);

        let found = store
            .observations_by_ids(&ids, OrderBy::DateDesc, None, None)
            .unwrap();
        assert_eq!(found.iter().map(|o| o.id).collect::<Vec<_>>(), vec![late, early]);

        let capped = store
            .observations_by_ids(&ids, OrderBy::DateAsc, Some(1), None)
            .unwrap();
        assert_eq!(capped.iter().map(|o| o.id).collect::<Vec<_>>(), vec![early]);
    }

    #[test]
    fn test_neighbors_merge_kinds() {
        let store = SqliteStore::open_in_memory().unwrap();
        let session = store
            .insert_session(&NewSession {
                project: "api".to_string(),
                request: Some("Fix login".to_string()),
                summary: None,
                created_at_epoch: 100,
            })
            .unwrap();
        let prompt = store
            .insert_prompt(&NewPrompt {
                project: "api".to_string(),
                prompt_text: "why does login fail".to_string(),
                created_at_epoch: 100,
            })
            .unwrap();
        let anchor = store.insert_observation(&new_obs("api", "anchor", 200)).unwrap();
        let after = store.insert_observation(&new_obs("api", "after", 300)).unwrap();
        store.insert_observation(&new_obs("web", "other project", 150)).unwrap();

        let pivot = TimelineKey::new(200, RecordKind::Observation, anchor);
        let before = store.neighbors("api", pivot, Direction::Before, 5).unwrap();
        let keys: Vec<_> = before.iter().map(TimelineItem::key).collect();
        assert_eq!(
            keys,
            vec![
                TimelineKey::new(100, RecordKind::Session, session),
                TimelineKey::new(100, RecordKind::Prompt, prompt),
            ]
        );

        let nearest = store.neighbors("api", pivot, Direction::Before, 1).unwrap();
        assert_eq!(nearest[0].key().kind, RecordKind::Prompt);

        let later = store.neighbors("api", pivot, Direction::After, 5).unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].key().id, after);
    }

    #[test]
    fn test_find_item_and_projects() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .insert_prompt(&NewPrompt {
                project: "web".to_string(),
                prompt_text: "hello".to_string(),
                created_at_epoch: 5,
            })
            .unwrap();
        store.insert_observation(&new_obs("api", "x", 1)).unwrap();

        assert!(matches!(
            store.find_item(RecordKind::Prompt, id).unwrap(),
            Some(TimelineItem::Prompt(_))
        ));
        assert!(store.find_item(RecordKind::Session, id).unwrap().is_none());
        assert_eq!(store.projects().unwrap(), vec!["api", "web"]);

        let counts = store.counts(Some("web")).unwrap();
        assert_eq!(counts.prompts, 1);
        assert_eq!(counts.observations, 0);
    }
}
