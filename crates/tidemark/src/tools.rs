//! Named operations that take a JSON parameter map and return JSON

use crate::commands::{self, Workspace};
use serde_json::{Map, Value};
use tidemark_core::{Error, OrderBy, Result, SearchType, ShrinkMode, MS_PER_DAY};
use tidemark_retrieval::{
    get_observations, parse_date_bound, search, timeline, Anchor, DateBound, FetchRequest,
    SearchRequest, TimelineRequest,
};
use tidemark_shrink::{analyze, AnalyzeOptions};

type Params = Map<String, Value>;

pub const OPERATIONS: [&str; 5] = [
    "search",
    "timeline",
    "get_observations",
    "shrink/analyze",
    "shrink/execute",
];

pub fn call(ws: &Workspace, operation: &str, params: &Value) -> anyhow::Result<Value> {
    let empty = Params::new();
    let params = match params {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(Error::invalid("params", "expected a JSON object").into()),
    };

    let result = match operation {
        "search" => serde_json::to_value(search(&ws.store, &search_request(ws, params)?)?)?,
        "timeline" => serde_json::to_value(timeline(&ws.store, &timeline_request(ws, params)?)?)?,
        "get_observations" => {
            serde_json::to_value(get_observations(&ws.store, &fetch_request(params)?)?)?
        }
        "shrink/analyze" => {
            let options = analyze_options(ws, params)?;
            serde_json::to_value(analyze(&ws.store, &options, commands::now_ms())?)?
        }
        "shrink/execute" => {
            let ids = id_list(params, "observationIds")?
                .ok_or_else(|| Error::missing("observationIds"))?;
            let mode: ShrinkMode = required_string(params, "mode")?.parse()?;
            serde_json::to_value(commands::shrink::execute_logged(ws, &ids, mode)?)?
        }
        other => {
            let known = OPERATIONS.join(", ");
            let reason = format!("unknown operation {:?}; expected one of {}", other, known);
            return Err(Error::invalid("operation", reason).into());
        }
    };
    Ok(result)
}

fn search_request(ws: &Workspace, params: &Params) -> Result<SearchRequest> {
    let query = required_string(params, "query")?;
    let scope = commands::scope(string(params, "project")?, flag(params, "allProjects")?);
    Ok(SearchRequest {
        query: query.to_string(),
        scope,
        limit: count(params, "limit")?.unwrap_or(ws.config.retrieval.search_limit),
        search_type: string(params, "type")?
            .map(str::parse::<SearchType>)
            .transpose()?,
        date_start: instant(params, "dateStart", DateBound::Start)?,
        date_end: instant(params, "dateEnd", DateBound::End)?,
        obs_types: commands::obs_types(name_list(params, "obs_type")?.iter().map(String::as_str)),
        order: order(params)?.unwrap_or_default(),
    })
}

fn timeline_request(ws: &Workspace, params: &Params) -> Result<TimelineRequest> {
    let anchor = match params.get("anchor") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(Anchor::Observation(
            n.as_i64()
                .ok_or_else(|| Error::invalid("anchor", "expected an integer id"))?,
        )),
        Some(Value::String(s)) => Some(s.parse::<Anchor>()?),
        Some(_) => return Err(Error::invalid("anchor", "expected an id or a string")),
    };
    Ok(TimelineRequest {
        project: string(params, "project")?.map(str::to_string),
        anchor,
        query: string(params, "query")?.map(str::to_string),
        depth_before: count(params, "depth_before")?.unwrap_or(ws.config.retrieval.depth_before),
        depth_after: count(params, "depth_after")?.unwrap_or(ws.config.retrieval.depth_after),
    })
}

fn fetch_request(params: &Params) -> Result<FetchRequest> {
    Ok(FetchRequest {
        ids: id_list(params, "ids")?.ok_or_else(|| Error::missing("ids"))?,
        order: order(params)?.unwrap_or_default(),
        limit: count(params, "limit")?,
        project: string(params, "project")?.map(str::to_string),
    })
}

fn analyze_options(ws: &Workspace, params: &Params) -> Result<AnalyzeOptions> {
    let defaults = AnalyzeOptions::from_config(&ws.config.shrink);
    let days = |name: &str| -> Result<Option<i64>> {
        Ok(integer(params, name)?.map(|d| d.saturating_mul(MS_PER_DAY)))
    };
    Ok(AnalyzeOptions {
        project: string(params, "project")?.map(str::to_string),
        target_reduction: number(params, "targetReduction")?.unwrap_or(defaults.target_reduction),
        min_age_ms: days("minAge")?.unwrap_or(defaults.min_age_ms),
        max_age_ms: days("maxAge")?.unwrap_or(defaults.max_age_ms),
        min_score: number(params, "minScore")?.unwrap_or(defaults.min_score),
    })
}

fn order(params: &Params) -> Result<Option<OrderBy>> {
    string(params, "orderBy")?.map(str::parse).transpose()
}

fn string<'a>(params: &'a Params, name: &str) -> Result<Option<&'a str>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::invalid(name, "expected a string")),
    }
}

fn required_string<'a>(params: &'a Params, name: &str) -> Result<&'a str> {
    string(params, name)?.ok_or_else(|| Error::missing(name))
}

fn flag(params: &Params, name: &str) -> Result<bool> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(Error::invalid(name, "expected true or false")),
    }
}

fn integer(params: &Params, name: &str) -> Result<Option<i64>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| Error::invalid(name, "expected an integer")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid(name, format!("expected an integer, got {:?}", s))),
        Some(_) => Err(Error::invalid(name, "expected an integer")),
    }
}

fn count(params: &Params, name: &str) -> Result<Option<usize>> {
    integer(params, name)?
        .map(|n| usize::try_from(n).map_err(|_| Error::invalid(name, "must not be negative")))
        .transpose()
}

fn number(params: &Params, name: &str) -> Result<Option<f64>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(Error::invalid(name, "expected a number")),
    }
}

fn instant(params: &Params, name: &str, bound: DateBound) -> Result<Option<i64>> {
    match params.get(name) {
        Some(Value::String(s)) => parse_date_bound(name, s, bound).map(Some),
        _ => integer(params, name),
    }
}

/// Ids as a JSON array or a comma-separated string
fn id_list(params: &Params, name: &str) -> Result<Option<Vec<i64>>> {
    let invalid = || Error::invalid(name, "expected a list of integer ids");
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_i64().ok_or_else(invalid))
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.parse().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(invalid()),
    }
}

/// Names as a JSON array or a comma-separated string
fn name_list(params: &Params, name: &str) -> Result<Vec<String>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid(name, "expected a list of strings"))
            })
            .collect(),
        Some(_) => Err(Error::invalid(name, "expected a string or a list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tidemark_core::{NewObservation, ObservationStore, ObservationType};
    use tidemark_telemetry::{read_jsonl, Paths, ShrinkRecord};

    fn workspace() -> (TempDir, Workspace) {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::open_at(Paths::at(temp.path())).unwrap();
        (temp, ws)
    }

    fn seed(ws: &Workspace, project: &str, title: &str, days_old: i64) -> i64 {
        ws.store
            .insert_observation(&NewObservation {
                project: project.to_string(),
                obs_type: ObservationType::Change,
                title: Some(title.to_string()),
                subtitle: None,
                narrative: Some("short".to_string()),
                facts: Vec::new(),
                concepts: Vec::new(),
                discovery_tokens: 0,
                created_at_epoch: commands::now_ms() - days_old * MS_PER_DAY,
            })
            .unwrap()
    }

    fn validation(err: &anyhow::Error) -> bool {
        err.downcast_ref::<Error>().is_some_and(Error::is_validation)
    }

    #[test]
    fn test_search_requires_project_and_query() {
        let (_temp, ws) = workspace();
        let err = call(&ws, "search", &json!({"query": "pool"})).unwrap_err();
        assert!(validation(&err));
        assert!(err.to_string().contains("project"));

        let err = call(&ws, "search", &json!({"project": "api"})).unwrap_err();
        assert!(err.to_string().contains("query"));

        let all = call(&ws, "search", &json!({"query": "", "allProjects": true})).unwrap();
        assert_eq!(all, json!([]));
    }

    #[test]
    fn test_search_returns_index_rows() {
        let (_temp, ws) = workspace();
        let id = seed(&ws, "api", "pool leak fixed", 1);
        seed(&ws, "web", "pool sizing", 1);

        let rows = call(
            &ws,
            "search",
            &json!({"query": "pool", "project": "api", "obs_type": "change,bugfix", "limit": "5"}),
        )
        .unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(id));
        assert_eq!(rows[0]["kind"], json!("observation"));
        assert_eq!(rows[0]["glyph"], json!("✅"));
    }

    #[test]
    fn test_timeline_and_fetch() {
        let (_temp, ws) = workspace();
        let ids: Vec<i64> = (0..5)
            .map(|n| seed(&ws, "api", &format!("step {}", n), 10 - n))
            .collect();

        let window = call(
            &ws,
            "timeline",
            &json!({"project": "api", "anchor": ids[2], "depth_before": 1, "depth_after": 1}),
        )
        .unwrap();
        assert_eq!(window["items"].as_array().unwrap().len(), 3);
        assert_eq!(window["anchor_index"], json!(1));
        assert_eq!(window["items"][1]["id"], json!(ids[2]));

        let fetched = call(
            &ws,
            "get_observations",
            &json!({"ids": [ids[4], ids[0], 999], "orderBy": "date_asc"}),
        )
        .unwrap();
        let got: Vec<i64> = fetched
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_i64().unwrap())
            .collect();
        assert_eq!(got, vec![ids[0], ids[4]]);

        let err = call(&ws, "get_observations", &json!({})).unwrap_err();
        assert!(validation(&err));
    }

    #[test]
    fn test_shrink_round_trip_writes_audit_log() {
        let (_temp, ws) = workspace();
        let old = seed(&ws, "api", "old", 300);
        seed(&ws, "api", "new", 1);

        let analysis = call(
            &ws,
            "shrink/analyze",
            &json!({"project": "api", "targetReduction": 0.5, "minAge": 30}),
        )
        .unwrap();
        assert_eq!(analysis["observationsToRemove"], json!(1));
        assert_eq!(analysis["candidates"][0]["id"], json!(old));

        let outcome = call(
            &ws,
            "shrink/execute",
            &json!({"observationIds": [old, old], "mode": "delete"}),
        )
        .unwrap();
        assert_eq!(outcome, json!({"deleted": 1, "failed": 1}));

        let log: Vec<ShrinkRecord> = read_jsonl(&ws.paths.shrink_log()).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].requested, 2);
        assert_eq!(log[0].projects, vec!["api"]);
    }

    #[test]
    fn test_large_selection_counts_every_id() {
        let (_temp, ws) = workspace();
        let kept = seed(&ws, "api", "kept", 300);
        let mut ids: Vec<i64> = (10_000..50_000).collect();
        ids.push(kept);

        let fetched = call(&ws, "get_observations", &json!({"ids": ids})).unwrap();
        assert_eq!(fetched.as_array().unwrap().len(), 1);

        let outcome = call(
            &ws,
            "shrink/execute",
            &json!({"observationIds": ids, "mode": "delete"}),
        )
        .unwrap();
        assert_eq!(outcome, json!({"deleted": 1, "failed": 40_000}));

        let log: Vec<ShrinkRecord> = read_jsonl(&ws.paths.shrink_log()).unwrap();
        assert_eq!(log[0].requested, 40_001);
        assert_eq!(log[0].projects, vec!["api"]);
    }

    #[test]
    fn test_execute_validation() {
        let (_temp, ws) = workspace();
        let err = call(&ws, "shrink/execute", &json!({"mode": "delete"})).unwrap_err();
        assert!(err.to_string().contains("observationIds"));

        let err = call(&ws, "shrink/execute", &json!({"observationIds": [], "mode": "delete"}))
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::EmptySelection)));

        let err = call(&ws, "shrink/execute", &json!({"observationIds": [1], "mode": "zip"}))
            .unwrap_err();
        assert!(validation(&err));
        assert!(!ws.paths.shrink_log().exists());
    }

    #[test]
    fn test_unknown_operation_and_bad_params() {
        let (_temp, ws) = workspace();
        let err = call(&ws, "shrink/undo", &json!({})).unwrap_err();
        assert!(err.to_string().contains("unknown operation"));

        let err = call(&ws, "search", &json!([1, 2])).unwrap_err();
        assert!(validation(&err));

        let err = call(&ws, "search", &json!({"query": "x", "project": "api", "limit": -1}))
            .unwrap_err();
        assert!(err.to_string().contains("limit"));
    }
}
