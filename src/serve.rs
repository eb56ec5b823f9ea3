//! HTTP server for interactive exploration
//!
//! `morpho serve designs.csv --view front=renders/front` → starts server,
//! opens browser, serves the gallery UI and a JSON API over one [`Session`].
//!
//! Requests are handled one at a time on the accept loop, so the session
//! needs no locking.

use crate::brush::{BrushConstraint, BrushSelection, ClickPayload};
use crate::dataset::{Item, ViewMeta};
use crate::error::Error;
use crate::ingest::{self, Source};
use crate::plot::{self, PlotAxes, PlotPayload};
use crate::query::{FilterSpec, RawCondition};
use crate::session::{FilterStatus, ResultCount, Session};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use tiny_http::{Header, Method, Request, Response, Server};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("ui.html");

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    fn failure(error: impl ToString) -> Self {
        Self { ok: false, data: None, error: Some(error.to_string()) }
    }
}

/// Snapshot of the session for the UI.
#[derive(Serialize)]
pub struct DatasetState<'a> {
    pub count: ResultCount,
    pub parameters: &'a [String],
    pub views: &'a [ViewMeta],
    pub items: &'a [Item],
    pub view: Option<&'a str>,
    pub captions: &'a [String],
    pub sort: Option<&'a str>,
    pub filter: &'a FilterSpec,
    pub no_results: bool,
    pub selected: Option<&'a Item>,
}

impl<'a> DatasetState<'a> {
    pub fn of(session: &'a Session) -> Self {
        Self {
            count: session.count(),
            parameters: session.parameters(),
            views: session.dataset().map_or(&[], |d| d.meta.views.as_slice()),
            items: session.displayed(),
            view: session.view(),
            captions: session.captions(),
            sort: session.sort(),
            filter: session.filter(),
            no_results: session.no_results(),
            selected: session.selected(),
        }
    }
}

/// `POST /api/load` body. `json` wins over `csv` when both are given.
#[derive(Deserialize, Debug, Default)]
pub struct LoadParams {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub views: BTreeMap<String, String>,
}

impl LoadParams {
    /// Views named in the configuration keep the configured order; others
    /// follow alphabetically.
    pub fn into_source(self, session: &Session) -> crate::Result<Source> {
        if let Some(json) = self.json.filter(|p| !p.trim().is_empty()) {
            return Ok(Source::Prebuilt(PathBuf::from(json.trim())));
        }
        let csv = self
            .csv
            .filter(|p| !p.trim().is_empty())
            .ok_or(Error::NoInput)?;

        let mut views = self.views;
        let mut ordered = Vec::with_capacity(views.len());
        for spec in &session.config().views {
            if let Some(dir) = views.remove(&spec.key) {
                ordered.push((spec.key.clone(), PathBuf::from(dir)));
            }
        }
        ordered.extend(views.into_iter().map(|(k, d)| (k, PathBuf::from(d))));

        Ok(Source::Csv {
            path: PathBuf::from(csv.trim()),
            views: ordered,
        })
    }
}

#[derive(Serialize)]
struct FilterResponse<'a> {
    #[serde(flatten)]
    status: FilterStatus,
    state: DatasetState<'a>,
}

#[derive(Serialize)]
struct BrushResponse<'a> {
    indices: Vec<usize>,
    keys: Vec<&'a str>,
    selected: Option<&'a Item>,
}

impl<'a> BrushResponse<'a> {
    /// `selected` is the collapsed item only; zero or several matches
    /// report none.
    fn of(session: &'a Session, selection: BrushSelection) -> Self {
        let displayed = session.displayed();
        Self {
            keys: selection
                .indices
                .iter()
                .filter_map(|&i| displayed.get(i))
                .map(|item| item.key.as_str())
                .collect(),
            selected: session.brushed(&selection),
            indices: selection.indices,
        }
    }
}

#[derive(Deserialize)]
struct SortQuery {
    #[serde(default)]
    param: String,
}

#[derive(Deserialize)]
struct KeyQuery {
    key: String,
}

#[derive(Deserialize, Default)]
struct PlotQuery {
    x: Option<String>,
    y: Option<String>,
    z: Option<String>,
    /// Comma separated parameter names.
    dims: Option<String>,
}

impl PlotQuery {
    fn axes(self) -> PlotAxes {
        let blank = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        PlotAxes {
            x: blank(self.x),
            y: blank(self.y),
            z: blank(self.z),
            dims: self
                .dims
                .map(|d| {
                    d.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct CaptionParams {
    #[serde(default)]
    params: Vec<String>,
}

/// Start server, open browser, serve UI
pub fn start(port: u16, mut session: Session, open_browser: bool) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let url = format!("http://localhost:{}", port);

    eprintln!("\n\x1b[1;32m◆ Morpho\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   {}\n", session.count());

    if open_browser {
        if let Err(e) = open::that(&url) {
            log::warn!("could not open browser: {}", e);
        }
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &mut session) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

fn handle_request(mut request: Request, session: &mut Session) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
    let method = request.method().clone();
    log::debug!("{} {}", method, url);

    match (&method, path) {
        (&Method::Get, "/") => {
            let response = with_content_type(Response::from_string(UI_HTML), "text/html; charset=utf-8");
            request.respond(response)
        }

        (&Method::Get, "/api/dataset") => respond_json(request, &ApiResponse::success(DatasetState::of(session))),

        (&Method::Post, "/api/load") => {
            let params: LoadParams = match read_json(&mut request) {
                Ok(params) => params,
                Err(e) => return respond_error(request, 400, e),
            };
            let loaded = params
                .into_source(session)
                .and_then(|source| ingest::load(session, &source));
            match loaded {
                Ok(count) => {
                    eprintln!("→ loaded {} design(s)", count);
                    respond_json(request, &ApiResponse::success(DatasetState::of(session)))
                }
                Err(e) => respond_error(request, 400, e),
            }
        }

        (&Method::Post, "/api/filter") => {
            let raw: Vec<RawCondition> = match read_json(&mut request) {
                Ok(raw) => raw,
                Err(e) => return respond_error(request, 400, e),
            };
            let status = session.apply_filter(FilterSpec::from_raw(&raw));
            let body = FilterResponse { status, state: DatasetState::of(session) };
            respond_json(request, &ApiResponse::success(body))
        }

        (&Method::Get, "/api/sort") => {
            let params: SortQuery = match serde_urlencoded::from_str(query) {
                Ok(params) => params,
                Err(e) => return respond_error(request, 400, e),
            };
            session.apply_sort(&params.param);
            respond_json(request, &ApiResponse::success(DatasetState::of(session)))
        }

        (&Method::Post, "/api/reset") => {
            session.reset();
            respond_json(request, &ApiResponse::success(DatasetState::of(session)))
        }

        (&Method::Post, "/api/brush") => {
            let constraints: Vec<BrushConstraint> = match read_json(&mut request) {
                Ok(constraints) => constraints,
                Err(e) => return respond_error(request, 400, e),
            };
            let selection = session.brush(&constraints);
            respond_json(request, &ApiResponse::success(BrushResponse::of(session, selection)))
        }

        (&Method::Post, "/api/click") => {
            let payload: ClickPayload = match read_json(&mut request) {
                Ok(payload) => payload,
                Err(e) => return respond_error(request, 400, e),
            };
            let selected = session.click(&payload).cloned();
            respond_json(request, &ApiResponse::success(selected))
        }

        (&Method::Get, "/api/select") => {
            let params: KeyQuery = match serde_urlencoded::from_str(query) {
                Ok(params) => params,
                Err(e) => return respond_error(request, 400, e),
            };
            let selected = session.select(&params.key).cloned();
            respond_json(request, &ApiResponse::success(selected))
        }

        (&Method::Post, "/api/clear") => {
            session.clear_selection();
            respond_json(request, &ApiResponse::success(()))
        }

        (&Method::Get, "/api/view") => {
            let params: KeyQuery = match serde_urlencoded::from_str(query) {
                Ok(params) => params,
                Err(e) => return respond_error(request, 400, e),
            };
            match session.set_view(&params.key) {
                Ok(()) => respond_json(request, &ApiResponse::success(DatasetState::of(session))),
                Err(e) => respond_error(request, 404, e),
            }
        }

        (&Method::Post, "/api/captions") => {
            let params: CaptionParams = match read_json(&mut request) {
                Ok(params) => params,
                Err(e) => return respond_error(request, 400, e),
            };
            session.set_captions(params.params);
            respond_json(request, &ApiResponse::success(DatasetState::of(session)))
        }

        (&Method::Get, "/api/plot") => {
            let params: PlotQuery = serde_urlencoded::from_str(query).unwrap_or_default();
            let payload: PlotPayload = plot::build(session.displayed(), session.parameters(), params.axes());
            respond_json(request, &ApiResponse::success(payload))
        }

        (&Method::Get, p) if p.starts_with("/res/") => match session.resource(p) {
            Some(resource) => match resource.source.read() {
                Ok(bytes) => {
                    let content_type = resource.content_type();
                    request.respond(with_content_type(Response::from_data(bytes), content_type))
                }
                Err(e) => {
                    log::warn!("{}: {}", resource.source.location(&resource.name), e);
                    request.respond(Response::from_string("Unreadable").with_status_code(500))
                }
            },
            None => request.respond(Response::from_string("Not found").with_status_code(404)),
        },

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(request: &mut Request) -> crate::Result<T> {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .map_err(|e| Error::io("request body", e))?;
    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    Ok(serde_json::from_str(body)?)
}

fn respond_json<T: Serialize>(request: Request, body: &ApiResponse<T>) -> std::io::Result<()> {
    let json = serde_json::to_string(body)?;
    request.respond(with_content_type(Response::from_string(json), "application/json"))
}

fn respond_error(request: Request, status: u16, error: impl ToString) -> std::io::Result<()> {
    let json = serde_json::to_string(&ApiResponse::<()>::failure(error))?;
    let response = with_content_type(Response::from_string(json), "application/json").with_status_code(status);
    request.respond(response)
}

fn with_content_type<R: Read>(response: Response<R>, value: &str) -> Response<R> {
    match Header::from_bytes(&b"Content-Type"[..], value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dataset::{ParameterRow, Table};

    // ==========================================================================
    // REQUEST PARAMETERS
    // ==========================================================================

    #[test]
    fn test_load_params_order_views_by_config() {
        let session = Session::new(Config::default());
        let params: LoadParams = serde_json::from_str(
            r#"{"csv": "d.csv", "views": {"zz": "/z", "top": "/t", "front": "/f"}}"#,
        )
        .unwrap();

        match params.into_source(&session).unwrap() {
            Source::Csv { path, views } => {
                assert_eq!(path, PathBuf::from("d.csv"));
                let keys: Vec<&str> = views.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["front", "top", "zz"]);
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_load_params_prefers_json() {
        let session = Session::new(Config::default());
        let params = LoadParams {
            csv: Some("d.csv".into()),
            json: Some("data.json".into()),
            ..LoadParams::default()
        };
        assert_eq!(
            params.into_source(&session).unwrap(),
            Source::Prebuilt(PathBuf::from("data.json"))
        );
    }

    #[test]
    fn test_load_params_need_input() {
        let session = Session::new(Config::default());
        let params = LoadParams { csv: Some("  ".into()), ..LoadParams::default() };
        assert!(matches!(params.into_source(&session), Err(Error::NoInput)));
    }

    #[test]
    fn test_plot_query_dims() {
        let query: PlotQuery = serde_urlencoded::from_str("x=a&y=&dims=a,%20b,,c").unwrap();
        let axes = query.axes();
        assert_eq!(axes.x.as_deref(), Some("a"));
        assert_eq!(axes.y, None);
        assert_eq!(axes.dims, vec!["a", "b", "c"]);
    }

    // ==========================================================================
    // RESPONSES
    // ==========================================================================

    #[test]
    fn test_filter_response_shape() {
        let mut row = ParameterRow::new();
        row.insert("x".into(), 1.0.into());
        let mut session = Session::new(Config::default());
        session.load(&Table::from_rows(vec![row]), &[]).unwrap();

        let raw: Vec<RawCondition> =
            serde_json::from_str(r#"[{"parameter": "x", "operator": ">", "value": "5"}]"#).unwrap();
        let status = session.apply_filter(FilterSpec::from_raw(&raw));
        let body = FilterResponse { status, state: DatasetState::of(&session) };
        let value = serde_json::to_value(ApiResponse::success(body)).unwrap();

        assert_eq!(value["ok"], true);
        assert_eq!(value["data"]["status"], "no_results");
        assert_eq!(value["data"]["state"]["no_results"], true);
        assert_eq!(value["data"]["state"]["items"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_brush_response_ignores_earlier_selection() {
        let rows = [1.0, 5.0, 10.0]
            .iter()
            .map(|x| {
                let mut row = ParameterRow::new();
                row.insert("x".into(), (*x).into());
                row
            })
            .collect();
        let mut session = Session::new(Config::default());
        session.load(&Table::from_rows(rows), &[]).unwrap();
        session.click(&ClickPayload::with_text("ID: 1"));

        let many = session.brush(&[BrushConstraint::single("x", 0.0, 20.0)]);
        let value = serde_json::to_value(BrushResponse::of(&session, many)).unwrap();
        assert_eq!(value["indices"], serde_json::json!([0, 1, 2]));
        assert_eq!(value["keys"], serde_json::json!(["0-1", "1-2", "2-3"]));
        assert!(value["selected"].is_null());

        let one = session.brush(&[BrushConstraint::single("x", 9.0, 11.0)]);
        let value = serde_json::to_value(BrushResponse::of(&session, one)).unwrap();
        assert_eq!(value["selected"]["id"], 3);
    }

    #[test]
    fn test_failure_envelope() {
        let value = serde_json::to_value(ApiResponse::<()>::failure(Error::NoInput)).unwrap();
        assert_eq!(value["ok"], false);
        assert!(value["data"].is_null());
        assert!(value["error"].as_str().unwrap().contains("no dataset"));
    }
}
