//! Feed walker behaviour against an in-memory feed
//!
//! Run with: cargo test -p geoharvest-geogratis --test feed_walk

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use geoharvest_core::{FetchError, JsonSource, ProgressContext, parse_document};
use geoharvest_geogratis::{
    Config, CursorStore, FRENCH_UNAVAILABLE, FeedQuery, FeedWalker, ItemOutcome, JsonLinesEmitter,
    Lang, LookupTables, OutputStyle, Outputs, RecordTarget, ReportWriter, RunOptions, print_raw,
    run_one, run_with,
};
use serde_json::{Value, json};
use tempfile::TempDir;

const BASE: &str = "http://geo.test/api";
const FIRST_PAGE: &str = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json";

/// Serves canned documents by URL and records every request.
#[derive(Default)]
struct MockSource {
    docs: HashMap<String, Value>,
    requests: RefCell<Vec<String>>,
    /// Raise the flag once this URL has been served
    trip: Option<(String, Arc<AtomicBool>)>,
}

impl MockSource {
    fn with(mut self, url: impl Into<String>, doc: Value) -> Self {
        self.docs.insert(url.into(), doc);
        self
    }

    fn with_item(self, config: &Config, id: &str, lang: Lang, doc: Value) -> Self {
        self.with(config.item_url(id, lang), doc)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl JsonSource for MockSource {
    fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        if let Some((trip_url, flag)) = &self.trip {
            if trip_url == url {
                flag.store(true, Ordering::Relaxed);
            }
        }
        match self.docs.get(url) {
            Some(doc) => parse_document(&doc.to_string(), url),
            None => Err(FetchError::Remote {
                status: 404,
                message: "Not Found".to_string(),
            }),
        }
    }
}

fn page(ids: &[&str], next: Option<&str>, count: u64) -> Value {
    let mut links = vec![json!({"rel": "self", "href": FIRST_PAGE})];
    if let Some(next) = next {
        links.push(json!({"rel": "next", "href": next}));
    }
    json!({
        "products": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
        "links": links,
        "count": count,
    })
}

fn english(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Bedrock geology {id}"),
        "summary": "Bedrock units.",
        "citation": {
            "publicationDate": "2012-03-15",
            "presentationForm": "mapDigital"
        },
        "files": [{"description": "Map", "size": "2 KB", "type": "Adobe PDF", "link": "http://files.test/map.pdf"}],
        "categories": [{"type": "urn:iso:place", "terms": [{"term": "yt", "label": "Yukon"}]}],
        "keywords": ["Geology > Bedrock"],
        "topicCategories": ["geoscientificInformation"]
    })
}

fn french(id: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Géologie du substratum {id}"),
        "files": [{"description": "Carte", "size": "2 KB", "type": "Adobe PDF", "link": "http://files.test/carte.pdf"}],
        "keywords": ["Géologie > Substratum"]
    })
}

struct Harness {
    _dir: TempDir,
    config: Config,
    tables: LookupTables,
    cursor: CursorStore,
    stop: Arc<AtomicBool>,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = Config {
            base_url: BASE.to_string(),
            item_delay: Duration::ZERO,
            state_file: dir.path().join("state.toml"),
            ..Default::default()
        };
        let cursor = CursorStore::new(&config.state_file);
        Self {
            _dir: dir,
            config,
            tables: LookupTables::builtin().unwrap(),
            cursor,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    fn walker<'a>(&'a self, source: &'a MockSource) -> FeedWalker<'a, MockSource> {
        FeedWalker::new(source, &self.config, &self.tables, &self.cursor)
            .with_stop_flag(&self.stop)
    }
}

fn memory_outputs() -> Outputs<Vec<u8>, Vec<u8>> {
    Outputs::new(
        Some(JsonLinesEmitter::new(Vec::new(), OutputStyle::Compact)),
        Some(ReportWriter::new(Vec::new()).unwrap()),
    )
}

fn report_rows(outputs: Outputs<Vec<u8>, Vec<u8>>) -> Vec<Vec<String>> {
    let bytes = outputs.report.unwrap().into_inner().unwrap();
    csv::Reader::from_reader(bytes.as_slice())
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

#[test]
fn two_items_one_french_failure() {
    let h = Harness::new();
    let source = MockSource::default()
        .with(FIRST_PAGE, page(&["A", "B"], None, 2))
        .with_item(&h.config, "A", Lang::En, english("A"))
        .with_item(&h.config, "A", Lang::Fr, french("A"))
        .with_item(&h.config, "B", Lang::En, english("B"));

    let mut outputs = memory_outputs();
    let summary = h.walker(&source).walk(&FeedQuery::All, &mut outputs).unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(summary.items, 2);
    assert_eq!(summary.emitted, 1);
    assert_eq!(summary.rejected, 1);
    assert!(!summary.interrupted);

    assert_eq!(
        source.requests(),
        [
            FIRST_PAGE.to_string(),
            h.config.item_url("A", Lang::En),
            h.config.item_url("A", Lang::Fr),
            h.config.item_url("B", Lang::En),
            h.config.item_url("B", Lang::Fr),
        ]
    );

    let records = String::from_utf8(outputs.records.take().unwrap().into_inner()).unwrap();
    let lines: Vec<Value> = records
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], "A");
    assert_eq!(lines[0]["geographic_region"], "yukon");

    let rows = report_rows(outputs);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], "A");
    assert_eq!(rows[0][1], "Pass");
    assert_eq!(rows[1][0], "B");
    assert_eq!(rows[1][1], "Fail");
    assert_eq!(rows[1][2], "Bedrock geology B");
    assert_eq!(rows[1][14], FRENCH_UNAVAILABLE);

    // No next link: the walk ends with the cursor unset
    assert_eq!(h.cursor.load().unwrap(), None);
}

#[test]
fn resumes_from_saved_cursor() {
    let h = Harness::new();
    let saved = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json&start-index=51";
    h.cursor.save(saved).unwrap();
    let source = MockSource::default().with(saved, page(&[], None, 0));

    let summary = h
        .walker(&source)
        .walk(&FeedQuery::All, &mut memory_outputs())
        .unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(source.requests()[0], saved);
}

#[test]
fn saved_cursor_wins_over_date_query() {
    let h = Harness::new();
    let saved = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json&start-index=101";
    h.cursor.save(saved).unwrap();
    let source = MockSource::default().with(saved, page(&[], None, 0));
    let query = FeedQuery::modified_since("2020-01-01").unwrap();

    h.walker(&source).walk(&query, &mut memory_outputs()).unwrap();

    assert_eq!(source.requests(), [saved]);
}

#[test]
fn reset_starts_from_default_query() {
    let mut h = Harness::new();
    h.config.reset = true;
    let saved = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json&start-index=51";
    h.cursor.save(saved).unwrap();
    let source = MockSource::default().with(FIRST_PAGE, page(&[], None, 0));

    h.walker(&source)
        .walk(&FeedQuery::All, &mut memory_outputs())
        .unwrap();

    assert_eq!(source.requests(), [FIRST_PAGE]);
    assert_eq!(h.cursor.load().unwrap(), None);
}

#[test]
fn date_query_starts_at_edited_min() {
    let h = Harness::new();
    let query = FeedQuery::modified_since("2013-01-30").unwrap();
    let url = h.config.feed_url(&query).unwrap();
    let source = MockSource::default().with(url.clone(), page(&[], None, 0));

    h.walker(&source).walk(&query, &mut memory_outputs()).unwrap();

    assert_eq!(source.requests(), [url.clone()]);
    assert!(url.contains("edited-min=2013-01-30T00%3A00%3A00"));
}

#[test]
fn zero_count_ends_walk_despite_next_link() {
    let h = Harness::new();
    let next = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json&page=2";
    let source = MockSource::default().with(FIRST_PAGE, page(&[], Some(next), 0));

    let summary = h
        .walker(&source)
        .walk(&FeedQuery::All, &mut memory_outputs())
        .unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(source.requests(), [FIRST_PAGE]);
    assert_eq!(h.cursor.load().unwrap(), None);
}

#[test]
fn max_pages_ends_walk_and_keeps_cursor() {
    let mut h = Harness::new();
    h.config.max_pages = Some(2);
    let p2 = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json&page=2";
    let p3 = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json&page=3";
    let source = MockSource::default()
        .with(FIRST_PAGE, page(&[], Some(p2), 250))
        .with(p2, page(&[], Some(p3), 250));

    let summary = h
        .walker(&source)
        .walk(&FeedQuery::All, &mut memory_outputs())
        .unwrap();

    assert_eq!(summary.pages, 2);
    assert!(!summary.interrupted);
    assert_eq!(source.requests(), [FIRST_PAGE, p2]);
    assert_eq!(h.cursor.load().unwrap().as_deref(), Some(p3));
}

#[test]
fn cursor_advances_after_each_page() {
    let h = Harness::new();
    let p2 = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json&page=2";
    let source = MockSource::default()
        .with(FIRST_PAGE, page(&["A"], Some(p2), 1))
        .with_item(&h.config, "A", Lang::En, english("A"))
        .with_item(&h.config, "A", Lang::Fr, french("A"));

    // Page 2 is missing: the walk fails there, after page 1 moved the cursor
    let err = h
        .walker(&source)
        .walk(&FeedQuery::All, &mut memory_outputs())
        .unwrap_err();

    assert!(format!("{err:#}").contains("Feed walk stopped"));
    assert!(format!("{err:#}").contains("HTTP 404"));
    assert_eq!(h.cursor.load().unwrap().as_deref(), Some(p2));
}

#[test]
fn first_page_failure_is_fatal() {
    let h = Harness::new();
    let source = MockSource::default();
    let mut outputs = memory_outputs();

    let result = h.walker(&source).walk(&FeedQuery::All, &mut outputs);

    assert!(result.is_err());
    assert_eq!(source.requests(), [FIRST_PAGE]);
    assert!(report_rows(outputs).is_empty());
}

#[test]
fn malformed_feed_page_is_fatal() {
    let h = Harness::new();
    let source = MockSource::default().with(FIRST_PAGE, json!({"products": "nope"}));

    let err = h
        .walker(&source)
        .walk(&FeedQuery::All, &mut memory_outputs())
        .unwrap_err();

    assert!(format!("{err:#}").contains("invalid JSON"));
}

#[test]
fn malformed_cursor_file_fails_before_fetching() {
    let h = Harness::new();
    std::fs::write(&h.config.state_file, "[geogratis\nnext_link = ").unwrap();
    let source = MockSource::default().with(FIRST_PAGE, page(&[], None, 0));

    let result = h
        .walker(&source)
        .walk(&FeedQuery::All, &mut memory_outputs());

    assert!(result.is_err());
    assert!(source.requests().is_empty());
}

#[test]
fn missing_english_record_is_skipped_without_report_row() {
    let h = Harness::new();
    let source = MockSource::default().with(FIRST_PAGE, page(&["X"], None, 1));

    let mut outputs = memory_outputs();
    let summary = h.walker(&source).walk(&FeedQuery::All, &mut outputs).unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.emitted, 0);
    // French variant never requested
    assert_eq!(source.requests().len(), 2);
    assert!(report_rows(outputs).is_empty());
}

#[test]
fn excluded_product_type_is_not_harvested() {
    let h = Harness::new();
    let mut dem = english("D");
    dem["categories"] = json!([
        {"type": "urn:iso:series", "terms": [{"term": "canadian-digital-elevation-data", "label": "CDED"}]}
    ]);
    let source = MockSource::default()
        .with(FIRST_PAGE, page(&["D"], None, 1))
        .with_item(&h.config, "D", Lang::En, dem);

    let mut outputs = memory_outputs();
    let summary = h.walker(&source).walk(&FeedQuery::All, &mut outputs).unwrap();

    assert_eq!(summary.excluded, 1);
    assert!(
        !source
            .requests()
            .contains(&h.config.item_url("D", Lang::Fr))
    );
    assert!(report_rows(outputs).is_empty());
}

#[test]
fn validation_failure_is_reported_not_emitted() {
    let h = Harness::new();
    let mut fr = french("A");
    fr["keywords"] = json!([]);
    let source = MockSource::default()
        .with(FIRST_PAGE, page(&["A"], None, 1))
        .with_item(&h.config, "A", Lang::En, english("A"))
        .with_item(&h.config, "A", Lang::Fr, fr);

    let mut outputs = memory_outputs();
    let summary = h.walker(&source).walk(&FeedQuery::All, &mut outputs).unwrap();

    assert_eq!(summary.rejected, 1);
    assert!(outputs.records.take().unwrap().into_inner().is_empty());
    let rows = report_rows(outputs);
    assert_eq!(rows[0][1], "Fail");
    assert_eq!(rows[0][7], "N");
    assert!(rows[0][14].contains("Missing French Keywords"));
}

#[test]
fn wrongly_typed_fields_read_as_absent() {
    let h = Harness::new();
    let mut a_en = english("A");
    a_en["citation"]["series"] = json!("Open File");
    a_en["citation"]["seriesIssue"] = json!(6789);
    a_en["keywords"] = json!(["Geology > Bedrock", null]);
    let mut b_fr = french("B");
    b_fr["citation"] = json!({"series": 7});
    let mut c_en = english("C");
    c_en["title"] = json!(5);
    let source = MockSource::default()
        .with(FIRST_PAGE, page(&["A", "B", "C"], None, 3))
        .with_item(&h.config, "A", Lang::En, a_en)
        .with_item(&h.config, "A", Lang::Fr, french("A"))
        .with_item(&h.config, "B", Lang::En, english("B"))
        .with_item(&h.config, "B", Lang::Fr, b_fr)
        .with_item(&h.config, "C", Lang::En, c_en)
        .with_item(&h.config, "C", Lang::Fr, french("C"));

    let mut outputs = memory_outputs();
    let summary = h.walker(&source).walk(&FeedQuery::All, &mut outputs).unwrap();

    assert_eq!(summary.items, 3);
    assert_eq!(summary.emitted, 2);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.skipped, 0);

    let records = String::from_utf8(outputs.records.take().unwrap().into_inner()).unwrap();
    let lines: Vec<Value> = records
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["id"], "A");
    assert_eq!(lines[0]["data_series_name"], "Open File");
    assert_eq!(lines[0]["data_series_issue_identification"], "");
    assert_eq!(lines[0]["keywords"], "Bedrock");
    assert_eq!(lines[1]["id"], "B");
    assert_eq!(lines[1]["data_series_name_fra"], "");

    let rows = report_rows(outputs);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][1], "Pass");
    assert_eq!(rows[0][10], "Y");
    assert_eq!(rows[0][12], "N");
    assert_eq!(rows[1][1], "Pass");
    assert_eq!(rows[1][11], "N");
    assert_eq!(rows[2][0], "C");
    assert_eq!(rows[2][1], "Fail");
    assert!(rows[2][14].contains("Missing English Title"));
}

#[test]
fn interrupt_stops_between_items_without_advancing_cursor() {
    let mut h = Harness::new();
    let p2 = "http://geo.test/api/en/nrcan-rncan/ess-sst?alt=json&page=2";
    let stop = Arc::new(AtomicBool::new(false));
    h.stop = stop.clone();
    let mut source = MockSource::default()
        .with(FIRST_PAGE, page(&["A", "B"], Some(p2), 2))
        .with_item(&h.config, "A", Lang::En, english("A"))
        .with_item(&h.config, "A", Lang::Fr, french("A"))
        .with_item(&h.config, "B", Lang::En, english("B"))
        .with_item(&h.config, "B", Lang::Fr, french("B"));
    source.trip = Some((h.config.item_url("A", Lang::Fr), stop));

    let summary = h
        .walker(&source)
        .walk(&FeedQuery::All, &mut memory_outputs())
        .unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.items, 1);
    assert_eq!(summary.emitted, 1);
    assert!(
        !source
            .requests()
            .contains(&h.config.item_url("B", Lang::En))
    );
    assert_eq!(h.cursor.load().unwrap(), None);
}

#[test]
fn run_with_writes_files() {
    let h = Harness::new();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("records.jl");
    let report = dir.path().join("report.csv");
    let source = MockSource::default()
        .with(FIRST_PAGE, page(&["A", "B"], None, 2))
        .with_item(&h.config, "A", Lang::En, english("A"))
        .with_item(&h.config, "A", Lang::Fr, french("A"))
        .with_item(&h.config, "B", Lang::En, english("B"))
        .with_item(&h.config, "B", Lang::Fr, french("B"));
    let options = RunOptions {
        records: RecordTarget::File(out.clone()),
        style: None,
        report: Some(report.clone()),
    };

    let summary = run_with(
        &source,
        &h.config,
        &FeedQuery::All,
        &options,
        &ProgressContext::hidden(),
    )
    .unwrap();

    assert_eq!(summary.emitted, 2);
    let records = std::fs::read_to_string(&out).unwrap();
    assert_eq!(records.lines().count(), 2);
    assert!(records.lines().all(|l| l.starts_with('{') && l.ends_with('}')));

    let report = std::fs::read_to_string(&report).unwrap();
    assert!(report.starts_with("ID,Pass or Fail,Title (EN)"));
    assert_eq!(report.lines().count(), 3);
}

#[test]
fn bad_cursor_leaves_existing_outputs_untouched() {
    let h = Harness::new();
    std::fs::write(&h.config.state_file, "[geogratis\nnext_link = ").unwrap();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("records.jl");
    let report = dir.path().join("report.csv");
    std::fs::write(&out, "{\"id\":\"previous\"}\n").unwrap();
    std::fs::write(&report, "ID,Pass or Fail\nprevious,Pass\n").unwrap();
    let source = MockSource::default().with(FIRST_PAGE, page(&[], None, 0));
    let options = RunOptions {
        records: RecordTarget::File(out.clone()),
        style: None,
        report: Some(report.clone()),
    };

    let result = run_with(
        &source,
        &h.config,
        &FeedQuery::All,
        &options,
        &ProgressContext::hidden(),
    );

    assert!(result.is_err());
    assert!(source.requests().is_empty());
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "{\"id\":\"previous\"}\n"
    );
    assert_eq!(
        std::fs::read_to_string(&report).unwrap(),
        "ID,Pass or Fail\nprevious,Pass\n"
    );
}

#[test]
fn single_item_rejection_carries_reasons() {
    let h = Harness::new();
    let mut fr = french("A");
    fr["keywords"] = json!([]);
    let source = MockSource::default()
        .with_item(&h.config, "A", Lang::En, english("A"))
        .with_item(&h.config, "A", Lang::Fr, fr)
        .with_item(&h.config, "B", Lang::En, english("B"));
    let options = RunOptions {
        records: RecordTarget::Suppressed,
        ..Default::default()
    };

    let outcome = run_one(&source, &h.config, "A", &options).unwrap();
    assert!(
        matches!(&outcome, ItemOutcome::Rejected { reasons } if reasons.contains("Missing French Keywords")),
        "{outcome:?}"
    );

    let outcome = run_one(&source, &h.config, "B", &options).unwrap();
    assert_eq!(
        outcome,
        ItemOutcome::Rejected {
            reasons: FRENCH_UNAVAILABLE.to_string()
        }
    );
}

#[test]
fn single_item_and_raw_document() {
    let h = Harness::new();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("one.jl");
    let source = MockSource::default()
        .with_item(&h.config, "A", Lang::En, english("A"))
        .with_item(&h.config, "A", Lang::Fr, french("A"));
    let options = RunOptions {
        records: RecordTarget::File(out.clone()),
        ..Default::default()
    };

    let outcome = run_one(&source, &h.config, "A", &options).unwrap();
    assert_eq!(outcome, ItemOutcome::Emitted);
    let record: Value =
        serde_json::from_str(std::fs::read_to_string(&out).unwrap().trim()).unwrap();
    assert_eq!(record["title_fra"], "Géologie du substratum A");

    print_raw(&source, &h.config, "A", &options).unwrap();
    let raw: Value = serde_json::from_str(std::fs::read_to_string(&out).unwrap().trim()).unwrap();
    assert_eq!(raw["title"], "Bedrock geology A");
    assert_eq!(raw["url"], h.config.item_url("A", Lang::En));

    // Never touches the cursor
    assert!(!h.config.state_file.exists());
}
