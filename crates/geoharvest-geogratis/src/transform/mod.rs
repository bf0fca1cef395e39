//! Bilingual raw record pair -> Open Data target record
//!
//! Every field rule runs regardless of earlier failures; mandatory failures are
//! collected as reasons and void the record as a whole.

pub mod fields;
pub mod keywords;
pub mod resources;
pub mod topics;

use crate::lookup::LookupTables;
use crate::report::ReportRow;
use crate::schema::{self, RawRecord, TargetRecord};

pub use keywords::{clean_keyword, extract_keywords};
pub use resources::{ResourceError, build_resources, parse_size};
pub use topics::{TopicsSubjects, map_topics, normalize_topic};

pub const NO_SUMMARY_EN: &str = "No title provided";
pub const NO_SUMMARY_FR: &str = "Pas de titre prévu";
pub const DEFAULT_BROWSE_GRAPHIC: &str = "/static/img/canada_default.png";
pub const DEFAULT_MODIFIED_DATE: &str = "2000-01-01";

// Rejection reasons
pub const MISSING_TITLE_EN: &str = "Missing English Title";
pub const MISSING_TITLE_FR: &str = "Missing French Title";
pub const MISMATCHED_IDS: &str = "English and French records have different IDs";
pub const NO_TOPICS: &str = "No GC Topics";
pub const NO_SUBJECTS: &str = "No GC Subjects";
pub const MISSING_KEYWORDS_EN: &str = "Missing English Keywords";
pub const MISSING_KEYWORDS_FR: &str = "Missing French Keywords";
pub const MISSING_DATE_PUBLISHED: &str = "Missing Date Published";
pub const MISSING_PRESENTATION_FORM: &str = "Missing Presentation Form";
pub const BAD_RESOURCES: &str = "Unable to process resources";

/// Reasons collected while transforming one pair
#[derive(Debug, Default)]
struct Reasons(Vec<String>);

impl Reasons {
    /// Record `reason` if `field` is absent; pass the value through either way.
    fn require<T>(&mut self, field: Option<T>, reason: &str) -> Option<T> {
        if field.is_none() {
            self.0.push(reason.to_string());
        }
        field
    }

    fn check(&mut self, ok: bool, reason: &str) {
        if !ok {
            self.0.push(reason.to_string());
        }
    }

    fn push(&mut self, reason: String) {
        self.0.push(reason);
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Convert one English/French pair.
///
/// Returns the record only if every mandatory field is present; the report row
/// is always produced and lists every failed rule.
pub fn transform(
    en: &RawRecord,
    fr: &RawRecord,
    tables: &LookupTables,
) -> (Option<TargetRecord>, ReportRow) {
    let mut reasons = Reasons::default();

    reasons.check(en.id == fr.id, MISMATCHED_IDS);
    let title = reasons.require(fields::title(en), MISSING_TITLE_EN);
    let title_fra = reasons.require(fields::title(fr), MISSING_TITLE_FR);

    let summary = fields::summary(en);
    let summary_fra = fields::summary(fr);

    let TopicsSubjects { topics, subjects } = map_topics(&en.topic_categories, tables);
    reasons.check(!topics.is_empty(), NO_TOPICS);
    reasons.check(!subjects.is_empty(), NO_SUBJECTS);

    let keywords = extract_keywords(en);
    let keywords_fra = extract_keywords(fr);
    reasons.check(!keywords.is_empty(), MISSING_KEYWORDS_EN);
    reasons.check(!keywords_fra.is_empty(), MISSING_KEYWORDS_FR);

    let date_published = reasons.require(fields::publication_date(en), MISSING_DATE_PUBLISHED);
    let presentation_form = reasons.require(
        fields::presentation_form(en, tables),
        MISSING_PRESENTATION_FORM,
    );

    let browse_graphic = fields::browse_graphic(en);
    let series = fields::series(en);
    let series_fra = fields::series(fr);
    let series_issue = fields::series_issue(en);
    let series_issue_fra = fields::series_issue(fr);

    let resources = match build_resources(&en.files, &fr.files, tables) {
        Ok(resources) => resources,
        Err(e) => {
            reasons.push(format!("{BAD_RESOURCES}: {e}"));
            Vec::new()
        }
    };

    let report = ReportRow {
        id: en.id.clone(),
        passed: reasons.is_empty(),
        title_en: title.unwrap_or_default().to_string(),
        title_fr: title_fra.unwrap_or_default().to_string(),
        summary_en: summary.is_some(),
        summary_fr: summary_fra.is_some(),
        topics: !topics.is_empty(),
        keywords: !keywords.is_empty() && !keywords_fra.is_empty(),
        published_date: date_published.is_some(),
        browse_image: browse_graphic.is_some(),
        series_en: series.is_some(),
        series_fr: series_fra.is_some(),
        series_issue_en: series_issue.is_some(),
        series_issue_fr: series_issue_fra.is_some(),
        reasons: reasons.0,
    };

    let (true, Some(title), Some(title_fra), Some(date_published), Some(presentation_form)) =
        (report.passed, title, title_fra, date_published, presentation_form)
    else {
        return (None, report);
    };

    let record = TargetRecord {
        id: en.id.clone(),
        name: "",
        title: title.to_string(),
        title_fra: title_fra.to_string(),
        notes: summary.unwrap_or(NO_SUMMARY_EN).to_string(),
        notes_fra: summary_fra.unwrap_or(NO_SUMMARY_FR).to_string(),
        author_email: schema::AUTHOR_EMAIL,
        language: schema::LANGUAGE,
        owner_org: schema::OWNER_ORG,
        department_number: schema::DEPARTMENT_NUMBER,
        catalog_type: schema::CATALOG_TYPE,
        subject: subjects,
        topic_category: topics,
        keywords,
        keywords_fra,
        license_id: schema::LICENSE_ID,
        attribution: schema::ATTRIBUTION,
        attribution_fra: schema::ATTRIBUTION_FRA,
        geographic_region: fields::region(en, tables).unwrap_or_default().to_string(),
        spatial: fields::spatial(en).unwrap_or_default(),
        date_published: date_published.to_string(),
        spatial_representation_type: schema::SPATIAL_REPRESENTATION_TYPE,
        presentation_form: presentation_form.to_string(),
        browse_graphic_url: browse_graphic.unwrap_or(DEFAULT_BROWSE_GRAPHIC).to_string(),
        date_modified: fields::modified_date(en)
            .unwrap_or(DEFAULT_MODIFIED_DATE)
            .to_string(),
        maintenance_and_update_frequency: schema::MAINTENANCE_FREQUENCY,
        data_series_name: series.unwrap_or_default().to_string(),
        data_series_name_fra: series_fra.unwrap_or_default().to_string(),
        data_series_issue_identification: series_issue.unwrap_or_default().to_string(),
        data_series_issue_identification_fra: series_issue_fra.unwrap_or_default().to_string(),
        digital_object_identifier: fields::external_identifier(en)
            .unwrap_or_default()
            .to_string(),
        time_period_coverage_start: "",
        time_period_coverage_end: "",
        url: fields::canonical_url(en).unwrap_or_default().to_string(),
        url_fra: fields::canonical_url(fr).unwrap_or_default().to_string(),
        endpoint_url: schema::ENDPOINT_URL,
        endpoint_url_fra: schema::ENDPOINT_URL_FRA,
        ready_to_publish: true,
        portal_release_date: "",
        resources,
    };

    (Some(record), report)
}
