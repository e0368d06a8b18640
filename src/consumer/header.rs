//! Typed document header, validated once per document

use super::error::DocumentError;
use crate::corpus::Document;
use crate::date::{format_date, format_ingest_time, parse_timestamp, reconcile_date};
use crate::extract::block_selector;
use crate::identity::derive_document_id;
use crate::storage::DocumentRow;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// Document features the consumer relies on, parsed and checked up front
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHeader {
    pub document_guid: Uuid,
    /// Identity derived from the corpus and document GUIDs
    pub identity: Uuid,
    pub title: String,
    pub response_url: String,
    pub url_key: String,
    pub domain_name: String,
    /// Raw publication date (empty if absent)
    pub pub_date: String,
    pub time_get: NaiveDateTime,
    /// Effective date after reconciliation
    pub date: NaiveDate,
    pub pump_index: f64,
    pub is_financial: bool,
    pub rev: Option<String>,
}

impl DocumentHeader {
    /// Validate a document's features.
    ///
    /// `time`, `pumpIndex` and both GUIDs are mandatory. Missing text
    /// features become empty strings and a bad `pubDate` is ignored.
    pub fn parse(corpus_guid: Option<&str>, document: &Document) -> Result<Self, DocumentError> {
        let text = |key: &str| document.feature(key).unwrap_or_default().to_string();

        let raw_time = document.feature("time").ok_or(DocumentError::MissingFeature("time"))?;
        let time_get = parse_timestamp(raw_time).ok_or_else(|| DocumentError::InvalidTimestamp {
            feature: "time",
            value: raw_time.to_string(),
        })?;
        let pub_date = text("pubDate");
        let date = reconcile_date(time_get, Some(pub_date.as_str()));

        let raw_score = document
            .feature("pumpIndex")
            .ok_or(DocumentError::MissingFeature("pumpIndex"))?;
        let pump_index = raw_score
            .trim()
            .parse::<f64>()
            .map_err(|_| DocumentError::InvalidScore(raw_score.to_string()))?;

        let corpus_guid = parse_guid("corpus", corpus_guid)?;
        let document_guid = parse_guid("document", document.feature("guid"))?;

        Ok(Self {
            document_guid,
            identity: derive_document_id(corpus_guid, document_guid),
            title: text("title"),
            response_url: text("responseUrl"),
            url_key: text("urlKey"),
            domain_name: text("domainName"),
            pub_date,
            time_get,
            date,
            pump_index,
            is_financial: parse_is_financial(document.feature("isFinancial")),
            rev: document.feature("rev").map(str::to_string),
        })
    }

    /// Authoritative block layer for this document's revision
    pub fn block_selector(&self) -> &'static str {
        block_selector(self.rev.as_deref())
    }

    /// Effective date as persisted
    pub fn date_string(&self) -> String {
        format_date(self.date)
    }

    pub fn to_row(&self) -> DocumentRow {
        DocumentRow {
            title: self.title.clone(),
            date: self.date_string(),
            pub_date: self.pub_date.clone(),
            time_get: format_ingest_time(self.time_get),
            response_url: self.response_url.clone(),
            url_key: self.url_key.clone(),
            domain_name: self.domain_name.clone(),
            is_financial: self.is_financial,
            pump_dump_index: self.pump_index,
            guid: self.identity,
        }
    }
}

/// Only the exact literal `True` counts as financial
pub fn parse_is_financial(raw: Option<&str>) -> bool {
    raw == Some("True")
}

fn parse_guid(scope: &'static str, raw: Option<&str>) -> Result<Uuid, DocumentError> {
    let raw = raw.ok_or(DocumentError::MissingGuid(scope))?;
    Uuid::parse_str(raw.trim()).map_err(|source| DocumentError::InvalidGuid {
        scope,
        value: raw.to_string(),
        source,
    })
}
