//! Speed harvester.
//!
//! One long-lived task started at process init. Each sweep walks every
//! mapped service link, queries the public feed for its processed speed,
//! and publishes the accumulated table in a single swap once the sweep is
//! complete. Individual record failures are counted and skipped; the feed
//! is paced with a short sleep between records.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::speed_table::{SpeedTable, SpeedTableHandle};

/// Pause between individual feed requests (provider rate limit).
const RECORD_DELAY: Duration = Duration::from_millis(50);

/// Per-record request timeout.
const RECORD_TIMEOUT: Duration = Duration::from_secs(5);

/// Feed result code for a successful single-record response.
const FEED_OK_CODE: &str = "INFO-000";

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Failed to read mapping file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse mapping file: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct MappingRow {
    service_link_id: String,
    osm_way_id: String,
}

/// Load the service-link → way-id mapping CSV. Rows with an empty or `NaN`
/// way id are skipped; way ids arrive as floats and are truncated.
pub fn load_mappings(path: &Path) -> Result<HashMap<String, String>, MappingError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut mapping = HashMap::new();
    let mut skipped = 0usize;

    for row in reader.deserialize::<MappingRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                debug!(error = %e, "mapping row skipped");
                skipped += 1;
                continue;
            }
        };

        let service_id = row.service_link_id.trim();
        let way_id_raw = row.osm_way_id.trim();
        if service_id.is_empty() || way_id_raw.is_empty() || way_id_raw.eq_ignore_ascii_case("nan")
        {
            skipped += 1;
            continue;
        }

        match way_id_raw.parse::<f64>() {
            Ok(way_id) => {
                mapping.insert(service_id.to_string(), format!("{}", way_id as i64));
            }
            Err(_) => {
                debug!(service_id, way_id_raw, "unparsable way id skipped");
                skipped += 1;
            }
        }
    }

    info!(loaded = mapping.len(), skipped, "service-link mapping loaded");
    Ok(mapping)
}

/// One parsed record of the speed feed.
#[derive(Debug, PartialEq)]
pub struct TrafficRecord {
    pub link_id: String,
    pub speed: f64,
}

/// Parse the feed's single-record XML response. Returns `None` unless the
/// result code reports success and both fields are present.
pub fn parse_traffic_record(xml: &str) -> Option<TrafficRecord> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current = String::new();
    let mut code: Option<String> = None;
    let mut link_id: Option<String> = None;
    let mut speed: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = String::from_utf8_lossy(e.name().as_ref()).into_owned();
            }
            Ok(Event::Text(t)) => {
                let text = t.unescape().ok()?.into_owned();
                match current.as_str() {
                    "CODE" => code = Some(text),
                    "link_id" => link_id = Some(text),
                    "prcs_spd" => speed = text.parse().ok(),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    if code.as_deref() != Some(FEED_OK_CODE) {
        return None;
    }
    Some(TrafficRecord { link_id: link_id?, speed: speed? })
}

/// The harvester task.
pub struct Harvester {
    client: reqwest::Client,
    feed_base_url: String,
    api_key: String,
    mapping: HashMap<String, String>,
    handle: Arc<SpeedTableHandle>,
    sweep_interval: Duration,
}

impl Harvester {
    pub fn new(
        feed_base_url: String,
        api_key: String,
        mapping: HashMap<String, String>,
        handle: Arc<SpeedTableHandle>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            feed_base_url,
            api_key,
            mapping,
            handle,
            sweep_interval,
        }
    }

    /// Run until shutdown: an initial sweep, then one per interval.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("initial speed sweep starting");
        self.sweep().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.sweep_interval) => {
                    info!("periodic speed sweep starting");
                    self.sweep().await;
                }
                _ = shutdown.changed() => {
                    info!("speed harvester stopping");
                    return;
                }
            }
        }
    }

    /// One full sweep over every mapped service link. Publishes only after
    /// the sweep finishes.
    async fn sweep(&self) {
        let total_links = self.mapping.len();
        let mut speeds = HashMap::new();
        let mut success = 0usize;
        let mut failed = 0usize;

        for (i, service_link) in self.mapping.keys().enumerate() {
            match self.fetch_record(service_link).await {
                Some(record) => {
                    if let Some(way_id) = self.mapping.get(&record.link_id) {
                        speeds.insert(way_id.clone(), record.speed);
                        success += 1;
                    }
                }
                None => failed += 1,
            }

            if (i + 1) % 500 == 0 {
                info!(progress = i + 1, total_links, "sweep in progress");
            }
            tokio::time::sleep(RECORD_DELAY).await;
        }

        let table = SpeedTable::new(speeds);
        if let Some(stats) = table.stats() {
            info!(
                collected = table.len(),
                success,
                failed,
                avg_speed = format!("{:.1}", stats.avg_speed),
                min_speed = stats.min_speed,
                max_speed = stats.max_speed,
                "speed sweep complete"
            );
        } else {
            warn!(success, failed, "speed sweep collected no records");
        }
        self.handle.publish(table);
    }

    async fn fetch_record(&self, service_link: &str) -> Option<TrafficRecord> {
        let url = format!(
            "{}/{}/xml/TrafficInfo/1/1/{}",
            self.feed_base_url, self.api_key, service_link
        );

        let response = self
            .client
            .get(&url)
            .timeout(RECORD_TIMEOUT)
            .send()
            .await
            .map_err(|e| debug!(service_link, error = %e, "feed request failed"))
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let body = response.text().await.ok()?;
        parse_traffic_record(&body)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_mappings_skips_bad_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service_link_id,osm_way_id").unwrap();
        writeln!(file, "1220001600,562532837.0").unwrap();
        writeln!(file, "1220001700,NaN").unwrap();
        writeln!(file, "1220001800,").unwrap();
        writeln!(file, ",123456").unwrap();
        writeln!(file, "1220001900,988776655").unwrap();
        file.flush().unwrap();

        let mapping = load_mappings(file.path()).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["1220001600"], "562532837");
        assert_eq!(mapping["1220001900"], "988776655");
    }

    #[test]
    fn test_parse_traffic_record() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <TrafficInfo>
                <RESULT><CODE>INFO-000</CODE><MESSAGE>정상 처리되었습니다</MESSAGE></RESULT>
                <row>
                    <link_id>1220001600</link_id>
                    <prcs_spd>27.5</prcs_spd>
                </row>
            </TrafficInfo>"#;

        let record = parse_traffic_record(xml).unwrap();
        assert_eq!(record.link_id, "1220001600");
        assert_eq!(record.speed, 27.5);
    }

    #[test]
    fn test_parse_rejects_error_code() {
        let xml = r#"<TrafficInfo>
            <RESULT><CODE>INFO-200</CODE></RESULT>
            <row><link_id>1</link_id><prcs_spd>30</prcs_spd></row>
        </TrafficInfo>"#;
        assert!(parse_traffic_record(xml).is_none());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let xml = r#"<TrafficInfo>
            <RESULT><CODE>INFO-000</CODE></RESULT>
            <row><link_id>1</link_id></row>
        </TrafficInfo>"#;
        assert!(parse_traffic_record(xml).is_none());
    }
}
