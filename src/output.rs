use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::RunStamp;
use crate::player::JerseyMap;
use crate::xml::render_document;

pub const LATEST_SUFFIX: &str = "latest";

/// One logical output rendered in both formats.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub stem: String,
    pub json: String,
    pub xml: String,
}

impl Artifact {
    pub fn document<T: Serialize>(stem: &str, value: &T, xml_root: &str, xml_item: &str) -> Result<Self> {
        let value = serde_json::to_value(value).with_context(|| format!("serialize {stem}"))?;
        Ok(Self {
            stem: stem.to_string(),
            json: to_pretty(stem, &value)?,
            xml: render_document(xml_root, xml_item, &value),
        })
    }

    /// Jersey maps are objects in JSON but repeated elements in XML, since a
    /// jersey number is not an element name.
    pub fn jersey_map(stem: &str, map: &JerseyMap, xml_root: &str, xml_item: &str) -> Result<Self> {
        let value = serde_json::to_value(map).with_context(|| format!("serialize {stem}"))?;
        let records = Value::Array(
            map.records()
                .map(|record| Value::Object(record.to_map()))
                .collect(),
        );
        Ok(Self {
            stem: stem.to_string(),
            json: to_pretty(stem, &value)?,
            xml: render_document(xml_root, xml_item, &records),
        })
    }
}

fn to_pretty(stem: &str, value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).with_context(|| format!("render {stem} json"))
}

/// Dated and latest names for a stem: json then xml, dated first.
pub fn file_names(stem: &str, stamp: &RunStamp) -> [String; 4] {
    let date = stamp.date_label();
    [
        format!("{stem}_{date}.json"),
        format!("{stem}_{date}.xml"),
        format!("{stem}_{LATEST_SUFFIX}.json"),
        format!("{stem}_{LATEST_SUFFIX}.xml"),
    ]
}

pub fn expected_files<S: AsRef<str>>(stems: &[S], stamp: &RunStamp) -> Vec<String> {
    stems
        .iter()
        .flat_map(|stem| file_names(stem.as_ref(), stamp))
        .collect()
}

pub fn write_artifact(dir: &Path, artifact: &Artifact, stamp: &RunStamp) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("create output dir {}", dir.display()))?;
    let mut written = Vec::with_capacity(4);
    for name in file_names(&artifact.stem, stamp) {
        let path = dir.join(&name);
        let contents = if name.ends_with(".json") {
            &artifact.json
        } else {
            &artifact.xml
        };
        write_atomic(&path, contents)?;
        info!("Written {name}");
        written.push(path);
    }
    Ok(written)
}

/// Writes through a sibling temp file and renames it over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension(tmp_extension(path));
    fs::write(&tmp, contents).with_context(|| format!("write {}", tmp.display()))?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err).with_context(|| format!("swap {}", path.display()));
    }
    Ok(())
}

fn tmp_extension(path: &Path) -> String {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{ext}.tmp"),
        None => "tmp".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn file_names_include_dated_and_latest() {
        let stamp = RunStamp::fixed(Utc.with_ymd_and_hms(2025, 10, 3, 12, 0, 0).unwrap());
        assert_eq!(
            file_names("all_teams_2025_stats", &stamp),
            [
                "all_teams_2025_stats_2025-10-03.json".to_string(),
                "all_teams_2025_stats_2025-10-03.xml".to_string(),
                "all_teams_2025_stats_latest.json".to_string(),
                "all_teams_2025_stats_latest.xml".to_string(),
            ]
        );
        assert_eq!(expected_files(&["a", "b"], &stamp).len(), 8);
    }

    #[test]
    fn failed_swap_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join(format!("pims_swap_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let target = dir.join("all_teams_2025_stats_latest.json");
        fs::create_dir_all(target.join("occupied")).unwrap();

        assert!(write_atomic(&target, "{}").is_err());
        assert!(!dir.join("all_teams_2025_stats_latest.json.tmp").exists());
        assert!(target.is_dir());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn tmp_extension_keeps_original() {
        assert_eq!(tmp_extension(Path::new("x/a.json")), "json.tmp");
        assert_eq!(tmp_extension(Path::new("x/a")), "tmp");
    }
}
