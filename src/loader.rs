//! Readers turning JSON and CSV/TSV input into raw records.

use csv::{ReaderBuilder, Trim};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::normalization::fields::CSV_INTEGER_FIELDS;
use crate::normalization::RawRecord;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid json: {0}")]
    Shape(&'static str),
    #[error("cannot tell the format of {}; pass it explicitly", .0.display())]
    UnknownFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    /// Guess from the extension (`.json`, `.csv`, `.tsv`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(FileFormat::Json),
            "csv" | "tsv" => Some(FileFormat::Csv),
            _ => None,
        }
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// One object or an array of objects.
pub fn parse_json_str(text: &str) -> Result<Vec<RawRecord>, LoadError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(obj) => Ok(vec![obj]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(obj) => Ok(obj),
                _ => Err(LoadError::Shape("array elements must be objects")),
            })
            .collect(),
        _ => Err(LoadError::Shape("expected an object or an array of objects")),
    }
}

/// Tab when the text contains one, comma otherwise.
pub fn detect_delimiter(text: &str) -> u8 {
    if text.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

/// Header row gives the keys; cells stay strings except the scraper's
/// integer fields, which are parsed when they can be.
pub fn parse_csv_str(text: &str) -> Result<Vec<RawRecord>, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None)
        .delimiter(detect_delimiter(text))
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();

    let mut records = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let mut row: RawRecord = headers
            .iter()
            .zip(rec.iter())
            .map(|(h, cell)| (h.to_string(), Value::from(cell)))
            .collect();
        coerce_integers(&mut row);
        records.push(row);
    }
    Ok(records)
}

fn coerce_integers(row: &mut RawRecord) {
    for field in CSV_INTEGER_FIELDS {
        let parsed = match row.get(*field) {
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if let Some(n) = parsed {
            row.insert((*field).to_string(), Value::from(n));
        }
    }
}

pub fn load_json(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, LoadError> {
    let path = path.as_ref();
    let records = parse_json_str(&read(path)?)?;
    debug!(path = %path.display(), records = records.len(), "loaded json");
    Ok(records)
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<RawRecord>, LoadError> {
    let path = path.as_ref();
    let records = parse_csv_str(&read(path)?)?;
    debug!(path = %path.display(), records = records.len(), "loaded csv");
    Ok(records)
}

/// Load with an explicit format, or one inferred from the extension.
pub fn load_file(
    path: impl AsRef<Path>,
    format: Option<FileFormat>,
) -> Result<Vec<RawRecord>, LoadError> {
    let path = path.as_ref();
    match format.or_else(|| FileFormat::from_path(path)) {
        Some(FileFormat::Json) => load_json(path),
        Some(FileFormat::Csv) => load_csv(path),
        None => Err(LoadError::UnknownFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_file(ext: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("viral-ingest-{}.{ext}", uuid::Uuid::new_v4()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn single_object_becomes_one_record() {
        let path = temp_file("json", r#"{"url": "https://x/1", "likesCount": 5}"#);
        let records = load_json(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("likesCount"), Some(&json!(5)));
    }

    #[test]
    fn array_keeps_every_record_in_order() {
        let records =
            parse_json_str(r#"[{"url": "a"}, {"url": "b"}, {"url": "c"}]"#).unwrap();
        let urls: Vec<_> = records.iter().map(|r| r["url"].as_str().unwrap()).collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
    }

    #[test]
    fn rejects_non_object_elements_and_bad_json() {
        assert!(matches!(
            parse_json_str(r#"[{"url": "a"}, 3]"#),
            Err(LoadError::Shape(_))
        ));
        assert!(matches!(parse_json_str("\"text\""), Err(LoadError::Shape(_))));
        assert!(matches!(parse_json_str("{not json"), Err(LoadError::Json(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
        assert!(matches!(load_json(&path), Err(LoadError::NotFound(p)) if p == path));
    }

    #[test]
    fn csv_coerces_integer_fields_best_effort() {
        let path = temp_file(
            "csv",
            "url,likesCount,videoDuration,commentsCount,industry\n\
             https://x/1,75000, 28 ,lots,Fitness\n\
             https://x/2,,,12,Tech\n",
        );
        let records = load_csv(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["likesCount"], json!(75000));
        assert_eq!(records[0]["videoDuration"], json!(28));
        assert_eq!(records[0]["commentsCount"], json!("lots"));
        assert_eq!(records[0]["industry"], json!("Fitness"));
        assert_eq!(records[1]["likesCount"], json!(""));
        assert_eq!(records[1]["commentsCount"], json!(12));
    }

    #[test]
    fn csv_leaves_other_numeric_looking_cells_as_text() {
        let records = parse_csv_str("url,views\nhttps://x/1,2500000\n").unwrap();
        assert_eq!(records[0]["views"], json!("2500000"));
    }

    #[test]
    fn tab_separated_input_is_detected() {
        let text = "url\tlikesCount\nhttps://x/1\t10\n";
        assert_eq!(detect_delimiter(text), b'\t');
        let records = parse_csv_str(text).unwrap();
        assert_eq!(records[0]["likesCount"], json!(10));
    }

    #[test]
    fn quoted_cells_keep_embedded_commas() {
        let records =
            parse_csv_str("template,category\n\"POV: You're {a}, then {b}\",Relatable\n").unwrap();
        assert_eq!(records[0]["template"], json!("POV: You're {a}, then {b}"));
    }

    #[test]
    fn format_follows_extension_unless_given() {
        assert_eq!(FileFormat::from_path(Path::new("a.TSV")), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_path(Path::new("a.json")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("a.txt")), None);

        let path = temp_file("txt", "url\nhttps://x/1\n");
        assert!(matches!(load_file(&path, None), Err(LoadError::UnknownFormat(_))));
        assert_eq!(load_file(&path, Some(FileFormat::Csv)).unwrap().len(), 1);
        fs::remove_file(&path).ok();
    }
}
