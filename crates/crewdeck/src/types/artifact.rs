use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A file in a session directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArtifactFile {
  pub name: String,
  pub path: String,
  pub size: u64,
  pub last_modified: Option<DateTime<Utc>>,
}

/// Entry of a raw directory listing as the backend reports it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DirectoryEntry {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub path: Option<String>,
  #[serde(default)]
  pub size: Option<u64>,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub last_modified: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (as UTC) or epoch seconds.
/// Anything else becomes `None` instead of failing the whole listing.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;

  let timestamp = match value {
    Some(serde_json::Value::String(text)) => parse_timestamp(&text),
    Some(serde_json::Value::Number(number)) => number
      .as_i64()
      .or_else(|| number.as_f64().map(|secs| secs as i64))
      .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
    _ => None,
  };

  if timestamp.is_none() {
    log::trace!("Ignoring unparseable last_modified");
  }

  Ok(timestamp)
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
  let text = text.trim();

  if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
    return Some(timestamp.with_timezone(&Utc));
  }

  NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
    .ok()
    .map(|naive| Utc.from_utc_datetime(&naive))
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DirectoryListing {
  #[serde(default)]
  pub files: Vec<DirectoryEntry>,
}

impl DirectoryEntry {
  pub fn named(name: impl Into<String>) -> Self {
    DirectoryEntry {
      name: Some(name.into()),
      ..Default::default()
    }
  }

  /// Converts to an artifact, dropping entries without a usable name.
  pub fn into_artifact(self, directory: &str) -> Option<ArtifactFile> {
    let name = self.name.filter(|name| !name.trim().is_empty())?;
    let path = self
      .path
      .filter(|path| !path.trim().is_empty())
      .unwrap_or_else(|| format!("{}/{}", directory.trim_end_matches('/'), name));

    Some(ArtifactFile {
      name,
      path,
      size: self.size.unwrap_or(0),
      last_modified: self.last_modified,
    })
  }
}

impl DirectoryListing {
  /// Artifacts with blank names removed, sorted by name.
  pub fn into_artifacts(self, directory: &str) -> Vec<ArtifactFile> {
    let mut artifacts: Vec<ArtifactFile> = self
      .files
      .into_iter()
      .filter_map(|entry| entry.into_artifact(directory))
      .collect();

    artifacts.sort_by(|a, b| a.name.cmp(&b.name));
    artifacts
  }
}
