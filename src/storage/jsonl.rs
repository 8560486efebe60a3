//! Append-only per-project record files.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Record;

/// Open `<output_dir>/<PROJECT>.jsonl` for appending.
///
/// The handle lives for one fetch loop and is released when dropped.
pub struct RecordWriter {
    path: PathBuf,
    file: File,
}

impl RecordWriter {
    pub async fn open(output_dir: &Path, project: &str) -> Result<Self> {
        tokio::fs::create_dir_all(output_dir).await?;
        let path = output_path(output_dir, project);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per record and flush before returning.
    ///
    /// The page is serialized in full before anything is written, so an
    /// encoding error leaves the file untouched.
    pub async fn append(&mut self, records: &[Record]) -> Result<usize> {
        let page = encode_page(records)?;
        if page.is_empty() {
            return Ok(0);
        }
        self.file.write_all(&page).await?;
        self.file.flush().await?;
        Ok(records.len())
    }
}

/// One JSON line per record, newline terminated.
fn encode_page(records: &[Record]) -> Result<Vec<u8>> {
    let mut page = Vec::new();
    for record in records {
        serde_json::to_writer(&mut page, record)?;
        page.push(b'\n');
    }
    Ok(page)
}

pub fn output_path(output_dir: &Path, project: &str) -> PathBuf {
    output_dir.join(format!("{project}.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Derived;
    use tempfile::TempDir;

    fn record(id: &str) -> Record {
        Record {
            id: Some(id.to_string()),
            project: Some("TEST".to_string()),
            title: Some("Unicode ü ß".to_string()),
            status: None,
            priority: None,
            assignee: None,
            reporter: None,
            labels: vec![],
            created_at: None,
            updated_at: None,
            description: "line one\nline two".to_string(),
            comments: vec![],
            url: format!("https://example.org/browse/{id}"),
            derived: Derived::default(),
        }
    }

    #[tokio::test]
    async fn test_append_across_handles() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");

        let mut writer = RecordWriter::open(&dir, "TEST").await.unwrap();
        writer.append(&[record("TEST-1"), record("TEST-2")]).await.unwrap();
        drop(writer);

        let mut writer = RecordWriter::open(&dir, "TEST").await.unwrap();
        writer.append(&[record("TEST-3")]).await.unwrap();
        assert_eq!(writer.path(), dir.join("TEST.jsonl"));
        drop(writer);

        let content = tokio::fs::read_to_string(dir.join("TEST.jsonl")).await.unwrap();
        let ids: Vec<String> = content
            .lines()
            .map(|line| serde_json::from_str::<Record>(line).unwrap().id.unwrap())
            .collect();
        assert_eq!(ids, vec!["TEST-1", "TEST-2", "TEST-3"]);
    }

    #[test]
    fn test_page_is_encoded_as_whole_lines() {
        let page = encode_page(&[record("TEST-1"), record("TEST-2")]).unwrap();
        let text = String::from_utf8(page).unwrap();

        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 2);
        assert!(text.lines().all(|line| line.starts_with('{') && line.ends_with('}')));
        assert!(encode_page(&[]).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();

        let mut writer = RecordWriter::open(tmp.path(), "TEST").await.unwrap();
        assert_eq!(writer.append(&[]).await.unwrap(), 0);
        drop(writer);

        let content = tokio::fs::read(output_path(tmp.path(), "TEST")).await.unwrap();
        assert!(content.is_empty());
    }
}
