//! Download of task attachments from the scoring service.

use crate::error::{Result, SleuthError};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Reject names that would escape the download directory.
pub fn validate_file_name(file_name: &str) -> Result<&str> {
    let name = file_name.trim();
    let is_bare = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0');

    if is_bare {
        Ok(name)
    } else {
        Err(SleuthError::InvalidInput(format!(
            "Invalid file name '{}': expected a bare file name",
            file_name
        )))
    }
}

/// URL of the attachment for `task_id`.
pub fn task_file_url(base_url: &str, task_id: &str) -> Result<url::Url> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(SleuthError::InvalidInput("task_id must not be empty".to_string()));
    }

    let mut url = url::Url::parse(base_url).map_err(|e| {
        SleuthError::Config(format!("Invalid scoring API URL '{}': {}", base_url, e))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            SleuthError::Config(format!("Scoring API URL cannot be a base: {}", base_url))
        })?
        .pop_if_empty()
        .push("files")
        .push(task_id);
    Ok(url)
}

/// Stream the attachment of `task_id` into `dir/file_name` and return the path.
#[instrument(skip(http, base_url, dir))]
pub async fn download_task_file(
    http: &reqwest::Client,
    base_url: &str,
    task_id: &str,
    file_name: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let file_name = validate_file_name(file_name)?;
    let url = task_file_url(base_url, task_id)?;

    tokio::fs::create_dir_all(dir).await?;
    let filepath = dir.join(file_name);

    info!("Downloading {} to {}", url, filepath.display());

    let mut response = http.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(SleuthError::Download(format!(
            "server returned {} for {}",
            response.status(),
            url
        )));
    }

    let mut file = tokio::fs::File::create(&filepath).await?;
    let mut written = 0usize;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;

    debug!("Wrote {} bytes", written);
    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_name() {
        assert_eq!(validate_file_name("data.xlsx").unwrap(), "data.xlsx");
        assert_eq!(validate_file_name(" audio.mp3 ").unwrap(), "audio.mp3");
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("dir\\file").is_err());
    }

    #[test]
    fn test_task_file_url() {
        let url =
            task_file_url("https://agents-course-unit4-scoring.hf.space", "cca530fc-4052").unwrap();
        assert_eq!(
            url.as_str(),
            "https://agents-course-unit4-scoring.hf.space/files/cca530fc-4052"
        );

        let trailing = task_file_url("https://example.com/api/", "abc").unwrap();
        assert_eq!(trailing.as_str(), "https://example.com/api/files/abc");
    }

    #[test]
    fn test_task_id_is_path_encoded() {
        let url = task_file_url("https://example.com", "a/b").unwrap();
        assert_eq!(url.as_str(), "https://example.com/files/a%2Fb");
        assert!(task_file_url("https://example.com", " ").is_err());
    }
}
