//! Where the gene table comes from: an explicit file, or the cached default download.

use crate::{
    config::XrefConfig,
    error::{Result, XrefError},
};
use flate2::read::GzDecoder;
use reqwest::blocking::get;
use std::{
    ffi::OsString,
    fs::{self, File},
    io::{BufWriter, Read, Write},
    path::{Path, PathBuf},
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// A table already on disk; it must exist.
    Path(PathBuf),
    /// `<working_dir>/<table_file_name>`, downloaded from `table_url` on first use.
    Default,
}

impl From<Option<PathBuf>> for TableSource {
    fn from(path: Option<PathBuf>) -> Self {
        path.map(TableSource::Path).unwrap_or(TableSource::Default)
    }
}

/// Returns a readable table path for `source`, fetching the default table when it is not cached.
pub fn resolve_table_path(source: &TableSource, config: &XrefConfig) -> Result<PathBuf> {
    match source {
        TableSource::Path(path) => {
            if path.exists() {
                Ok(path.clone())
            } else {
                Err(XrefError::TableNotFound(path.clone()))
            }
        }
        TableSource::Default => {
            let path = config.table_path();
            if !path.exists() {
                info!(
                    url = %config.table_url,
                    path = %path.display(),
                    "Default gene table not cached; downloading"
                );
                materialize_source(&config.table_url, &path)?;
                info!(path = %path.display(), "Gene table downloaded");
            }
            Ok(path)
        }
    }
}

fn is_http_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

fn is_gzip_source(source: &str) -> bool {
    source.to_ascii_lowercase().ends_with(".gz")
}

fn fetch_error(source: &str, message: impl ToString) -> XrefError {
    XrefError::Fetch {
        source_url: source.to_string(),
        message: message.to_string(),
    }
}

fn open_source_reader(source: &str) -> Result<Box<dyn Read>> {
    if is_http_source(source) {
        let response = get(source)
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(source, e))?;
        return Ok(Box::new(response));
    }
    let path = source
        .strip_prefix("file://")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(source));
    let file = File::open(&path).map_err(|e| fetch_error(source, e))?;
    Ok(Box::new(file))
}

/// Copies `source` to `destination` through a `.part` file, so an interrupted fetch never
/// leaves a truncated table behind.
pub fn materialize_source(source: &str, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp_os: OsString = destination.as_os_str().to_os_string();
    tmp_os.push(".part");
    let tmp_path = PathBuf::from(tmp_os);

    let reader = open_source_reader(source)?;
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    let copied = if is_gzip_source(source) {
        std::io::copy(&mut GzDecoder::new(reader), &mut writer)
    } else {
        let mut reader = reader;
        std::io::copy(&mut reader, &mut writer)
    };
    let copy_result = copied.and_then(|_| writer.flush());

    if let Err(e) = copy_result {
        drop(writer);
        let _ = fs::remove_file(&tmp_path);
        return Err(fetch_error(source, e));
    }
    drop(writer);
    fs::rename(&tmp_path, destination)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use tempfile::tempdir;

    const SAMPLE: &str = include_str!("../assets/hgnc_sample.txt");

    fn file_url(path: &Path) -> String {
        format!("file://{}", path.display())
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let td = tempdir().unwrap();
        let config = XrefConfig::default();
        let missing = TableSource::Path(td.path().join("absent.txt"));
        let err = resolve_table_path(&missing, &config).unwrap_err();
        assert!(err.is_configuration());

        let present = td.path().join("present.txt");
        fs::write(&present, SAMPLE).unwrap();
        assert_eq!(
            resolve_table_path(&TableSource::Path(present.clone()), &config).unwrap(),
            present
        );
    }

    #[test]
    fn test_default_table_is_fetched_once() {
        let td = tempdir().unwrap();
        let remote = td.path().join("remote.txt");
        fs::write(&remote, SAMPLE).unwrap();
        let config = XrefConfig {
            working_dir: td.path().join("data").join("hgnc"),
            table_url: file_url(&remote),
            ..Default::default()
        };

        let path = resolve_table_path(&TableSource::Default, &config).unwrap();
        assert_eq!(path, config.table_path());
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);

        // cached copy wins over the source from now on
        fs::write(&remote, "changed").unwrap();
        let again = resolve_table_path(&TableSource::Default, &config).unwrap();
        assert_eq!(fs::read_to_string(again).unwrap(), SAMPLE);
    }

    #[test]
    fn test_gzip_source_is_decompressed() {
        let td = tempdir().unwrap();
        let remote = td.path().join("hgnc.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&remote).unwrap(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let destination = td.path().join("cache").join("hgnc.txt");
        materialize_source(&file_url(&remote), &destination).unwrap();
        assert_eq!(fs::read_to_string(&destination).unwrap(), SAMPLE);
        assert!(!td.path().join("cache").join("hgnc.txt.part").exists());
    }

    #[test]
    fn test_missing_source_reports_fetch_error() {
        let td = tempdir().unwrap();
        let destination = td.path().join("hgnc.txt");
        let err = materialize_source("/definitely/not/here.txt", &destination).unwrap_err();
        assert!(matches!(err, XrefError::Fetch { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn test_source_from_option() {
        assert_eq!(TableSource::from(None), TableSource::Default);
        assert_eq!(
            TableSource::from(Some(PathBuf::from("hgnc.txt"))),
            TableSource::Path(PathBuf::from("hgnc.txt"))
        );
    }
}
