//! collection of raw configuration texts
//!
//! [ConfSources] tracks the text of every loaded file together with its name and size. Sources are parsed
//! independently of each other, see [crate::document::ConfDocument::load].
use std::path::Path;

/// One input file's text after extraction
#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct RawSource {
    pub file_name: String,
    pub size: u64,
    pub content: String,
}

impl RawSource {
    pub fn from_text(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self::new(file_name.into(), content.len() as u64, content)
    }
}

#[derive(Default, Debug)]
pub struct ConfSources {
    sources: Vec<RawSource>,
}

impl ConfSources {
    pub fn insert(&mut self, source: RawSource) {
        self.sources.push(source);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl ConfSources {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let content = std::fs::read_to_string(&file_path)?;
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.display().to_string());

        self.insert(RawSource::from_text(file_name, content));
        Ok(())
    }

    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];

        let read_dir = std::fs::read_dir(dir_path)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let is_conf_file = dir_entry.file_name().to_string_lossy().ends_with(".conf");
            if !is_conf_file {
                continue;
            }

            file_paths.push(dir_entry.path());
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound);
        }

        // read_dir order is platform dependent, merge order must not be
        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No .conf files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

impl From<RawSource> for ConfSources {
    fn from(value: RawSource) -> Self {
        let mut sources = ConfSources::default();
        sources.insert(value);
        sources
    }
}

/// Utility macro to create [ConfSources]
///
/// Create from a single text
/// ```
/// # use bigconf::conf_sources;
/// conf_sources!("ltm node /Common/n1 {\n    address 10.0.0.1\n}");
/// ```
///
/// Create from multiple texts (file name required)
/// ```
/// # use bigconf::conf_sources;
/// conf_sources! {
///   "bigip.conf" => "ltm node /Common/n1 {\n    address 10.0.0.1\n}",
///   "bigip_gtm.conf" => "gtm datacenter /Common/dc1 { }"
/// };
/// ```
#[macro_export]
macro_rules! conf_sources {
    // single text without file name
    { $expr:expr } => {
        $crate::sources::ConfSources::from($crate::sources::RawSource::from_text("stdin", $expr))
    };
    // multiple texts with file names
    { $($source:expr => $expr:expr),+ } => {{
        let mut sources = $crate::sources::ConfSources::default();
        $(
            sources.insert($crate::sources::RawSource::from_text($source, $expr));
        )+

        sources
    }};
}
