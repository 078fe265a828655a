//! Archive fixtures for installer and pipeline tests.

use std::io::{Cursor, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

enum FixtureEntry {
    File {
        name: String,
        contents: Vec<u8>,
    },
    Directory {
        name: String,
    },
}

/// Builder for in-memory zip archives.
///
/// Entry names are written exactly as given, so fixtures can carry traversal
/// attempts (`../../evil.txt`) or Windows separators (`dir\file.txt`).
#[derive(Default)]
pub struct ZipFixture {
    entries: Vec<FixtureEntry>,
}

impl ZipFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file entry.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, contents: impl AsRef<[u8]>) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.into(),
            contents: contents.as_ref().to_vec(),
        });
        self
    }

    /// Add a directory entry. A trailing `/` is appended if missing.
    #[must_use]
    pub fn dir(mut self, name: impl Into<String>) -> Self {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        self.entries.push(FixtureEntry::Directory {
            name,
        });
        self
    }

    /// Serialize the archive.
    ///
    /// # Panics
    ///
    /// Panics if the zip writer fails, which only happens on programming errors.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        for entry in &self.entries {
            match entry {
                FixtureEntry::File {
                    name,
                    contents,
                } => {
                    writer.start_file(name.as_str(), options).expect("start zip entry");
                    writer.write_all(contents).expect("write zip entry");
                }
                FixtureEntry::Directory {
                    name,
                } => {
                    writer.add_directory(name.as_str(), options).expect("add zip directory");
                }
            }
        }

        writer.finish().expect("finish zip archive").into_inner()
    }

    /// Serialize the archive to a file, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics on I/O failure.
    pub fn write_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture parent");
        }
        std::fs::write(path, self.build()).expect("write zip fixture");
    }
}
