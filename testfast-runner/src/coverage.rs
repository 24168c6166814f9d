// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accumulating one coverage profile across many single-test runs.
//!
//! Each `go test -coverprofile` invocation writes a complete profile: a `mode:` header line
//! followed by one line per covered block. Running tests one at a time produces one such fragment
//! per test. They're stitched together by keeping the header from the first fragment and appending
//! the bodies of all of them.

use crate::errors::CoverageError;
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempPath;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, BufWriter, Write},
};
use tracing::debug;

/// The coverage profile accumulated over a run.
#[derive(Clone, Debug)]
pub struct CoverageProfile {
    path: Utf8PathBuf,
}

impl CoverageProfile {
    /// Starts a new profile at `path`, removing any profile left over from a previous run.
    pub fn create(path: impl Into<Utf8PathBuf>) -> Result<Self, CoverageError> {
        let path = path.into();
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed stale coverage profile at {path}"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(CoverageError::RemoveStale { path, error }),
        }
        Ok(Self { path })
    }

    /// Returns the path to the accumulated profile.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Reserves a temporary file for one test's coverage fragment.
    pub fn new_fragment(&self) -> Result<CoverageFragment, CoverageError> {
        let path = camino_tempfile::Builder::new()
            .prefix("testfast-coverage-")
            .suffix(".out")
            .tempfile()
            .map_err(|error| CoverageError::CreateFragment { error })?
            .into_temp_path();
        Ok(CoverageFragment { path })
    }

    /// Appends `fragment` to the profile and deletes the fragment.
    ///
    /// The fragment's header line is written only if the profile is still empty.
    pub fn append(&self, fragment: CoverageFragment) -> Result<(), CoverageError> {
        let fragment_file = match File::open(fragment.path()) {
            Ok(file) => file,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("no coverage fragment at {}, skipping", fragment.path());
                return Ok(());
            }
            Err(error) => {
                return Err(CoverageError::OpenFragment {
                    path: fragment.path().to_owned(),
                    error,
                });
            }
        };

        let mut profile = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|error| CoverageError::OpenProfile {
                path: self.path.clone(),
                error,
            })?;

        let append_error = |error| CoverageError::Append {
            path: self.path.clone(),
            fragment: fragment.path().to_owned(),
            error,
        };

        let has_header = profile.metadata().map_err(append_error)?.len() > 0;
        append_fragment_lines(BufReader::new(fragment_file), &mut profile, has_header)
            .map_err(append_error)?;

        // Dropping the fragment here removes the temporary file.
        Ok(())
    }
}

/// A temporary file that one `go test` invocation writes its coverage profile to.
///
/// The file is deleted when this is dropped, whether or not it was appended to the profile.
#[derive(Debug)]
pub struct CoverageFragment {
    path: Utf8TempPath,
}

impl CoverageFragment {
    /// Returns the path of the fragment.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// Copies the lines of `fragment` to `profile`, skipping the first line if `skip_header` is set.
fn append_fragment_lines(
    fragment: impl BufRead,
    profile: impl Write,
    skip_header: bool,
) -> io::Result<()> {
    let mut writer = BufWriter::new(profile);
    let mut lines = fragment.lines();
    if skip_header {
        lines.next().transpose()?;
    }
    for line in lines {
        writeln!(writer, "{}", line?)?;
    }
    writer.flush()
}
