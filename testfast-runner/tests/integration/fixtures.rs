// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::{Result, WrapErr};
use indoc::indoc;
use std::{
    fs,
    io::{self, Write},
};
use testfast_runner::{
    config::TestfastConfig,
    errors::WriteEventError,
    list::TestIdentity,
    reporter::{Reporter, ReporterEvent},
    runner::RunStats,
};

pub(crate) static PACKAGE: &str = "example.com/calc";

/// `go test -json -list` output for [`PACKAGE`], with tests named by `names`.
pub(crate) fn listing(names: &[&str]) -> String {
    let start = format!(r#"{{"Action":"start","Package":"{PACKAGE}"}}"#);
    let tests = names
        .iter()
        .map(|name| format!(r#"{{"Action":"output","Package":"{PACKAGE}","Output":"{name}\n"}}"#));
    let ok = format!(
        r#"{{"Action":"output","Package":"{PACKAGE}","Output":"ok  \t{PACKAGE}\t0.001s\n"}}"#
    );
    let pass = format!(r#"{{"Action":"pass","Package":"{PACKAGE}"}}"#);

    std::iter::once(start)
        .chain(tests)
        .chain([ok, pass])
        .map(|line| line + "\n")
        .collect()
}

// The fake toolchain answers two kinds of invocation:
//
// * `test -json -list . <packages>` prints the listing file and exits with the configured code.
// * `test ... -run ^<name>$ <package>` writes a coverage fragment if asked to, then passes,
//   fails (names containing `Fail`) or breaks with exit code 2 (names containing `Broken`).
//
// Every invocation is appended to a log file.
static FAKE_GO: &str = indoc! {r##"
    #!/bin/sh
    echo "$*" >> "@LOG@"

    if [ "$2" = "-json" ]; then
        cat "@LISTING@"
        if [ @LIST_EXIT@ -ne 0 ]; then
            echo "go: cannot find main module" >&2
        fi
        exit @LIST_EXIT@
    fi

    cover=""
    name=""
    while [ $# -gt 0 ]; do
        case "$1" in
            -coverprofile) cover="$2"; shift ;;
            -run) name="$2"; shift ;;
        esac
        shift
    done
    name="${name#^}"
    name="${name%\$}"

    if [ -n "$cover" ]; then
        printf 'mode: set\nexample.com/calc/%s.go:1.1,2.2 1 1\n' "$name" > "$cover"
    fi

    case "$name" in
        *Broken*)
            echo "# example.com/calc [build failed]" >&2
            exit 2
            ;;
        *Fail*)
            echo "--- FAIL: $name (0.00s)"
            echo "FAIL"
            exit 1
            ;;
    esac
    echo "ok  	example.com/calc	0.001s"
"##};

/// A Go project directory with a fake toolchain installed.
pub(crate) struct FakeGo {
    dir: Utf8TempDir,
    config: TestfastConfig,
}

impl FakeGo {
    pub(crate) fn new(names: &[&str]) -> Result<Self> {
        Self::with_listing(&listing(names), 0)
    }

    pub(crate) fn with_listing(listing: &str, list_exit_code: i32) -> Result<Self> {
        let dir = Utf8TempDir::new()?;
        let root = dir.path();
        fs::write(root.join("listing.jsonl"), listing)?;

        let script = FAKE_GO
            .replace("@LOG@", root.join("go.log").as_str())
            .replace("@LISTING@", root.join("listing.jsonl").as_str())
            .replace("@LIST_EXIT@", &list_exit_code.to_string());
        let go_path = root.join("go");
        // Write and mark the script executable from a child process, so that no thread in this
        // process holds a writable handle to it when another test forks (ETXTBSY).
        duct::cmd!("sh", "-c", r#"cat > "$1" && chmod +x "$1""#, "sh", go_path.as_str())
            .stdin_bytes(script)
            .run()
            .wrap_err("failed to install fake go")?;

        let mut config = TestfastConfig::from_sources(root, None)?;
        config.go_path = go_path.into_string();
        Ok(Self { dir, config })
    }

    pub(crate) fn root(&self) -> &Utf8Path {
        self.dir.path()
    }

    pub(crate) fn config(&self) -> &TestfastConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut TestfastConfig {
        &mut self.config
    }

    pub(crate) fn history_path(&self) -> Utf8PathBuf {
        self.config.history_file.clone()
    }

    /// Returns the arguments of every invocation so far.
    pub(crate) fn invocations(&self) -> Result<Vec<String>> {
        match fs::read_to_string(self.root().join("go.log")) {
            Ok(log) => Ok(log.lines().map(str::to_owned).collect()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }

    /// Returns the names of the tests run so far, in order.
    pub(crate) fn tests_run(&self) -> Result<Vec<String>> {
        Ok(self
            .invocations()?
            .iter()
            .filter_map(|line| {
                let mut args = line.split(' ');
                args.find(|arg| *arg == "-run")?;
                let pattern = args.next()?;
                Some(pattern.trim_start_matches('^').trim_end_matches('$').to_owned())
            })
            .collect())
    }

    /// Returns the coverage fragment paths passed to the toolchain so far, in order.
    pub(crate) fn coverage_fragments(&self) -> Result<Vec<Utf8PathBuf>> {
        Ok(self
            .invocations()?
            .iter()
            .filter_map(|line| {
                let mut args = line.split(' ');
                args.find(|arg| *arg == "-coverprofile")?;
                args.next().map(Utf8PathBuf::from)
            })
            .collect())
    }
}

pub(crate) fn id(name: &str) -> TestIdentity {
    TestIdentity::new(PACKAGE, name)
}

/// A reporter that remembers what it was told.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    pub(crate) finished: Vec<(String, bool)>,
    pub(crate) failure_details: Vec<String>,
    pub(crate) run_stats: Option<RunStats>,
    pub(crate) scheduled: Option<(usize, usize)>,
    pub(crate) history_written: Option<usize>,
}

impl Reporter for RecordingReporter {
    fn report_event(&mut self, event: ReporterEvent<'_>) -> Result<(), WriteEventError> {
        match event {
            ReporterEvent::TestFinished { record, .. } => {
                self.finished.push((record.id.name.clone(), record.passed));
                if !record.passed {
                    self.failure_details.push(record.details.clone());
                }
            }
            ReporterEvent::RunStarted { scheduled, new } => self.scheduled = Some((scheduled, new)),
            ReporterEvent::RunFinished { stats } => self.run_stats = Some(stats),
            ReporterEvent::HistoryWritten { count, .. } => self.history_written = Some(count),
            _ => {}
        }
        Ok(())
    }
}

/// A writer that fails like a closed pipe.
#[derive(Debug, Default)]
pub(crate) struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
