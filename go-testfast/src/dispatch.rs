// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts, OutputWriter, StderrStyles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::io::Write;
use testfast_metadata::TestfastExitCode;
use testfast_runner::{
    config::TestfastConfig,
    list::{TestIdentity, TestList},
    record::{RecordStore, TestRecordSet},
    reporter::LogReporter,
    runner::{RunStatus, run_and_persist},
};
use tracing::debug;

/// Run Go tests one at a time, retrying the last failures first.
///
/// Outcomes are recorded in a history file. On the next run, tests without history run first,
/// followed by tests that failed last time, followed by everything else. The run stops at the
/// first failing test.
#[derive(Debug, Parser)]
#[command(
    version,
    bin_name = "go-testfast",
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct TestfastApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl TestfastApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Run(opts) => opts.exec(output_writer),
            Command::List(opts) => opts.exec(output_writer),
            Command::ShowHistory(opts) => opts.exec(&output.stderr_styles(), output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover tests, run them in history order and update the history
    ///
    /// Tests run one at a time, each in its own `go test` invocation. The run stops at the first
    /// failing test, whose output is printed to stderr.
    Run(RunOpts),

    /// List the tests in the project without running them
    List(ListOpts),

    /// Print the recorded history, failed tests first
    ShowHistory(ShowHistoryOpts),
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Project options")]
struct ProjectOpts {
    /// Root directory of the Go project [default: current directory]
    #[arg(long, value_name = "DIR")]
    root: Option<Utf8PathBuf>,

    /// Config file [default: <root>/.config/testfast.toml]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ProjectOpts {
    fn load_config(&self) -> Result<TestfastConfig> {
        let root = match &self.root {
            Some(root) => root.clone(),
            None => current_dir()?,
        };
        let config = TestfastConfig::from_sources(root, self.config_file.as_deref())?;
        debug!("using Go toolchain `{}` in {}", config.go_path, config.root);
        Ok(config)
    }
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().map_err(|error| ExpectedError::CurrentDirFailed { error })?;
    Utf8PathBuf::try_from(dir).map_err(|error| ExpectedError::CurrentDirInvalidUtf8 { error })
}

/// Returns the history store: `history` if specified, the configured history file otherwise.
fn history_store(config: &TestfastConfig, history: Option<&Utf8Path>) -> RecordStore {
    match history {
        Some(history) => RecordStore::new(history),
        None => RecordStore::new(config.history_file.clone()),
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum MessageFormat {
    /// One line per test.
    #[default]
    Human,
    /// A pretty-printed JSON array.
    Json,
}

#[derive(Debug, Args)]
struct RunOpts {
    #[clap(flatten)]
    project: ProjectOpts,

    /// Package selector passed to `go test -list` [default: from config, `./...`]
    #[arg(long, short = 'p', value_name = "PACKAGES")]
    packages: Option<String>,

    /// History file [default: from config, `<root>/testlog.json`]
    #[arg(long, value_name = "PATH")]
    history: Option<Utf8PathBuf>,

    /// Accumulate a coverage profile across all tests run
    #[arg(long, value_name = "PATH")]
    coverprofile: Option<Utf8PathBuf>,
}

impl RunOpts {
    fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.project.load_config()?;
        let packages = self.packages.as_deref().unwrap_or(&config.packages);
        let tests = TestList::discover(&config, packages)?;
        let history = history_store(&config, self.history.as_deref());

        let mut reporter = LogReporter::new(output_writer.stderr_writer());
        let status = run_and_persist(
            &config,
            &tests,
            &history,
            self.coverprofile.as_deref(),
            &mut reporter,
        )?;

        match status {
            RunStatus::Passed => Ok(TestfastExitCode::OK),
            RunStatus::TestFailed { id } => Err(ExpectedError::TestRunFailed { id }),
        }
    }
}

#[derive(Debug, Args)]
struct ListOpts {
    #[clap(flatten)]
    project: ProjectOpts,

    /// Package selector passed to `go test -list` [default: from config, `./...`]
    #[arg(long, short = 'p', value_name = "PACKAGES")]
    packages: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FMT")]
    message_format: MessageFormat,
}

impl ListOpts {
    fn exec(self, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.project.load_config()?;
        let packages = self.packages.as_deref().unwrap_or(&config.packages);
        let tests = TestList::discover(&config, packages)?;

        let ids: Vec<&TestIdentity> = tests.iter().map(|test| &test.id).collect();
        let mut writer = output_writer.stdout_writer();
        write_test_list(&ids, self.message_format, &mut writer)
            .map_err(ExpectedError::write_output_error)?;
        Ok(TestfastExitCode::OK)
    }
}

fn write_test_list(
    ids: &[&TestIdentity],
    format: MessageFormat,
    mut writer: impl Write,
) -> std::io::Result<()> {
    match format {
        MessageFormat::Human => {
            for id in ids {
                writeln!(writer, "{id}")?;
            }
        }
        MessageFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, ids)?;
            writeln!(writer)?;
        }
    }
    writer.flush()
}

#[derive(Debug, Args)]
struct ShowHistoryOpts {
    #[clap(flatten)]
    project: ProjectOpts,

    /// History file [default: from config, `<root>/testlog.json`]
    #[arg(long, value_name = "PATH")]
    history: Option<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FMT")]
    message_format: MessageFormat,
}

impl ShowHistoryOpts {
    fn exec(self, styles: &StderrStyles, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = self.project.load_config()?;
        let records = history_store(&config, self.history.as_deref()).read()?;

        let mut writer = output_writer.stdout_writer();
        write_history(&records, self.message_format, styles, &mut writer)
            .map_err(ExpectedError::write_output_error)?;
        Ok(TestfastExitCode::OK)
    }
}

fn write_history(
    records: &TestRecordSet,
    format: MessageFormat,
    styles: &StderrStyles,
    mut writer: impl Write,
) -> std::io::Result<()> {
    match format {
        MessageFormat::Human => {
            for record in records {
                if record.passed {
                    writeln!(writer, "{} {}", "PASS".style(styles.passed), record.id)?;
                } else {
                    writeln!(writer, "{} {}", "FAIL".style(styles.failed), record.id)?;
                }
            }
        }
        MessageFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &records.summaries())?;
            writeln!(writer)?;
        }
    }
    writer.flush()
}
