// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository configuration, read from `.config/testfast.toml`.

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind},
    go_cli::default_go_path,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Testfast configuration for a Go project, with defaults applied.
#[derive(Clone, Debug)]
pub struct TestfastConfig {
    /// The project root. `go test` is run from this directory.
    pub root: Utf8PathBuf,

    /// The program used as the Go toolchain.
    pub go_path: String,

    /// Only test names starting with this prefix are picked up by discovery.
    pub test_prefix: String,

    /// The default package selector.
    pub packages: String,

    /// The default history file, already resolved against the project root.
    pub history_file: Utf8PathBuf,

    /// The exit code with which `go test` reports failing tests.
    pub test_failure_exit_code: i32,

    /// Extra arguments passed to every per-test `go test` invocation.
    pub run_args: Vec<String>,
}

impl TestfastConfig {
    /// The default location of the config within the project root.
    pub const CONFIG_PATH: &'static str = ".config/testfast.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config for the project at `root`.
    ///
    /// If `file` is `None`, the config is read from [`Self::CONFIG_PATH`] if it exists. If `file`
    /// is specified, it must exist. Unknown keys are reported with a warning.
    pub fn from_sources(
        root: impl Into<Utf8PathBuf>,
        file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_impl(root.into(), file, |config_file, unknown| {
            warn!(
                "ignoring unknown configuration keys in {config_file}: {}",
                unknown.iter().join(", ")
            );
        })
    }

    /// Returns the default config for the project at `root`.
    #[cfg(test)]
    pub(crate) fn default_config(root: impl Into<Utf8PathBuf>) -> Self {
        let root = root.into();
        let (deserialized, unknown) =
            Self::build_and_deserialize_config(&Self::make_default_config())
                .expect("default config is always valid");

        // The default config is embedded in this binary, so it can't have unknown keys.
        assert!(
            unknown.is_empty(),
            "found unknown keys in default config: {unknown:?}"
        );

        deserialized.into_config(root)
    }

    fn from_sources_impl(
        root: Utf8PathBuf,
        file: Option<&Utf8Path>,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (deserialized, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            unknown_callback(&config_file, &unknown);
        }

        Ok(deserialized.into_config(root))
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(TestfastConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: TestfastConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // serde_path_to_error already reports the key, so drop it from the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TestfastConfigDeserialize {
    #[serde(default)]
    go_path: Option<String>,
    test_prefix: String,
    packages: String,
    history_file: Utf8PathBuf,
    test_failure_exit_code: i32,
    run_args: Vec<String>,
}

impl TestfastConfigDeserialize {
    fn into_config(self, root: Utf8PathBuf) -> TestfastConfig {
        let history_file = root.join(&self.history_file);
        TestfastConfig {
            go_path: self.go_path.unwrap_or_else(default_go_path),
            test_prefix: self.test_prefix,
            packages: self.packages,
            history_file,
            test_failure_exit_code: self.test_failure_exit_code,
            run_args: self.run_args,
            root,
        }
    }
}
