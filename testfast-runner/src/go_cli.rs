// Copyright (c) The testfast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builder for `go test` invocations.

use crate::list::TestIdentity;
use camino::Utf8Path;
use std::borrow::Cow;
use tracing::debug;

/// Represents a `go test` CLI call.
#[derive(Clone, Debug)]
pub struct GoCli<'a> {
    go_path: &'a str,
    root: &'a Utf8Path,
    args: Vec<Cow<'a, str>>,
}

impl<'a> GoCli<'a> {
    /// Creates a `go test -json -list . <packages>` call, which lists tests without running them.
    pub fn list(go_path: &'a str, root: &'a Utf8Path, packages: &'a str) -> Self {
        let mut cli = Self::new(go_path, root);
        cli.add_args(["test", "-json", "-list", "."]).add_arg(packages);
        cli
    }

    /// Creates a call that runs exactly one test.
    ///
    /// The test name is anchored so that `Test_Foo` doesn't also select `Test_FooBar`. If
    /// `cover_profile` is provided, `go test` writes the coverage profile for this test there.
    pub fn run_test(
        go_path: &'a str,
        root: &'a Utf8Path,
        id: &TestIdentity,
        cover_profile: Option<&'a Utf8Path>,
        extra_args: &'a [String],
    ) -> Self {
        let mut cli = Self::new(go_path, root);
        cli.add_arg("test").add_args(extra_args.iter().map(|arg| arg.as_str()));
        if let Some(cover_profile) = cover_profile {
            cli.add_arg("-coverprofile").add_arg(cover_profile.as_str());
        }
        cli.add_arg("-run")
            .add_arg(format!("^{}$", id.name))
            .add_arg(id.package.clone());
        cli
    }

    fn new(go_path: &'a str, root: &'a Utf8Path) -> Self {
        Self {
            go_path,
            root,
            args: vec![],
        }
    }

    fn add_arg(&mut self, arg: impl Into<Cow<'a, str>>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    fn add_args<I>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Cow<'a, str>>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the program followed by all arguments, for display.
    pub fn all_args(&self) -> Vec<&str> {
        let mut all_args = vec![self.go_path];
        all_args.extend(self.args.iter().map(|s| &**s));
        all_args
    }

    /// Returns the command line as a single string, for error messages.
    pub fn command_string(&self) -> String {
        self.all_args().join(" ")
    }

    /// Converts the command to a [`duct::Expression`] running in the project root.
    pub fn to_expression(&self) -> duct::Expression {
        debug!("executing `{}` in {}", self.command_string(), self.root);
        duct::cmd(self.go_path, self.args.iter().map(|arg| &**arg))
            .dir(self.root.as_std_path())
    }
}

/// Returns the default Go toolchain: the `GO` environment variable if set, `go` otherwise.
pub fn default_go_path() -> String {
    match std::env::var("GO") {
        Ok(go_path) if !go_path.is_empty() => go_path,
        _ => "go".to_owned(),
    }
}
