//! Shared utilities for integration tests.
//!
//! A [`Toolbox`] is a temp directory of fake `python`, `gunicorn` and `celery`
//! scripts. Each one appends its name and arguments to a shared log so tests
//! can assert on the exact order of invocations.

#![allow(dead_code)]

use std::fs;
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct Toolbox {
    dir: TempDir,
    log: PathBuf,
}

impl Toolbox {
    /// Every tool succeeds.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let toolbox = Self { dir, log };
        toolbox.script("python", None);
        toolbox.script("gunicorn", None);
        toolbox.script("celery", None);
        toolbox
    }

    /// `python manage.py <subcommand>` exits with `code`.
    pub fn failing_manage(subcommand: &str, code: i32) -> Self {
        let toolbox = Self::new();
        toolbox.script("python", Some((subcommand, code)));
        toolbox
    }

    /// The fake server exits with `code`.
    pub fn failing_server(code: i32) -> Self {
        let toolbox = Self::new();
        let body = format!(
            "#!/bin/sh\necho \"gunicorn $*\" >> \"{}\"\nexit {}\n",
            toolbox.log.display(),
            code
        );
        toolbox.write("gunicorn", &body);
        toolbox
    }

    pub fn path(&self, tool: &str) -> String {
        self.dir.path().join(tool).display().to_string()
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Logged invocations, one per line, with the tool path stripped.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn script(&self, name: &str, fail: Option<(&str, i32)>) {
        let mut body = format!(
            "#!/bin/sh\necho \"{} $*\" >> \"{}\"\n",
            name,
            self.log.display()
        );
        if let Some((subcommand, code)) = fail {
            body.push_str(&format!(
                "if [ \"$2\" = \"{}\" ]; then exit {}; fi\n",
                subcommand, code
            ));
        }
        body.push_str("exit 0\n");
        self.write(name, &body);
    }

    fn write(&self, name: &str, body: &str) {
        let path = self.dir.path().join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
