//! Shared fixtures: fake project trees with shell-script build tools

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use depwatch_engine::{EngineSettings, EnvOverlay};

/// Write an executable `/bin/sh` script.
pub fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// Settings whose tool lookups only see `bin` (plus system dirs when `with_system`).
pub fn settings_for(bin: &Path, with_system: bool) -> EngineSettings {
    let path = if with_system {
        format!("{}:/usr/bin:/bin", bin.display())
    } else {
        bin.display().to_string()
    };
    EngineSettings::builder()
        .process_timeout(Duration::from_secs(10))
        .kill_grace(Duration::from_millis(500))
        .base_overlay(EnvOverlay::new().with("PATH", path))
        .build()
        .unwrap()
}

pub const GRADLE_TREE: &str = r"runtimeClasspath - Runtime classpath of source set 'main'.
+--- org.slf4j:slf4j-api:2.0.9
\--- com.google.guava:guava:32.1.2-jre
     \--- com.google.guava:failureaccess:1.0.1";

/// gradlew that answers `--version` and prints a dependency tree for `dependencies`.
pub fn gradle_wrapper_script(version: &str) -> String {
    format!(
        "case \"$*\" in\n  *--version*) echo \"Gradle {version}\" ;;\n  *dependencies*) cat <<'TREE'\n{GRADLE_TREE}\nTREE\n  ;;\n  *) exit 2 ;;\nesac"
    )
}

/// fake `go` that answers `version` and `list -m all`.
pub fn go_script() -> String {
    "case \"$1\" in\n  version) echo 'go version go1.21.3 linux/amd64' ;;\n  list) printf 'example.com/app\\ngithub.com/pkg/errors v0.9.1\\n' ;;\n  *) exit 2 ;;\nesac".to_owned()
}
