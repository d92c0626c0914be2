//! npm 탐지기
//!
//! `package-lock.json`이 있으면 도구 없이 lockfile만으로 추출합니다.

use std::path::Path;

use crate::detector::EcosystemDetector;
use crate::types::Ecosystem;
use crate::version::{ToolVersion, VersionParseError, parse_npm_version};

/// npm lockfile 이름
pub const NPM_LOCKFILE: &str = "package-lock.json";

#[derive(Debug, Clone, Copy, Default)]
pub struct NpmDetector;

impl EcosystemDetector for NpmDetector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn manifest_files(&self) -> &'static [&'static str] {
        &["package.json", NPM_LOCKFILE]
    }

    fn system_tools(&self) -> &'static [&'static str] {
        if cfg!(windows) { &["npm.cmd"] } else { &["npm"] }
    }

    fn version_args(&self) -> &'static [&'static str] {
        &["--version"]
    }

    fn parse_version(&self, output: &str) -> Result<ToolVersion, VersionParseError> {
        parse_npm_version(output)
    }

    fn requires_tool(&self, dir: &Path) -> bool {
        !dir.join(NPM_LOCKFILE).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockfile_removes_tool_requirement() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert!(NpmDetector.applies_to(dir.path()));
        assert!(NpmDetector.requires_tool(dir.path()));

        std::fs::write(dir.path().join(NPM_LOCKFILE), "{}").unwrap();
        assert!(!NpmDetector.requires_tool(dir.path()));
    }

    #[test]
    fn npm_has_no_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(NpmDetector.candidates(dir.path()).len(), 1);
    }
}
