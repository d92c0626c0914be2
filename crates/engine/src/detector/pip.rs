//! pip 탐지기
//!
//! `requirements.txt`가 있으면 도구 없이 고정 버전을 읽습니다.
//! 없으면 `pip`, `pip3` 순서로 도구를 찾습니다.

use std::path::Path;

use crate::detector::EcosystemDetector;
use crate::types::Ecosystem;
use crate::version::{ToolVersion, VersionParseError, parse_pip_version};

/// pip 요구사항 파일 이름
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

#[derive(Debug, Clone, Copy, Default)]
pub struct PipDetector;

impl EcosystemDetector for PipDetector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pip
    }

    fn manifest_files(&self) -> &'static [&'static str] {
        &[REQUIREMENTS_FILE, "setup.py", "pyproject.toml", "Pipfile"]
    }

    fn system_tools(&self) -> &'static [&'static str] {
        &["pip", "pip3"]
    }

    fn version_args(&self) -> &'static [&'static str] {
        &["--version"]
    }

    fn parse_version(&self, output: &str) -> Result<ToolVersion, VersionParseError> {
        parse_pip_version(output)
    }

    fn requires_tool(&self, dir: &Path) -> bool {
        !dir.join(REQUIREMENTS_FILE).is_file()
    }
}
