//! Maven 탐지기
//!
//! `mvnw` 래퍼를 먼저 시도하고 시스템 `mvn`으로 대체합니다.

use crate::config::EngineSettings;
use crate::detector::EcosystemDetector;
use crate::process::EnvOverlay;
use crate::types::Ecosystem;
use crate::version::{ToolVersion, VersionParseError, parse_maven_version};

#[derive(Debug, Clone, Copy, Default)]
pub struct MavenDetector;

impl EcosystemDetector for MavenDetector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    fn manifest_files(&self) -> &'static [&'static str] {
        &["pom.xml"]
    }

    fn wrapper_scripts(&self) -> &'static [&'static str] {
        if cfg!(windows) { &["mvnw.cmd"] } else { &["mvnw"] }
    }

    fn system_tools(&self) -> &'static [&'static str] {
        if cfg!(windows) { &["mvn.cmd"] } else { &["mvn"] }
    }

    fn version_args(&self) -> &'static [&'static str] {
        &["--version", "--batch-mode"]
    }

    fn quiet_args(&self) -> &'static [&'static str] {
        &["--batch-mode", "--quiet"]
    }

    fn parse_version(&self, output: &str) -> Result<ToolVersion, VersionParseError> {
        parse_maven_version(output)
    }

    fn overlay(&self, settings: &EngineSettings) -> EnvOverlay {
        settings.jvm_overlay()
    }

    fn skipped(&self, settings: &EngineSettings) -> bool {
        settings.skip_maven
    }
}
