//! Go modules 탐지기

use crate::detector::EcosystemDetector;
use crate::types::Ecosystem;
use crate::version::{ToolVersion, VersionParseError, parse_go_version};

#[derive(Debug, Clone, Copy, Default)]
pub struct GoDetector;

impl EcosystemDetector for GoDetector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn manifest_files(&self) -> &'static [&'static str] {
        &["go.mod"]
    }

    fn system_tools(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn version_args(&self) -> &'static [&'static str] {
        &["version"]
    }

    fn parse_version(&self, output: &str) -> Result<ToolVersion, VersionParseError> {
        parse_go_version(output)
    }
}
