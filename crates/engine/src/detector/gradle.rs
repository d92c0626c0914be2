//! Gradle 탐지기
//!
//! 프로젝트의 `gradlew`를 먼저 시도하고, 실패하거나 없으면 시스템 `gradle`로 대체합니다.
//! JRE 경로가 설정되어 있으면 모든 Gradle 호출에 `JAVA_HOME`으로 주입됩니다.

use crate::config::EngineSettings;
use crate::detector::EcosystemDetector;
use crate::process::EnvOverlay;
use crate::types::Ecosystem;
use crate::version::{ToolVersion, VersionParseError, parse_gradle_version};

/// Gradle 탐지기
#[derive(Debug, Clone, Copy, Default)]
pub struct GradleDetector;

impl EcosystemDetector for GradleDetector {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Gradle
    }

    fn manifest_files(&self) -> &'static [&'static str] {
        &[
            "build.gradle",
            "build.gradle.kts",
            "settings.gradle",
            "settings.gradle.kts",
        ]
    }

    fn wrapper_scripts(&self) -> &'static [&'static str] {
        if cfg!(windows) { &["gradlew.bat"] } else { &["gradlew"] }
    }

    fn system_tools(&self) -> &'static [&'static str] {
        &["gradle"]
    }

    fn version_args(&self) -> &'static [&'static str] {
        &["--version", "--quiet"]
    }

    fn quiet_args(&self) -> &'static [&'static str] {
        &["--quiet", "--console", "plain"]
    }

    fn parse_version(&self, output: &str) -> Result<ToolVersion, VersionParseError> {
        parse_gradle_version(output)
    }

    fn overlay(&self, settings: &EngineSettings) -> EnvOverlay {
        settings.jvm_overlay()
    }

    fn skipped(&self, settings: &EngineSettings) -> bool {
        settings.skip_gradle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::CandidateOrigin;

    #[test]
    fn wrapper_precedes_system_tool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(GradleDetector.wrapper_scripts()[0]), "").unwrap();

        let candidates = GradleDetector.candidates(dir.path());
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].origin, CandidateOrigin::Wrapper);
        assert_eq!(candidates[1].program.to_str(), Some("gradle"));
    }

    #[test]
    fn absent_wrapper_is_not_a_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = GradleDetector.candidates(dir.path());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].origin, CandidateOrigin::System);
    }

    #[test]
    fn kotlin_build_script_applies() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!GradleDetector.applies_to(dir.path()));
        std::fs::write(dir.path().join("build.gradle.kts"), "").unwrap();
        assert!(GradleDetector.applies_to(dir.path()));
    }

    #[test]
    fn skip_flag_is_honoured() {
        let settings = EngineSettings::builder().skip_gradle(true).build().unwrap();
        assert!(GradleDetector.skipped(&settings));
        assert!(!GradleDetector.skipped(&EngineSettings::default()));
    }
}
