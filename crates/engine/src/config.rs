//! 엔진 설정
//!
//! [`EngineSettings`]는 core의 [`ScanConfig`]에서 변환되며, 빌더로 테스트용 값을 지정할 수 있습니다.

use std::path::PathBuf;
use std::time::Duration;

use depwatch_core::config::ScanConfig;

use crate::error::EngineError;
use crate::process::{DEFAULT_KILL_GRACE, EnvOverlay};

/// 엔진 런타임 설정
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// 외부 도구 1회 실행 타임아웃
    pub process_timeout: Duration,
    /// 취소/타임아웃 후 종료 유예 시간
    pub kill_grace: Duration,
    /// Gradle 실행 생략
    pub skip_gradle: bool,
    /// Maven 실행 생략
    pub skip_maven: bool,
    /// Gradle/Maven 호출에 `JAVA_HOME`으로 주입할 JRE 경로
    pub jre_home: Option<PathBuf>,
    /// 딥 스캔 업로드 대상 최대 파일 크기 (바이트)
    pub deep_scan_max_file_size: u64,
    /// 모든 도구 호출에 적용할 기본 오버레이
    pub base_overlay: EnvOverlay,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_core(&ScanConfig::default())
    }
}

impl EngineSettings {
    /// core 설정에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &ScanConfig) -> Self {
        Self {
            process_timeout: core.process_timeout(),
            kill_grace: DEFAULT_KILL_GRACE,
            skip_gradle: core.skip_gradle,
            skip_maven: core.skip_maven,
            jre_home: core.jre_home.as_ref().map(PathBuf::from),
            deep_scan_max_file_size: core.deep_scan_max_file_size,
            base_overlay: EnvOverlay::default(),
        }
    }

    pub fn builder() -> EngineSettingsBuilder {
        EngineSettingsBuilder::default()
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.process_timeout.is_zero() {
            return Err(EngineError::Config {
                field: "process_timeout".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.deep_scan_max_file_size == 0 {
            return Err(EngineError::Config {
                field: "deep_scan_max_file_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }

    /// Gradle/Maven 호출용 오버레이 (JRE 경로 반영)
    pub fn jvm_overlay(&self) -> EnvOverlay {
        match &self.jre_home {
            Some(jre) => {
                tracing::debug!("adjust JAVA_HOME environment by jre override");
                self.base_overlay.with("JAVA_HOME", jre.as_os_str())
            }
            None => self.base_overlay.clone(),
        }
    }
}

/// [`EngineSettings`] 빌더
#[derive(Debug, Default)]
pub struct EngineSettingsBuilder {
    settings: EngineSettings,
}

impl EngineSettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 외부 도구 실행 타임아웃을 설정합니다.
    pub fn process_timeout(mut self, timeout: Duration) -> Self {
        self.settings.process_timeout = timeout;
        self
    }

    /// 종료 유예 시간을 설정합니다.
    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.settings.kill_grace = grace;
        self
    }

    pub fn skip_gradle(mut self, skip: bool) -> Self {
        self.settings.skip_gradle = skip;
        self
    }

    pub fn skip_maven(mut self, skip: bool) -> Self {
        self.settings.skip_maven = skip;
        self
    }

    /// JRE 경로를 설정합니다.
    pub fn jre_home(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.jre_home = Some(path.into());
        self
    }

    pub fn deep_scan_max_file_size(mut self, size: u64) -> Self {
        self.settings.deep_scan_max_file_size = size;
        self
    }

    /// 모든 도구 호출에 적용할 오버레이를 설정합니다.
    pub fn base_overlay(mut self, overlay: EnvOverlay) -> Self {
        self.settings.base_overlay = overlay;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    pub fn build(self) -> Result<EngineSettings, EngineError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
