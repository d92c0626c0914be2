//! 설정 관리: config.toml 파싱 및 런타임 설정
//!
//! [`DepwatchConfig`]는 CLI와 엔진이 공유하는 최상위 설정 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, CLI 크레이트에서 적용)
//! 2. 환경변수 (`DEPWATCH_SERVER_BASE_URL=...` 형식, 이후 레거시 이름)
//! 3. 설정 파일 (`~/.depwatch/config.toml` 또는 `--config`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 레거시 환경변수
//!
//! 기존 사용자 스크립트 호환을 위해 다음 이름도 인식합니다.
//! `DEPWATCH_*` 이름이 함께 설정되어 있으면 `DEPWATCH_*`가 우선합니다.
//!
//! | 변수 | 대상 |
//! |------|------|
//! | `API_TIMEOUT` | `server.request_timeout_secs` (양수만) |
//! | `TLS_ALLOW_INSECURE` | `server.tls_allow_insecure` (비어있지 않으면 true) |
//! | `SKIP_GRADLE_EXECUTION` | `scan.skip_gradle` (비어있지 않으면 true) |
//! | `NO_MVN` | `scan.skip_maven` (공백 제거 후 비어있지 않으면 true) |
//! | `IDEA_MAVEN_JRE` | `scan.jre_home` |
//! | `COMMAND_TIMEOUT` | `scan.process_timeout_secs` (양수만) |
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), depwatch_core::error::DepwatchError> {
//! use depwatch_core::config::DepwatchConfig;
//!
//! // 기본 경로(있으면) + 환경변수 오버라이드
//! let config = DepwatchConfig::load_optional(None).await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DepwatchConfig::parse("[server]\nbase_url = \"https://sca.example.com\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, DepwatchError};
use crate::types::ConsoleLogLevel;

/// 사용자별 설정 디렉토리 이름 (홈 디렉토리 기준)
pub const CONFIG_DIR_NAME: &str = ".depwatch";

/// 기본 서버 주소
pub const DEFAULT_SERVER_URL: &str = "https://www.depwatch.dev";

/// depwatch 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepwatchConfig {
    /// 일반 설정 (로그)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 원격 서비스 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 스캔 엔진 설정
    #[serde(default)]
    pub scan: ScanConfig,
}

impl DepwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DepwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 선택 사항인 로딩 경로입니다.
    ///
    /// - `path`가 주어지면 해당 파일이 반드시 존재해야 합니다.
    /// - 없으면 기본 경로(`~/.depwatch/config.toml`)를 확인하고, 파일이 없으면 기본값을 사용합니다.
    pub async fn load_optional(path: Option<&Path>) -> Result<Self, DepwatchError> {
        if let Some(path) = path {
            return Self::load(path).await;
        }

        match Self::default_path() {
            Some(default) if tokio::fs::try_exists(&default).await.unwrap_or(false) => {
                debug!(path = %default.display(), "loading default config file");
                Self::load(default).await
            }
            _ => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DepwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DepwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DepwatchError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DepwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            DepwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 기본 설정 파일 경로 (`~/.depwatch/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join("config.toml"))
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 레거시 이름을 먼저 적용한 뒤 `DEPWATCH_{SECTION}_{FIELD}` 이름을 적용합니다.
    pub fn apply_env_overrides(&mut self) {
        // Legacy
        override_positive_u64(&mut self.server.request_timeout_secs, "API_TIMEOUT");
        override_flag(&mut self.server.tls_allow_insecure, "TLS_ALLOW_INSECURE");
        override_flag(&mut self.scan.skip_gradle, "SKIP_GRADLE_EXECUTION");
        override_flag(&mut self.scan.skip_maven, "NO_MVN");
        override_opt_string(&mut self.scan.jre_home, "IDEA_MAVEN_JRE");
        override_positive_u64(&mut self.scan.process_timeout_secs, "COMMAND_TIMEOUT");

        // General
        override_string(&mut self.general.log_level, "DEPWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_dir, "DEPWATCH_GENERAL_LOG_DIR");

        // Server
        override_string(&mut self.server.base_url, "DEPWATCH_SERVER_BASE_URL");
        override_positive_u64(
            &mut self.server.request_timeout_secs,
            "DEPWATCH_SERVER_REQUEST_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.server.tls_allow_insecure,
            "DEPWATCH_SERVER_TLS_ALLOW_INSECURE",
        );

        // Scan
        override_positive_u64(
            &mut self.scan.process_timeout_secs,
            "DEPWATCH_SCAN_PROCESS_TIMEOUT_SECS",
        );
        override_bool(&mut self.scan.skip_gradle, "DEPWATCH_SCAN_SKIP_GRADLE");
        override_bool(&mut self.scan.skip_maven, "DEPWATCH_SCAN_SKIP_MAVEN");
        override_opt_string(&mut self.scan.jre_home, "DEPWATCH_SCAN_JRE_HOME");
        override_positive_u64(
            &mut self.scan.deep_scan_max_file_size,
            "DEPWATCH_SCAN_DEEP_SCAN_MAX_FILE_SIZE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DepwatchError> {
        if ConsoleLogLevel::from_str_loose(&self.general.log_level).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", ConsoleLogLevel::NAMES.join("|")),
            }
            .into());
        }

        let base_url = self.server.normalized_base_url();
        if base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.base_url".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "server.base_url".to_owned(),
                reason: format!("'{base_url}' must start with http:// or https://"),
            }
            .into());
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.scan.process_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.process_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.scan.deep_scan_max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.deep_scan_max_file_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 콘솔 로그 레벨 (silent, error, warn, info, debug)
    pub log_level: String,
    /// 로그 파일 디렉토리 (비어있으면 `~/.depwatch/logs`)
    pub log_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            log_dir: String::new(),
        }
    }
}

impl GeneralConfig {
    /// 실제 로그 디렉토리를 반환합니다.
    pub fn resolved_log_dir(&self) -> Option<PathBuf> {
        if !self.log_dir.trim().is_empty() {
            return Some(PathBuf::from(self.log_dir.trim()));
        }
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join("logs"))
    }
}

/// 원격 서비스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 서비스 기본 주소
    pub base_url: String,
    /// HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// TLS 인증서 검증 생략 여부
    pub tls_allow_insecure: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_owned(),
            request_timeout_secs: 300,
            tls_allow_insecure: false,
        }
    }
}

impl ServerConfig {
    /// 앞뒤 공백과 끝의 `/`를 제거한 기본 주소를 반환합니다.
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_owned()
    }

    /// 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 스캔 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 외부 빌드 도구 1회 실행 타임아웃 (초)
    ///
    /// 최초 실행 시 의존성 다운로드를 고려해 넉넉하게 잡습니다.
    pub process_timeout_secs: u64,
    /// Gradle 실행 생략
    pub skip_gradle: bool,
    /// Maven 실행 생략
    pub skip_maven: bool,
    /// Gradle/Maven 실행 시 `JAVA_HOME`으로 사용할 JRE 경로
    pub jre_home: Option<String>,
    /// 딥 스캔 업로드 대상 파일 최대 크기 (바이트)
    pub deep_scan_max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            process_timeout_secs: 1800,                // 30 minutes
            skip_gradle: false,
            skip_maven: false,
            jre_home: None,
            deep_scan_max_file_size: 32 * 1024 * 1024, // 32 MB
        }
    }
}

impl ScanConfig {
    /// 외부 도구 실행 타임아웃
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key)
        && !val.trim().is_empty()
    {
        *target = Some(val.trim().to_owned());
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

/// 값이 비어있지 않으면 true로 설정합니다 (레거시 토글 의미).
fn override_flag(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key)
        && !val.trim().is_empty()
    {
        *target = true;
    }
}

fn override_positive_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => *target = parsed,
            _ => warn!(
                env_key,
                value = val.as_str(),
                "expected a positive integer in env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = DepwatchConfig::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.server.base_url, DEFAULT_SERVER_URL);
        assert_eq!(config.server.request_timeout_secs, 300);
        assert!(!config.server.tls_allow_insecure);
        assert_eq!(config.scan.process_timeout_secs, 1800);
        assert!(config.scan.jre_home.is_none());
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn parse_empty_string_yields_defaults() {
        let config = DepwatchConfig::parse("").expect("empty toml should parse");
        assert_eq!(config.server.base_url, DEFAULT_SERVER_URL);
        assert!(!config.scan.skip_gradle);
    }

    #[test]
    fn parse_partial_sections() {
        let toml = r#"
[server]
base_url = "https://sca.example.com/"

[scan]
skip_maven = true
jre_home = "/opt/jdk17"
"#;
        let config = DepwatchConfig::parse(toml).expect("should parse");
        assert_eq!(config.server.normalized_base_url(), "https://sca.example.com");
        assert_eq!(config.server.request_timeout_secs, 300);
        assert!(config.scan.skip_maven);
        assert_eq!(config.scan.jre_home.as_deref(), Some("/opt/jdk17"));
    }

    #[test]
    fn parse_invalid_toml_fails() {
        let result = DepwatchConfig::parse("[server\nbase_url = 1");
        assert!(matches!(
            result,
            Err(DepwatchError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn normalized_base_url_trims_whitespace_and_slashes() {
        let server = ServerConfig {
            base_url: "  https://sca.example.com///  ".to_owned(),
            ..ServerConfig::default()
        };
        assert_eq!(server.normalized_base_url(), "https://sca.example.com");
    }

    #[test]
    fn validate_rejects_unknown_log_level() {
        let mut config = DepwatchConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("general.log_level"));
    }

    #[test]
    fn validate_rejects_non_http_base_url() {
        let mut config = DepwatchConfig::default();
        config.server.base_url = "ftp://sca.example.com".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.base_url"));
    }

    #[test]
    fn validate_rejects_empty_base_url() {
        let mut config = DepwatchConfig::default();
        config.server.base_url = " / ".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let mut config = DepwatchConfig::default();
        config.server.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = DepwatchConfig::default();
        config.scan.process_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolved_log_dir_prefers_explicit_value() {
        let general = GeneralConfig {
            log_dir: "/var/log/depwatch".to_owned(),
            ..GeneralConfig::default()
        };
        assert_eq!(
            general.resolved_log_dir(),
            Some(PathBuf::from("/var/log/depwatch"))
        );
    }

    #[test]
    fn timeouts_convert_to_durations() {
        let config = DepwatchConfig::default();
        assert_eq!(config.server.request_timeout(), Duration::from_secs(300));
        assert_eq!(config.scan.process_timeout(), Duration::from_secs(1800));
    }
}
