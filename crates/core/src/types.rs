//! 공통 도메인 타입: 스캔 종류, 출력 모드, 콘솔 로그 레벨

use std::fmt;

use serde::{Deserialize, Serialize};

/// 스캔 종류
///
/// 작업 생성 시 고정되며 이후 변경되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
    /// 소스 코드 스캔 (생태계 탐지 + 의존성 추출)
    Source,
    /// 바이너리 / 소프트웨어 산출물 스캔 (.jar, .war 등)
    Binary,
    /// IoT 펌웨어 스캔
    Firmware,
}

impl ScanKind {
    /// 생태계 탐지가 필요한 스캔인지 반환합니다.
    pub fn inspects_ecosystems(&self) -> bool {
        matches!(self, Self::Source)
    }
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Binary => write!(f, "binary"),
            Self::Firmware => write!(f, "firmware"),
        }
    }
}

/// 결과 출력 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// 사람이 읽는 텍스트 출력
    Interactive,
    /// 기계 판독용 JSON 출력 (CI 연동)
    MachineReadable,
}

impl OutputMode {
    /// `--json` 플래그 값에서 출력 모드를 결정합니다.
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::MachineReadable
        } else {
            Self::Interactive
        }
    }
}

/// 콘솔 로그 레벨
///
/// `silent`는 콘솔 로그를 완전히 끕니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLogLevel {
    Silent,
    Error,
    Warn,
    Info,
    Debug,
}

impl ConsoleLogLevel {
    /// 허용되는 레벨 이름 목록
    pub const NAMES: [&'static str; 5] = ["silent", "error", "warn", "info", "debug"];

    /// 문자열에서 레벨을 파싱합니다 (대소문자, 앞뒤 공백 무시).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "silent" => Some(Self::Silent),
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for ConsoleLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Silent => "silent",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_source_scan_inspects_ecosystems() {
        assert!(ScanKind::Source.inspects_ecosystems());
        assert!(!ScanKind::Binary.inspects_ecosystems());
        assert!(!ScanKind::Firmware.inspects_ecosystems());
    }

    #[test]
    fn output_mode_from_json_flag() {
        assert_eq!(OutputMode::from_json_flag(true), OutputMode::MachineReadable);
        assert_eq!(OutputMode::from_json_flag(false), OutputMode::Interactive);
    }

    #[test]
    fn console_log_level_parses_loosely() {
        assert_eq!(
            ConsoleLogLevel::from_str_loose(" WARN "),
            Some(ConsoleLogLevel::Warn)
        );
        assert_eq!(
            ConsoleLogLevel::from_str_loose("silent"),
            Some(ConsoleLogLevel::Silent)
        );
        assert_eq!(ConsoleLogLevel::from_str_loose("trace"), None);
        assert_eq!(ConsoleLogLevel::from_str_loose(""), None);
    }

    #[test]
    fn scan_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ScanKind::Firmware).unwrap();
        assert_eq!(json, "\"firmware\"");
    }
}
