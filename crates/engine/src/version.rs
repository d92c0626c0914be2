//! 도구 버전 파싱
//!
//! 각 빌드 도구의 `--version` 출력을 비교 가능한 [`ToolVersion`]으로 변환합니다.
//! 출력이 문법과 맞지 않으면 프로세스가 0으로 종료했더라도 [`VersionParseError`]를 반환합니다.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

static GRADLE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Gradle\s+(\d+)\.(\d+)(?:\.(\d+))?").expect("valid gradle regex")
});

static MAVEN_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Apache Maven\s+(\d+)\.(\d+)(?:\.(\d+))?").expect("valid maven regex")
});

static NPM_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*v?(\d+)\.(\d+)\.(\d+)").expect("valid npm regex"));

static GO_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"go version go(\d+)\.(\d+)(?:\.(\d+))?").expect("valid go regex")
});

static PIP_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*pip\s+(\d+)\.(\d+)(?:\.(\d+))?").expect("valid pip regex")
});

/// 버전 출력 파싱 실패
///
/// 실행 실패와 구분되는 별도 에러입니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {tool} version output: {excerpt:?}")]
pub struct VersionParseError {
    /// 도구 이름
    pub tool: &'static str,
    /// 출력 앞부분 (최대 80자)
    pub excerpt: String,
}

impl VersionParseError {
    fn new(tool: &'static str, output: &str) -> Self {
        Self {
            tool,
            excerpt: output.trim().chars().take(80).collect(),
        }
    }
}

/// 비교 가능한 도구 버전 (major.minor.patch)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolVersion(semver::Version);

impl ToolVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ToolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn parse_with(tool: &'static str, re: &Regex, output: &str) -> Result<ToolVersion, VersionParseError> {
    let caps = re
        .captures(output)
        .ok_or_else(|| VersionParseError::new(tool, output))?;
    let number = |idx: usize| -> Result<u64, VersionParseError> {
        match caps.get(idx) {
            Some(m) => m
                .as_str()
                .parse::<u64>()
                .map_err(|_| VersionParseError::new(tool, output)),
            None => Ok(0),
        }
    };
    Ok(ToolVersion::new(number(1)?, number(2)?, number(3)?))
}

/// `gradle --version` 출력 (`Gradle 7.6`)
pub fn parse_gradle_version(output: &str) -> Result<ToolVersion, VersionParseError> {
    parse_with("gradle", &GRADLE_VERSION, output)
}

/// `mvn --version` 출력 (`Apache Maven 3.9.6 (...)`)
pub fn parse_maven_version(output: &str) -> Result<ToolVersion, VersionParseError> {
    parse_with("maven", &MAVEN_VERSION, output)
}

/// `npm --version` 출력 (`10.2.4`)
pub fn parse_npm_version(output: &str) -> Result<ToolVersion, VersionParseError> {
    parse_with("npm", &NPM_VERSION, output)
}

/// `go version` 출력 (`go version go1.21.5 linux/amd64`)
pub fn parse_go_version(output: &str) -> Result<ToolVersion, VersionParseError> {
    parse_with("go", &GO_VERSION, output)
}

/// `pip --version` 출력 (`pip 23.3.1 from ... (python 3.12)`)
pub fn parse_pip_version(output: &str) -> Result<ToolVersion, VersionParseError> {
    parse_with("pip", &PIP_VERSION, output)
}
