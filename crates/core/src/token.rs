//! API 토큰 저장소
//!
//! 토큰 결정 우선순위:
//! 1. CLI 인자 (`--token`)
//! 2. 환경변수 (`API_TOKEN`)
//! 3. 로컬 토큰 파일 (`~/.depwatch/token`)
//!
//! 토큰 파일은 [`TokenStore`] 인스턴스당 최대 한 번만 읽습니다.
//! 프로세스 전역 캐시 대신 CLI 시작 시 생성한 저장소를 명시적으로 전달합니다.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{debug, info, warn};

use crate::config::CONFIG_DIR_NAME;
use crate::error::TokenError;

/// 토큰 환경변수 이름
pub const TOKEN_ENV_VAR: &str = "API_TOKEN";

/// 결정된 토큰의 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Cli,
    Env,
    File,
}

/// 토큰 저장소
#[derive(Debug)]
pub struct TokenStore {
    /// 토큰 파일 경로 (홈 디렉토리를 알 수 없으면 None)
    path: Option<PathBuf>,
    cli_override: Option<String>,
    env_override: Option<String>,
    file_token: OnceLock<Option<String>>,
}

impl TokenStore {
    /// 기본 경로와 `API_TOKEN` 환경변수로 저장소를 생성합니다.
    pub fn new(cli_override: Option<String>) -> Self {
        let path = dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join("token"));
        let env_override = std::env::var(TOKEN_ENV_VAR).ok();
        Self::with_path(path, cli_override, env_override)
    }

    /// 경로와 오버라이드를 직접 지정해 저장소를 생성합니다.
    pub fn with_path(
        path: Option<PathBuf>,
        cli_override: Option<String>,
        env_override: Option<String>,
    ) -> Self {
        Self {
            path,
            cli_override: non_blank(cli_override),
            env_override: non_blank(env_override),
            file_token: OnceLock::new(),
        }
    }

    /// 토큰 파일 경로
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 우선순위에 따라 토큰과 그 출처를 결정합니다.
    pub fn resolve(&self) -> Option<(String, TokenSource)> {
        if let Some(token) = &self.cli_override {
            info!("use API token from cli argument");
            return Some((token.clone(), TokenSource::Cli));
        }
        if let Some(token) = &self.env_override {
            info!("use API token from env");
            return Some((token.clone(), TokenSource::Env));
        }
        info!("use API token from config file");
        self.read_file_once()
            .map(|token| (token, TokenSource::File))
    }

    /// 토큰만 반환합니다.
    pub fn token(&self) -> Option<String> {
        self.resolve().map(|(token, _)| token)
    }

    fn read_file_once(&self) -> Option<String> {
        self.file_token
            .get_or_init(|| {
                let path = self.path.as_ref()?;
                debug!(path = %path.display(), "read token");
                match std::fs::read_to_string(path) {
                    Ok(content) => non_blank(Some(content)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "read token file failed");
                        None
                    }
                }
            })
            .clone()
    }

    /// 토큰을 로컬 파일에 저장합니다.
    pub fn store(&self, token: &str) -> Result<(), TokenError> {
        let path = self.path.as_ref().ok_or(TokenError::HomeDirUnavailable)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| TokenError::Io {
                action: "create directory for",
                path: path.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, token.trim()).map_err(|source| TokenError::Io {
            action: "write",
            path: path.display().to_string(),
            source,
        })?;
        restrict_permissions(path)?;
        info!(path = %path.display(), "token stored");
        Ok(())
    }

    /// 로컬 토큰 파일을 삭제합니다.
    ///
    /// 파일이 없으면 [`TokenError::TokenFileNotFound`]를 반환합니다.
    pub fn remove(&self) -> Result<(), TokenError> {
        let path = self.path.as_ref().ok_or(TokenError::HomeDirUnavailable)?;
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(TokenError::TokenFileNotFound),
        }
        std::fs::remove_file(path).map_err(|source| TokenError::Io {
            action: "delete",
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "token removed");
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), TokenError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|source| {
        TokenError::Io {
            action: "set permissions on",
            path: path.display().to_string(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), TokenError> {
    Ok(())
}
