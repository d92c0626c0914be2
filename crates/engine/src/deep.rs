//! 업로드 대상 파일 수집
//!
//! 딥 스캔의 소스 트리와 바이너리/펌웨어 스캔의 산출물을 업로드 목록으로 만듭니다.
//! 빌드 산출물과 의존성 캐시 디렉토리는 건너뛰며, 목록은 상대 경로 순으로 정렬됩니다.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use depwatch_api::ApiClient;

use crate::context::ExecContext;
use crate::error::EngineError;
use crate::task::Artifact;

/// 딥 스캔에서 제외하는 디렉토리
pub const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", "build", "target"];

/// 업로드할 파일
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub absolute: PathBuf,
    /// 대상 기준 상대 경로 (`/` 구분)
    pub relative: String,
    pub size: u64,
}

/// 업로드 대상 수집 규칙
#[derive(Debug, Clone, Copy)]
pub struct CollectRules {
    /// 이 크기를 넘는 파일은 건너뜀 (None이면 제한 없음)
    pub max_file_size: Option<u64>,
    /// [`EXCLUDED_DIRS`] 적용 여부
    pub skip_excluded_dirs: bool,
}

impl CollectRules {
    /// 딥 스캔 소스 업로드 규칙
    pub fn source(max_file_size: u64) -> Self {
        Self {
            max_file_size: Some(max_file_size),
            skip_excluded_dirs: true,
        }
    }

    /// 바이너리/펌웨어 산출물 규칙 (모든 일반 파일)
    pub fn artifacts() -> Self {
        Self {
            max_file_size: None,
            skip_excluded_dirs: false,
        }
    }
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// 대상 경로에서 업로드할 파일을 수집합니다.
///
/// 대상이 파일이면 그 파일 하나를 파일명 기준으로 반환합니다.
/// 심볼릭 링크는 따라가지 않습니다. 읽을 수 없는 항목은 경고를 남기고 건너뜁니다.
pub fn collect_upload_files(target: &Path, rules: CollectRules) -> Vec<UploadFile> {
    let mut files: Vec<UploadFile> = WalkDir::new(target)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !(rules.skip_excluded_dirs && is_excluded(e)))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!(path = %path, error = %e, "skip unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let size = e.metadata().ok()?.len();
            if rules.max_file_size.is_some_and(|max| size > max) {
                debug!(path = %e.path().display(), size, "skip oversized file");
                return None;
            }
            let relative = relative_path(target, e.path())?;
            Some(UploadFile {
                absolute: e.path().to_path_buf(),
                relative,
                size,
            })
        })
        .collect();
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    files
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = if root.is_file() {
        Path::new(path.file_name()?)
    } else {
        path.strip_prefix(root).ok()?
    };
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// 파일을 하나씩 업로드하고 업로드된 산출물 목록을 반환합니다.
///
/// 파일 사이마다 취소를 확인합니다.
pub async fn upload_files<C: ApiClient>(
    ctx: &ExecContext,
    client: &C,
    task_id: &str,
    files: &[UploadFile],
) -> Result<Vec<Artifact>, EngineError> {
    let mut artifacts = Vec::with_capacity(files.len());
    for file in files {
        if ctx.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let content = tokio::fs::read(&file.absolute)
            .await
            .map_err(|source| EngineError::Io {
                path: file.absolute.display().to_string(),
                source,
            })?;
        client.upload_file(task_id, &file.relative, content).await?;
        artifacts.push(Artifact {
            path: file.relative.clone(),
            size: file.size,
        });
    }
    info!(task_id, count = artifacts.len(), "files uploaded");
    Ok(artifacts)
}
