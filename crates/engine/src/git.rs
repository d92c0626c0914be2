//! Git 메타데이터 수집
//!
//! 소스 스캔 대상의 원격 URL, 브랜치, 커밋을 `git` 명령으로 조회합니다.
//! git이 없거나 저장소가 아니어도 스캔은 계속되며, 실패는 debug 로그로만 남습니다.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::context::ExecContext;
use crate::process::Invocation;

/// 저장소 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl GitInfo {
    pub fn is_empty(&self) -> bool {
        self.remote_url.is_none() && self.branch.is_none() && self.commit.is_none()
    }
}

/// 대상 디렉토리의 git 정보를 수집합니다. 아무것도 얻지 못하면 None.
pub async fn collect_git_info(ctx: &ExecContext, dir: &Path) -> Option<GitInfo> {
    let info = GitInfo {
        remote_url: git_query(ctx, dir, &["config", "--get", "remote.origin.url"]).await,
        branch: git_query(ctx, dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await,
        commit: git_query(ctx, dir, &["rev-parse", "HEAD"]).await,
    };
    if info.is_empty() { None } else { Some(info) }
}

async fn git_query(ctx: &ExecContext, dir: &Path, args: &[&str]) -> Option<String> {
    if ctx.is_cancelled() {
        return None;
    }
    let invocation = Invocation::new("git")
        .args(args.iter().copied())
        .current_dir(dir)
        .overlay(&ctx.settings().base_overlay);
    match ctx.run(&invocation).await {
        Ok(output) => {
            let value = output.stdout_lossy().trim().to_owned();
            (!value.is_empty()).then_some(value)
        }
        Err(e) => {
            debug!(error = %e, "git query failed");
            None
        }
    }
}
