//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 엔진은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. CLI는 레코더를 설치하지 않으므로 기본적으로 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `depwatch_`
//! - 모듈명: `tool_`, `detector_`, `task_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 생태계 레이블 키 (gradle, maven, npm, go, pip)
pub const LABEL_ECOSYSTEM: &str = "ecosystem";

/// 실패 종류 레이블 키 (execution, parse, timed_out, cancelled)
pub const LABEL_FAILURE_KIND: &str = "kind";

/// 스캔 종류 레이블 키 (source, binary, firmware)
pub const LABEL_SCAN_KIND: &str = "scan_kind";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── 외부 도구 실행 ────────────────────────────────────────────────

/// 외부 도구 실행 횟수 (counter, label: result)
pub const TOOL_INVOCATIONS_TOTAL: &str = "depwatch_tool_invocations_total";

/// 외부 도구 실행 소요 시간 (histogram, 초)
pub const TOOL_INVOCATION_DURATION_SECONDS: &str = "depwatch_tool_invocation_duration_seconds";

// ─── 생태계 탐지 ───────────────────────────────────────────────────

/// 후보 실패 횟수 (counter, labels: ecosystem, kind)
pub const DETECTOR_CANDIDATE_FAILURES_TOTAL: &str = "depwatch_detector_candidate_failures_total";

/// 생태계 환경 결정 성공 횟수 (counter, label: ecosystem)
pub const DETECTOR_RESOLVED_TOTAL: &str = "depwatch_detector_resolved_total";

// ─── 스캔 작업 ─────────────────────────────────────────────────────

/// 완료된 작업 수 (counter, labels: scan_kind, result)
pub const TASK_FINISHED_TOTAL: &str = "depwatch_task_finished_total";

/// 작업 소요 시간 (histogram, 초)
pub const TASK_DURATION_SECONDS: &str = "depwatch_task_duration_seconds";

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 레코더를 설치하는 쪽에서 한 번만 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        TOOL_INVOCATIONS_TOTAL,
        "Total number of external build tool invocations"
    );
    describe_histogram!(
        TOOL_INVOCATION_DURATION_SECONDS,
        "Wall-clock time of a single external tool invocation in seconds"
    );
    describe_counter!(
        DETECTOR_CANDIDATE_FAILURES_TOTAL,
        "Candidate tool attempts that failed, by ecosystem and failure kind"
    );
    describe_counter!(
        DETECTOR_RESOLVED_TOTAL,
        "Ecosystem environments resolved successfully"
    );
    describe_counter!(TASK_FINISHED_TOTAL, "Scan tasks that reached a terminal state");
    describe_histogram!(
        TASK_DURATION_SECONDS,
        "Time from task start to terminal state in seconds"
    );
}
