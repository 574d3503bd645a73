//! 라인 추출기 -- zero-readings 실패 시그니처 매칭
//!
//! [`SignatureScanner`]는 로그 라인에서 실패 시그니처를 찾아
//! 탐지 타임스탬프 집합을 만듭니다. 순수 함수이며 부수효과가 없습니다.

use std::collections::BTreeSet;

use regex::Regex;

use dbalarm_core::error::DbAlarmError;

/// 실패 시그니처 패턴
///
/// ISO-8601 타임스탬프(+HHMM 오프셋), dbase 컴포넌트 마커,
/// 세 카운터가 모두 0인 통계 리포트로 구성된 라인 전체와 매칭됩니다.
/// 캡처 그룹 1은 타임스탬프입니다. 카운터가 하나라도 0이 아니면
/// 실패 시그니처가 아니므로 매칭되지 않습니다.
const SIGNATURE_PATTERN: &str = r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\+\d{4}) \[dbase#info\] DB Stats Readings \[Total, OK, NOK\] = \(0, 0, 0\)$";

/// 시그니처 스캐너 -- 컴파일된 패턴을 보관하고 라인을 평가합니다.
///
/// 패턴은 생성 시 한 번만 컴파일합니다.
pub struct SignatureScanner {
    pattern: Regex,
}

impl SignatureScanner {
    /// 새 스캐너를 생성합니다.
    pub fn new() -> Result<Self, DbAlarmError> {
        let pattern =
            Regex::new(SIGNATURE_PATTERN).map_err(|e| DbAlarmError::Pattern(e.to_string()))?;
        Ok(Self { pattern })
    }

    /// 라인 시퀀스를 스캔해 탐지 타임스탬프 집합을 반환합니다.
    ///
    /// 반환값은 집합이므로 파일 내 중복 타임스탬프는 한 건으로 접힙니다.
    /// 매칭이 없으면 빈 집합을 반환하며, 이는 에러가 아닙니다.
    pub fn scan<'a, I>(&self, lines: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        lines
            .into_iter()
            .filter_map(|line| self.matches(line))
            .collect()
    }

    /// 단일 라인을 평가해 매칭되면 탐지 타임스탬프를 반환합니다.
    pub fn matches(&self, line: &str) -> Option<String> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scanner() -> SignatureScanner {
        SignatureScanner::new().expect("pattern should compile")
    }

    #[test]
    fn zero_triple_line_matches() {
        let line = "2024-01-01T00:00:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0)";
        assert_eq!(
            scanner().matches(line),
            Some("2024-01-01T00:00:00+0000".to_owned())
        );
    }

    #[test]
    fn nonzero_counter_does_not_match() {
        let line = "2024-01-01T00:05:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (10, 10, 0)";
        assert_eq!(scanner().matches(line), None);
    }

    #[test]
    fn different_marker_does_not_match() {
        let line = "2024-01-01T00:00:00+0000 [mqtt#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0)";
        assert_eq!(scanner().matches(line), None);
    }

    #[test]
    fn trailing_content_does_not_match() {
        // 패턴은 라인 전체에 앵커되어 있음
        let line = "2024-01-01T00:00:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0) extra";
        assert_eq!(scanner().matches(line), None);
    }

    #[test]
    fn scan_collapses_duplicate_timestamps() {
        let line = "2024-01-01T00:00:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0)";
        let detections = scanner().scan([line, line, line]);
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn scan_returns_ascending_order() {
        let later = "2024-01-02T00:00:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0)";
        let earlier = "2024-01-01T00:00:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0)";
        let detections: Vec<_> = scanner().scan([later, earlier]).into_iter().collect();
        assert_eq!(
            detections,
            vec!["2024-01-01T00:00:00+0000", "2024-01-02T00:00:00+0000"]
        );
    }

    #[test]
    fn no_match_yields_empty_set() {
        let detections = scanner().scan(["unrelated line", ""]);
        assert!(detections.is_empty());
    }

    proptest! {
        // 카운터가 하나라도 0이 아니면 절대 매칭되지 않아야 함
        #[test]
        fn nonzero_triples_never_match(total in 0u32..1000, ok in 0u32..1000, nok in 0u32..1000) {
            prop_assume!(total != 0 || ok != 0 || nok != 0);
            let line = format!(
                "2024-01-01T00:00:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = ({total}, {ok}, {nok})"
            );
            prop_assert!(scanner().matches(&line).is_none());
        }

        // 형식이 올바른 타임스탬프는 무엇이든 캡처되어야 함
        #[test]
        fn any_wellformed_timestamp_is_captured(
            y in 1970u32..2100, mo in 1u32..=12, d in 1u32..=28,
            h in 0u32..24, mi in 0u32..60, s in 0u32..60,
        ) {
            let ts = format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}+0000");
            let line = format!("{ts} [dbase#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0)");
            prop_assert_eq!(scanner().matches(&line), Some(ts));
        }
    }
}
