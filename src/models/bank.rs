//! 금융기관 표준명 → 이체 화면 은행 코드

use phf::phf_map;

/// 표준 금융기관명과 3자리 기관 코드
static BANK_CODES: phf::Map<&'static str, &'static str> = phf_map! {
    "하나은행" => "081",
    "경남은행" => "039",
    "광주은행" => "034",
    "국민은행" => "004",
    "기업은행" => "003",
    "농협" => "011",
    "iM뱅크(대구)" => "031",
    "도이치뱅크" => "055",
    "부산은행" => "032",
    "산업은행" => "002",
    "저축은행" => "050",
    "새마을금고" => "045",
    "수협은행" => "007",
    "신협" => "048",
    "신한은행" => "088",
    "우리은행" => "020",
    "우체국" => "071",
    "전북은행" => "037",
    "제주은행" => "035",
    "카카오뱅크" => "090",
    "케이뱅크" => "089",
    "한국씨티은행" => "027",
    "BOA" => "060",
    "HSBC" => "054",
    "JP모간" => "057",
    "SC제일은행" => "023",
    "하나증권" => "270",
    "교보증권" => "261",
    "대신증권" => "267",
    "미래에셋증권" => "238",
    "DB금융투자" => "279",
    "유안타증권" => "209",
    "메리츠증권" => "287",
    "부국증권" => "290",
    "삼성증권" => "240",
    "신영증권" => "291",
    "신한투자증권" => "278",
    "NH투자증권" => "247",
    "유진증권" => "280",
    "키움증권" => "264",
    "하이투자증권" => "262",
    "한국투자" => "243",
    "한화투자증권" => "269",
    "KB증권" => "218",
    "LS증권" => "265",
    "현대차증권" => "263",
    "케이프증권" => "292",
    "SK증권" => "266",
    "산림조합" => "064",
    "중국공상은행" => "062",
    "중국은행" => "063",
    "중국건설은행" => "067",
    "BNP파리바은행" => "061",
    "한국포스증권" => "294",
    "다올투자증권" => "227",
    "BNK투자증권" => "224",
    "카카오페이증권" => "288",
    "IBK투자증권" => "225",
    "토스증권" => "271",
    "토스뱅크" => "092",
    "상상인증권" => "221",
};

/// 표준명으로 기관 코드 조회
///
/// 표준화 규칙에 걸리지 않은 이름은 소문자로 넘어오므로
/// (`kb증권` 등) 정확히 일치하지 않으면 대소문자 무시 비교를 한 번 더 한다.
pub fn bank_code(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    if let Some(code) = BANK_CODES.get(name) {
        return Some(code);
    }
    BANK_CODES
        .entries()
        .find(|(canonical, _)| canonical.to_lowercase() == name.to_lowercase())
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        assert_eq!(bank_code("신한은행"), Some("088"));
        assert_eq!(bank_code("SC제일은행"), Some("023"));
        assert_eq!(bank_code("iM뱅크(대구)"), Some("031"));
        assert_eq!(bank_code("농협"), Some("011"));
    }

    #[test]
    fn test_passthrough_names_resolve_case_insensitively() {
        assert_eq!(bank_code("kb증권"), Some("218"));
        assert_eq!(bank_code(" nh투자증권 "), Some("247"));
        assert_eq!(bank_code("boa"), Some("060"));
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(bank_code(""), None);
        assert_eq!(bank_code("없는은행"), None);
    }
}
