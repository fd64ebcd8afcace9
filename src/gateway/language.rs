//! 与后端约定的语言代码表

/// OCR 语言（展示名 -> Tesseract 三字母代码）。与后端的线上约定，不能改动。
pub const OCR_LANGUAGES: [(&str, &str); 12] = [
    ("english", "eng"),
    ("hindi", "hin"),
    ("bengali", "ben"),
    ("telugu", "tel"),
    ("tamil", "tam"),
    ("marathi", "mar"),
    ("gujarati", "guj"),
    ("kannada", "kan"),
    ("malayalam", "mal"),
    ("odia", "ori"),
    ("punjabi", "pan"),
    ("urdu", "urd"),
];

pub const DEFAULT_OCR_CODE: &str = "eng";

/// 新闻列表按语言过滤时使用的 ISO 639-1 代码
pub const LIST_LANGUAGES: [(&str, &str); 7] = [
    ("English", "en"),
    ("Hindi", "hi"),
    ("Bengali", "bn"),
    ("Telugu", "te"),
    ("Tamil", "ta"),
    ("Marathi", "mr"),
    ("Gujarati", "gu"),
];

/// 展示名（不区分大小写）转 OCR 代码；已经是三字母代码的原样接受，其余回落到 `eng`
pub fn ocr_code(display_name: &str) -> &'static str {
    let folded = display_name.trim().to_lowercase();
    OCR_LANGUAGES
        .iter()
        .find(|(name, code)| *name == folded || *code == folded)
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_OCR_CODE)
}

/// 列表过滤的语言代码；不在表里的值原样传给后端
pub fn list_code(display_name: &str) -> String {
    let trimmed = display_name.trim();
    LIST_LANGUAGES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// 分析页的时间范围（`1d` / `7d` / `30d` / `90d`），其余按 30 天
pub fn range_days(range: &str) -> u32 {
    match range.trim() {
        "1d" => 1,
        "7d" => 7,
        "30d" => 30,
        "90d" => 90,
        _ => 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_table_is_exact() {
        let expected = [
            ("english", "eng"), ("hindi", "hin"), ("bengali", "ben"), ("telugu", "tel"),
            ("tamil", "tam"), ("marathi", "mar"), ("gujarati", "guj"), ("kannada", "kan"),
            ("malayalam", "mal"), ("odia", "ori"), ("punjabi", "pan"), ("urdu", "urd"),
        ];
        for (name, code) in expected {
            assert_eq!(ocr_code(name), code);
        }
    }

    #[test]
    fn test_ocr_lookup_folds_case_and_falls_back() {
        assert_eq!(ocr_code("Malayalam"), "mal");
        assert_eq!(ocr_code("ori"), "ori");
        assert_eq!(ocr_code("klingon"), "eng");
    }

    #[test]
    fn test_list_code() {
        assert_eq!(list_code("Hindi"), "hi");
        assert_eq!(list_code("gujarati"), "gu");
        assert_eq!(list_code("kn"), "kn");
    }

    #[test]
    fn test_range_days() {
        assert_eq!(range_days("1d"), 1);
        assert_eq!(range_days("90d"), 90);
        assert_eq!(range_days("1y"), 30);
    }
}
