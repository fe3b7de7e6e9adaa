use crate::errors::SaeError;

/// ストレージのオブジェクトキーを検証する
///
/// パストラバーサルと制御文字だけを拒否する。ファイル名の文字はサニタイズ済みの前提で、
/// 句読点や記号を含む Unicode のファイル名はそのまま通す。
pub fn validate_key(key: &str) -> Result<(), SaeError> {
    if key.is_empty() {
        return Err(SaeError::Validation("key is empty".to_string()));
    }

    // 長さチェック（1024バイトまで）
    if key.len() > 1024 {
        return Err(SaeError::Validation("key is too long (max 1024)".to_string()));
    }

    let decoded = urlencoding::decode(key)
        .map_err(|_| SaeError::Validation("invalid URL encoding".to_string()))?;

    if decoded.starts_with('/')
        || decoded.contains("//")
        || decoded.contains('\\')
        || decoded.split('/').any(|segment| segment == ".." || segment == ".")
    {
        return Err(SaeError::Validation("path traversal detected".to_string()));
    }

    if decoded.chars().any(char::is_control) {
        return Err(SaeError::Validation("control characters in key".to_string()));
    }

    Ok(())
}
