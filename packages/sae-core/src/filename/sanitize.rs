/// ファイル名から取り除く文字
const SPECIAL_CHARS: &[char] = &[
    '?', '[', ']', '/', '\\', '=', '<', '>', ':', ';', ',', '\'', '"', '&', '$', '#', '*', '(',
    ')', '|', '~', '`', '!', '{', '}', '%', '+', '\u{2019}', '\u{ab}', '\u{bb}', '\u{201d}',
    '\u{201c}', '\0',
];

/// ファイル名を安全な形に整える
///
/// - 特殊文字を削除
/// - 空白とハイフンの連続を 1 つのハイフンにまとめる
/// - 先頭の `-` `_` と末尾の `.` `-` `_` を削除（先頭の `.` は残す）
pub fn sanitize_file_name(filename: &str) -> String {
    let stripped: String = filename.chars().filter(|c| !SPECIAL_CHARS.contains(c)).collect();

    let mut collapsed = String::with_capacity(stripped.len());
    let mut in_run = false;
    for c in stripped.chars() {
        if matches!(c, ' ' | '\t' | '\r' | '\n' | '-') {
            if !in_run {
                collapsed.push('-');
            }
            in_run = true;
        } else {
            collapsed.push(c);
            in_run = false;
        }
    }

    collapsed
        .trim_start_matches(['-', '_'])
        .trim_end_matches(['.', '-', '_'])
        .to_string()
}

/// ファイル名を（名前, 拡張子）に分ける
///
/// 拡張子はドットを含む。`.ext` のように名前が拡張子そのものの場合、名前は空になる。
pub fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() => (&filename[..idx], &filename[idx..]),
        _ => (filename, ""),
    }
}
