use crate::model::CharacterSet;

/// 按字符位置截取：`start`、`end` 都是闭合的切割点
///
/// `[null, 5]` keeps positions `0..=5`, `[6, null]` drops positions
/// `0..=6`. Positions are characters, not bytes.
pub fn slice_characters(value: &str, set: &CharacterSet) -> String {
    let chars: Vec<char> = value.chars().collect();

    let from = set
        .start()
        .map(|s| (s + 1).min(chars.len()))
        .unwrap_or(0);
    let to = set
        .end()
        .map(|e| (e + 1).min(chars.len()))
        .unwrap_or(chars.len());

    if from >= to {
        return String::new();
    }

    chars[from..to].iter().collect()
}
