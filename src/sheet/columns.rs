//! Column Reference Module
//!
//! Excel列参照（A, B, ..., Z, AA, ...）と0始まりの列インデックスの
//! 相互変換を提供するモジュール。

/// 列参照文字列を0始まりの列インデックスに変換する
///
/// # 引数
///
/// * `letters` - 列参照（例: `"A"`、`"AF"`）。小文字も受け付けます
///
/// # 戻り値
///
/// * `Some(u32)` - 変換に成功した場合（`A` = 0、`Z` = 25、`AA` = 26）
/// * `None` - 英字以外を含む、または空文字列の場合
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }

    let mut index: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let val = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        index = index.checked_mul(26)?.checked_add(val)?;
    }

    Some(index - 1)
}

/// 0始まりの列インデックスを列参照文字列に変換する
///
/// # 使用例
///
/// ```rust
/// use ecddfeed::sheet::column_letter;
///
/// assert_eq!(column_letter(0), "A");
/// assert_eq!(column_letter(27), "AB");
/// ```
pub fn column_letter(index: u32) -> String {
    let mut index = index;
    let mut letters = String::new();
    loop {
        letters.insert(0, char::from(b'A' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters
}

/// セル参照文字列を座標に変換する（例: "A1" -> (0, 0)）
pub(crate) fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col_str = String::new();
    let mut row_str = String::new();

    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col_str.push(ch);
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        }
    }

    if col_str.is_empty() || row_str.is_empty() {
        return None;
    }

    let col = column_index(&col_str)?;
    // Excelの行番号は1始まりなので、0始まりに変換
    let row = row_str.parse::<u32>().ok()?.checked_sub(1)?;

    Some((row, col))
}
