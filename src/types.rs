//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! TRSレポートの3階層構造（カテゴリ → 薬物 → セクション）を表現します。

use serde::ser::{Serialize, SerializeMap, Serializer};

/// 挿入順を保持する文字列キーのマップ
///
/// TRSレポートの各階層で使用されます。反復順序は挿入順（＝ドキュメント内の
/// 出現順）であり、キーは親の中で一意です。エントリ数は高々数十個なので、
/// キーの検索は線形走査で行います。
///
/// 重複キーの挿入は値をその場で置き換えます（最後の値が勝ち、最初の位置が
/// 保たれます）。このポリシーはカテゴリ・薬物・セクションのすべての階層と
/// フラット化で共通です。
///
/// # 使用例
///
/// ```rust
/// use ecddfeed::OrderedMap;
///
/// let mut map = OrderedMap::new();
/// map.insert("Recommendation", "Keep under surveillance.".to_string());
/// map.insert("Summary", "Short text.".to_string());
///
/// let keys: Vec<&str> = map.keys().collect();
/// assert_eq!(keys, ["Recommendation", "Summary"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    /// 空のマップを生成する
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// キーと値を挿入する
    ///
    /// キーが既に存在する場合は値をその場で置き換え、古い値を返します。
    /// 位置は最初に挿入されたときのまま変わりません。
    ///
    /// # 引数
    ///
    /// * `key`: 挿入するキー
    /// * `value`: 挿入する値
    ///
    /// # 戻り値
    ///
    /// * `Some(V)`: キーが既に存在した場合、置き換えられた古い値
    /// * `None`: 新しいキーだった場合
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// キーに対応する値を取得する
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// キーが存在するかを判定する
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// エントリ数を取得する
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// マップが空かどうかを判定する
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// エントリを挿入順に反復する
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// キーを挿入順に反復する
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// 値を挿入順に反復する
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // JSONマップとして挿入順のままシリアライズする
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// セクション名 → 整形済み本文のマップ（薬物1件分）
pub type SectionMap = OrderedMap<String>;

/// 薬物名 → セクションマップのマップ（カテゴリ1件分）
pub type DrugMap = OrderedMap<SectionMap>;

/// カテゴリ名 → 薬物マップのマップ（TRSレポート1件分）
///
/// カテゴリ名が空文字列の場合は「カテゴリ階層が存在しない」ことを意味し、
/// トップレベルで見つかったすべての薬物を保持する単一のバケットになります。
pub type TrsReport = OrderedMap<DrugMap>;
