//! Value Object 定義
//!
//! 識別子はすべて不透明な文字列です。フォーマットの制約は「空でないこと」のみ
//! （サーバ生成の userId、クライアント指定の partyId / username）。

use uuid::Uuid;

use super::error::ValueError;

/// パーティ ID（クライアント指定の不透明な文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError::Empty("partyId"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for PartyId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// ユーザ ID（接続受付時にサーバが生成、接続の生存期間中不変）
///
/// 接続 ID と同一。再接続は新しい接続・新しい ID になる。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError::Empty("userId"));
        }
        Ok(Self(value))
    }

    /// 接続受付時に呼び出し、新しいユーザ ID を採番する
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 表示名（クライアント指定、一意性は検証しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError::Empty("username"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_id_accepts_non_empty() {
        // テスト項目: 空でない partyId が受理される
        // given (前提条件):
        let raw = "abc".to_string();

        // when (操作):
        let result = PartyId::new(raw);

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(result.unwrap().as_str(), "abc");
    }

    #[test]
    fn test_party_id_rejects_empty() {
        // テスト項目: 空文字列の partyId が拒否される
        // given (前提条件):
        let raw = "".to_string();

        // when (操作):
        let result = PartyId::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueError::Empty("partyId")));
    }

    #[test]
    fn test_user_id_generate_is_unique() {
        // テスト項目: 生成されるユーザ ID が接続ごとに一意である
        // given (前提条件):

        // when (操作):
        let a = UserId::generate();
        let b = UserId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_username_rejects_empty() {
        // テスト項目: 空文字列の username が拒否される
        // given (前提条件):
        let raw = "".to_string();

        // when (操作):
        let result = Username::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueError::Empty("username")));
    }
}
