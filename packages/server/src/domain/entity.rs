//! パーティ参加者のエンティティとオーナー選出ロジック

use rand::Rng;

use super::value_object::{UserId, Username};

/// 参加者レコード
///
/// (partyId, userId) ごとに 1 件、PresenceStore に永続化される。
///
/// - `is_admin` は単調非減少（true になった後、このシステムが false に戻すことはない）
/// - `is_room_owner` は定常状態ではパーティごとに高々 1 人。オーナー切断から
///   フェイルオーバー完了までの間は一時的に 0 人になりうる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: UserId,
    pub username: Username,
    pub is_admin: bool,
    pub is_room_owner: bool,
}

impl Participant {
    /// パーティ作成者（最初の参加者）: admin かつ room owner
    pub fn creator(user_id: UserId, username: Username) -> Self {
        Self {
            user_id,
            username,
            is_admin: true,
            is_room_owner: true,
        }
    }

    /// 既存パーティへの参加者: どちらのフラグも false
    pub fn member(user_id: UserId, username: Username) -> Self {
        Self {
            user_id,
            username,
            is_admin: false,
            is_room_owner: false,
        }
    }
}

/// 後任のルームオーナーを選出する
///
/// 残存参加者のうち admin がいればその中から、いなければ全員の中から
/// 一様ランダムに 1 人を選ぶ。残存参加者が空なら None。
pub fn elect_replacement_owner(remaining: &[Participant]) -> Option<&Participant> {
    if remaining.is_empty() {
        return None;
    }

    let admins: Vec<&Participant> = remaining.iter().filter(|p| p.is_admin).collect();
    let pool: Vec<&Participant> = if admins.is_empty() {
        remaining.iter().collect()
    } else {
        admins
    };

    let index = rand::rng().random_range(0..pool.len());
    Some(pool[index])
}
