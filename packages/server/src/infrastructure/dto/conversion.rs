//! Conversion logic between DTOs and domain entities.

use serde::{Deserialize, Serialize};

use crate::domain::{Participant, UserId, Username, ValueError};

/// Wire representation of a participant record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
    pub is_room_owner: bool,
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Participant> for ParticipantDto {
    fn from(model: &Participant) -> Self {
        Self {
            user_id: model.user_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
            is_admin: model.is_admin,
            is_room_owner: model.is_room_owner,
        }
    }
}

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<ParticipantDto> for Participant {
    type Error = ValueError;

    fn try_from(dto: ParticipantDto) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(dto.user_id)?,
            username: Username::new(dto.username)?,
            is_admin: dto.is_admin,
            is_room_owner: dto.is_room_owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_to_dto_and_back() {
        // テスト項目: ドメインモデルと DTO の相互変換で情報が保たれる
        // given (前提条件):
        let participant = Participant {
            user_id: UserId::new("u1".to_string()).unwrap(),
            username: Username::new("alice".to_string()).unwrap(),
            is_admin: true,
            is_room_owner: false,
        };

        // when (操作):
        let dto = ParticipantDto::from(&participant);
        let restored = Participant::try_from(dto).unwrap();

        // then (期待する結果):
        assert_eq!(restored, participant);
    }

    #[test]
    fn test_dto_with_empty_user_id_is_rejected() {
        // テスト項目: userId が空の DTO はドメインモデルに変換できない
        // given (前提条件):
        let dto = ParticipantDto {
            user_id: "".to_string(),
            username: "alice".to_string(),
            is_admin: false,
            is_room_owner: false,
        };

        // when (操作):
        let result = Participant::try_from(dto);

        // then (期待する結果):
        assert_eq!(result, Err(ValueError::Empty("userId")));
    }
}
