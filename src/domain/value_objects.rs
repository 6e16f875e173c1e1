use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::CopyCountError;

/// 書籍ID - 蔵書カタログの集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

/// 会員ID - 会員管理コンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

/// 貸出ID - 貸出記録の集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

/// 会員ステータス
///
/// Suspendedの会員は新規貸出を行えない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Suspended,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Suspended => "suspended",
        }
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MemberStatus::Active),
            "suspended" => Ok(MemberStatus::Suspended),
            _ => Err(format!("Invalid member status: {}", s)),
        }
    }
}

/// 蔵書の冊数（総数と貸出可能数）
///
/// 不変条件：`0 <= available <= total` かつ `total >= 1`。
/// 不正な組み合わせを型システムで排除し、貸出・返却・冊数変更は
/// 新しい値を返す純粋な操作として表現する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyCounts {
    total: u32,
    available: u32,
}

impl CopyCounts {
    /// 新規登録時の冊数（全冊貸出可能）
    pub fn new(total: u32) -> Result<Self, CopyCountError> {
        if total == 0 {
            return Err(CopyCountError::InvalidTotal);
        }
        Ok(Self {
            total,
            available: total,
        })
    }

    /// 永続化された値からの復元
    ///
    /// # エラー
    /// 不変条件を満たさない組み合わせは`InvalidTotal`を返す
    pub fn from_parts(total: u32, available: u32) -> Result<Self, CopyCountError> {
        if total == 0 || available > total {
            return Err(CopyCountError::InvalidTotal);
        }
        Ok(Self { total, available })
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    /// 貸出中の冊数
    pub fn on_loan(&self) -> u32 {
        self.total - self.available
    }

    /// 1冊貸し出す
    ///
    /// # エラー
    /// 貸出可能数が0の場合は`OutOfCopies`を返す
    pub fn checkout(self) -> Result<Self, CopyCountError> {
        if self.available == 0 {
            return Err(CopyCountError::OutOfCopies);
        }
        Ok(Self {
            available: self.available - 1,
            ..self
        })
    }

    /// 1冊返却する
    ///
    /// # エラー
    /// 総数を超える場合は`ExceedsTotal`を返す（二重返却の兆候）
    pub fn checkin(self) -> Result<Self, CopyCountError> {
        if self.available >= self.total {
            return Err(CopyCountError::ExceedsTotal);
        }
        Ok(Self {
            available: self.available + 1,
            ..self
        })
    }

    /// 総冊数を変更する
    ///
    /// 貸出可能数も同じ差分で調整する。貸出中の冊数が新しい総数を
    /// 超える場合は変更を拒否する（切り捨てはしない）。
    pub fn resize(self, new_total: u32) -> Result<Self, CopyCountError> {
        if new_total == 0 || new_total < self.on_loan() {
            return Err(CopyCountError::InvalidTotal);
        }
        Ok(Self {
            total: new_total,
            available: new_total - self.on_loan(),
        })
    }
}
