use crate::domain::value_objects::MemberId;
use crate::ports::UpdateOutcome;
use crate::ports::member_store::{Member, MemberStore as MemberStoreTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// MemberStoreのインメモリ実装
pub struct MemberStore {
    members: Mutex<HashMap<MemberId, Member>>,
}

impl MemberStore {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberStoreTrait for MemberStore {
    async fn get_member(&self, member_id: MemberId) -> Result<Option<Member>> {
        Ok(self.members.lock().unwrap().get(&member_id).cloned())
    }

    async fn list_members(&self) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self.members.lock().unwrap().values().cloned().collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    async fn insert_member(&self, member: &Member) -> Result<()> {
        self.members
            .lock()
            .unwrap()
            .insert(member.member_id, member.clone());
        Ok(())
    }

    async fn update_member(&self, member: &Member) -> Result<UpdateOutcome> {
        let mut members = self.members.lock().unwrap();
        match members.get_mut(&member.member_id) {
            Some(existing) => {
                *existing = member.clone();
                Ok(UpdateOutcome::Applied)
            }
            None => Ok(UpdateOutcome::NotApplied),
        }
    }

    async fn delete_member(&self, member_id: MemberId) -> Result<UpdateOutcome> {
        let removed = self.members.lock().unwrap().remove(&member_id);
        Ok(if removed.is_some() {
            UpdateOutcome::Applied
        } else {
            UpdateOutcome::NotApplied
        })
    }

    async fn count_members(&self) -> Result<u64> {
        Ok(self.members.lock().unwrap().len() as u64)
    }
}
