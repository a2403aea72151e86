use serde::{Deserialize, Serialize};

/// Discord channel type number for categories.
pub const CATEGORY_CHANNEL_KIND: u8 = 4;

/// Point-in-time copy of a guild's structure, used as the restoration baseline.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildSnapshot {
    pub channels: Vec<ChannelRecord>,
    pub roles: Vec<RoleRecord>,
    /// Unix milliseconds.
    pub captured_at: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRecord {
    pub name: String,
    pub kind: u8,
    pub parent_name: Option<String>,
    pub position: i64,
    #[serde(default)]
    pub permission_overwrites: Vec<OverwriteRecord>,
}

impl ChannelRecord {
    pub fn is_category(&self) -> bool {
        self.kind == CATEGORY_CHANNEL_KIND
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRecord {
    pub name: String,
    pub color: u32,
    pub hoisted: bool,
    /// Decimal string; permission bitsets outgrow JSON's safe integer range.
    pub permissions: String,
    pub position: i64,
}

/// A channel permission overwrite as captured. `subject_id` may point at a
/// role or member that no longer exists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverwriteRecord {
    pub subject_id: u64,
    pub subject_type: OverwriteSubject,
    pub allow: String,
    pub deny: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteSubject {
    Role,
    Member,
}

#[cfg(test)]
mod tests {
    use super::{ChannelRecord, OverwriteRecord, OverwriteSubject};

    #[test]
    fn overwrite_subject_is_stored_lowercase() {
        let record = OverwriteRecord {
            subject_id: 9,
            subject_type: OverwriteSubject::Member,
            allow: "1024".to_owned(),
            deny: "0".to_owned(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["subject_type"], "member");
        assert_eq!(json["allow"], "1024");
    }

    #[test]
    fn channel_without_overwrites_field_still_loads() {
        let record: ChannelRecord = serde_json::from_str(
            r#"{"name":"general","kind":0,"parent_name":null,"position":3}"#,
        )
        .unwrap();
        assert!(record.permission_overwrites.is_empty());
        assert!(!record.is_category());
    }
}
