use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Opaque group key, rendered as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(Vec<u8>);

impl GroupId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for GroupId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())?;
        if bytes.is_empty() {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Self(bytes))
    }
}

impl Serialize for GroupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for GroupId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A named set of participants with a designated creator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub creator: String,
    #[serde(default)]
    pub name: String,
    pub members: Vec<String>,
}

impl Group {
    pub fn new(id: GroupId, creator: impl Into<String>) -> Self {
        Self {
            id,
            creator: creator.into(),
            name: String::new(),
            members: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_members(mut self, members: Vec<String>) -> Self {
        self.members = members;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_id_parses_hex() {
        let id: GroupId = "aabb01".parse().unwrap();
        assert_eq!(id.as_bytes(), &[0xaa, 0xbb, 0x01]);
        assert_eq!(id.to_string(), "aabb01");
    }

    #[test]
    fn group_id_rejects_garbage() {
        assert!("zz".parse::<GroupId>().is_err());
        assert!("".parse::<GroupId>().is_err());
        assert!("abc".parse::<GroupId>().is_err());
    }

    #[test]
    fn group_serializes_id_as_hex_string() {
        let group = Group::new(GroupId::new(vec![0xaa]), "X1")
            .with_name("Team")
            .with_members(vec!["X1".into()]);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["id"], "aa");
        let back: Group = serde_json::from_value(json).unwrap();
        assert_eq!(back, group);
    }
}
