use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::str::FromStr;

///
/// Identifier of a server-owned record.
///
/// The API sends ids as JSON numbers or strings depending on the endpoint.
/// Integer strings are read as numbers so the same record compares equal whichever endpoint it came from.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    ///
    /// Reads an id out of an arbitrary JSON value.
    /// Null, empty strings and non-integer values are not ids.
    ///
    pub fn from_value(value: &Value) -> Option<EntityId> {
        match value {
            Value::Number(n) => n.as_i64().map(EntityId::Number),
            Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        EntityId::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("expected an id, found {value}")))
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{n}"),
            EntityId::Text(s) => write!(f, "{s}"),
        }
    }
}

///
/// Canonical integer strings become `Number` so ids typed on the command line compare equal to ids
/// from the API. Strings with leading zeros or a `+` sign stay `Text`.
///
impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            // "007" or "+7" would not be sent back as they were received
            Ok(n) if n.to_string() == s => EntityId::Number(n),
            _ => EntityId::Text(s.to_string()),
        })
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Number(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|never| match never {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_numbers_and_strings() {
        let ids: Vec<EntityId> = serde_json::from_value(json!([7, "7", "PAT-0007"])).unwrap();
        assert_eq!(
            ids,
            vec![
                EntityId::Number(7),
                EntityId::Number(7),
                EntityId::Text("PAT-0007".to_string())
            ]
        );

        assert!(serde_json::from_value::<EntityId>(json!(null)).is_err());
    }

    #[test]
    fn serializes_in_original_form() {
        let ids = vec![EntityId::Number(7), EntityId::from("PAT-0007")];
        assert_eq!(serde_json::to_value(ids).unwrap(), json!([7, "PAT-0007"]));
    }

    #[test]
    fn keeps_leading_zeros() {
        let id: EntityId = serde_json::from_value(json!("007")).unwrap();
        assert_eq!(id, EntityId::Text("007".to_string()));
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("007"));

        assert_eq!("+7".parse::<EntityId>().unwrap(), EntityId::from("+7"));
        assert_eq!("0".parse::<EntityId>().unwrap(), EntityId::Number(0));
    }

    #[test]
    fn parses_command_line_ids() {
        assert_eq!("42".parse::<EntityId>().unwrap(), EntityId::Number(42));
        assert_eq!(
            "D-42".parse::<EntityId>().unwrap(),
            EntityId::Text("D-42".to_string())
        );
    }

    #[test]
    fn from_value() {
        assert_eq!(EntityId::from_value(&json!(3)), Some(EntityId::Number(3)));
        assert_eq!(EntityId::from_value(&json!("3")), Some(EntityId::Number(3)));
        assert_eq!(
            EntityId::from_value(&json!("REQ-3")),
            Some(EntityId::from("REQ-3"))
        );
        assert_eq!(EntityId::from_value(&json!("")), None);
        assert_eq!(EntityId::from_value(&json!("-4")), Some(EntityId::Number(-4)));
        assert_eq!(EntityId::from_value(&json!(null)), None);
        assert_eq!(EntityId::from_value(&json!(1.5)), None);
    }
}
