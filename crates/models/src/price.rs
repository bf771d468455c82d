use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::lenient;

/// Two-letter codes of the Brazilian federative units, in form order.
pub const REGION_CODES: [&str; 27] = [
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA",
    "MG", "MS", "MT", "PA", "PB", "PE", "PI", "PR", "RJ", "RN",
    "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

/// Deployment tier a regional price table belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Environment {
    #[serde(rename = "HML")]
    Homologation,
    #[serde(rename = "PRD")]
    Production,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Homologation, Environment::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Homologation => "HML",
            Environment::Production => "PRD",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HML" => Ok(Environment::Homologation),
            "PRD" => Ok(Environment::Production),
            other => Err(ModelError::Validation(format!("unknown environment: {other}"))),
        }
    }
}

/// Region prices per environment, values kept as decimal strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    #[serde(rename = "HML", default, deserialize_with = "lenient::string_map")]
    pub hml: BTreeMap<String, String>,
    #[serde(rename = "PRD", default, deserialize_with = "lenient::string_map")]
    pub prd: BTreeMap<String, String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl PriceTable {
    pub fn env(&self, env: Environment) -> &BTreeMap<String, String> {
        match env {
            Environment::Homologation => &self.hml,
            Environment::Production => &self.prd,
        }
    }

    pub fn env_mut(&mut self, env: Environment) -> &mut BTreeMap<String, String> {
        match env {
            Environment::Homologation => &mut self.hml,
            Environment::Production => &mut self.prd,
        }
    }

    pub fn get(&self, env: Environment, region: &str) -> Option<&str> {
        self.env(env).get(region).map(String::as_str)
    }
}

/// Price record (`prices` collection).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub code: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub um: String,
    #[serde(default)]
    pub prices: PriceTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_table_uses_env_keys_on_the_wire() {
        let mut table = PriceTable::default();
        table.env_mut(Environment::Homologation).insert("SP".into(), "10.00".into());
        let v = serde_json::to_value(&table).unwrap();
        assert_eq!(v, json!({"HML": {"SP": "10.00"}, "PRD": {}}));
    }

    #[test]
    fn decodes_numeric_region_values() {
        let p: Price = serde_json::from_value(json!({
            "id": "p1", "code": "C", "prices": {"PRD": {"RJ": 12.5}}
        }))
        .unwrap();
        assert_eq!(p.prices.get(Environment::Production, "RJ"), Some("12.5"));
        assert!(p.prices.hml.is_empty());
    }

    #[test]
    fn environment_round_trips_through_str() {
        for env in Environment::ALL {
            assert_eq!(env.as_str().parse::<Environment>().unwrap(), env);
        }
        assert!("DEV".parse::<Environment>().is_err());
    }

    #[test]
    fn region_codes_are_unique_two_letter_codes() {
        let mut codes = REGION_CODES.to_vec();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 27);
        assert!(REGION_CODES.iter().all(|c| c.len() == 2));
    }
}
