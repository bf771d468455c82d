use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;

/// A product line attached to a catalog service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, deserialize_with = "lenient::string")]
    pub nome_produto: String,
    #[serde(default, deserialize_with = "lenient::float")]
    pub preco: f64,
    #[serde(default = "default_quantidade", deserialize_with = "lenient::int")]
    pub quantidade: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub descricao: String,
}

fn default_quantidade() -> i64 { 1 }

/// Catalog service record (`services` collection).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub codigo: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tipo: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub servico: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub categoria: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub subcategoria: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub segmento: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub versao: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub edicao: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub imagem: String,
    #[serde(default)]
    pub produto: Vec<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
    /// Fields this dashboard does not edit; kept so a round-trip loses nothing.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_sparse_and_loosely_typed_documents() {
        let svc: Service = serde_json::from_value(json!({
            "id": "svc1",
            "codigo": "42",
            "tipo": null,
            "produto": [{"nomeProduto": "Kit", "preco": "12.5"}],
            "legacyFlag": true
        }))
        .unwrap();
        assert_eq!(svc.codigo, 42);
        assert_eq!(svc.tipo, "");
        assert_eq!(svc.produto[0].preco, 12.5);
        assert_eq!(svc.produto[0].quantidade, 1);
        assert_eq!(svc.extra.get("legacyFlag"), Some(&json!(true)));
    }

    #[test]
    fn encodes_camel_case_without_timestamps() {
        let svc = Service {
            id: "svc1".into(),
            produto: vec![Product { nome_produto: "Kit".into(), preco: 1.0, quantidade: 2, descricao: String::new() }],
            ..Default::default()
        };
        let v = serde_json::to_value(&svc).unwrap();
        assert_eq!(v["produto"][0]["nomeProduto"], "Kit");
        assert!(v.get("createdAt").is_none());
    }
}
