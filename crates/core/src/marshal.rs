//! Conversion between typed records and [`Value`]
//!
//! Records go through `serde_json::Value` as the intermediate model, the
//! same way stored structs are handled elsewhere in the workspace. JSON
//! objects become `Value::Map`, arrays become `Value::List`. Integers
//! become `Int` and must fit in `i64`; other numbers become `Float`.
//!
//! Decoding is typed: [`unmarshal`] returns the record or a
//! [`VaultError::Marshal`], never a partially-populated value.

use crate::error::{VaultError, VaultResult};
use crate::value::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Convert a serializable record into a [`Value`]
pub fn marshal<T: Serialize + ?Sized>(record: &T) -> VaultResult<Value> {
    let json = serde_json::to_value(record)?;
    from_json(json)
}

/// Convert a [`Value`] back into a typed record
pub fn unmarshal<T: DeserializeOwned>(value: &Value) -> VaultResult<T> {
    let json = to_json(value)?;
    serde_json::from_value(json).map_err(|e| VaultError::marshal(e.to_string()))
}

fn from_json(v: serde_json::Value) -> VaultResult<Value> {
    Ok(match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if n.is_u64() {
                return Err(VaultError::marshal(format!(
                    "integer {} does not fit in a signed 64-bit value",
                    n
                )));
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(VaultError::marshal(format!("unrepresentable number {}", n)));
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::List(
            items
                .into_iter()
                .map(from_json)
                .collect::<VaultResult<Vec<_>>>()?,
        ),
        serde_json::Value::Object(obj) => Value::Map(
            obj.into_iter()
                .map(|(k, v)| from_json(v).map(|v| (k, v)))
                .collect::<VaultResult<_>>()?,
        ),
    })
}

fn to_json(v: &Value) -> VaultResult<serde_json::Value> {
    Ok(match v {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| VaultError::marshal(format!("non-finite float {}", f)))?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(to_json).collect::<VaultResult<_>>()?)
        }
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| to_json(v).map(|v| (k.clone(), v)))
                .collect::<VaultResult<_>>()?,
        ),
        Value::Bytes(_) | Value::Ref(_) => {
            return Err(VaultError::marshal(format!(
                "{} values cannot be decoded into a record",
                v.type_name()
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Reference;
    use serde::Deserialize;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inner {
        label: String,
        tags: HashMap<String, String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Outer {
        id: String,
        count: i64,
        ratio: f64,
        enabled: bool,
        nested: Inner,
        children: BTreeMap<String, Inner>,
        note: Option<String>,
    }

    fn sample() -> Outer {
        let mut tags = HashMap::new();
        tags.insert("k".to_string(), "v".to_string());
        let inner = Inner {
            label: "leaf".to_string(),
            tags,
        };
        let mut children = BTreeMap::new();
        children.insert("c1".to_string(), inner.clone());
        Outer {
            id: "abc".to_string(),
            count: -3,
            ratio: 0.25,
            enabled: true,
            nested: inner,
            children,
            note: None,
        }
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample();
        let value = marshal(&record).unwrap();
        let back: Outer = unmarshal(&value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_struct_becomes_map() {
        let value = marshal(&sample()).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("id"), Some(&Value::from("abc")));
        assert_eq!(map.get("count"), Some(&Value::Int(-3)));
        assert!(map.get("children").unwrap().is_map());
    }

    #[test]
    fn test_unmarshal_wrong_shape_is_marshal_error() {
        let err = unmarshal::<Outer>(&Value::Int(5)).unwrap_err();
        assert!(matches!(err, VaultError::Marshal { .. }));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let err = unmarshal::<f64>(&Value::Float(f64::INFINITY)).unwrap_err();
        assert!(matches!(err, VaultError::Marshal { .. }));
    }

    #[test]
    fn test_ref_not_decodable() {
        let r = Reference::of(&Value::Null);
        let err = unmarshal::<String>(&Value::Ref(r)).unwrap_err();
        assert!(err.to_string().contains("Ref"));
    }

    #[test]
    fn test_unsigned_above_i64_max_rejected() {
        #[derive(Serialize)]
        struct Counter {
            name: String,
            hits: u64,
        }

        let err = marshal(&Counter {
            name: "big".to_string(),
            hits: u64::MAX,
        })
        .unwrap_err();
        assert!(matches!(err, VaultError::Marshal { .. }));
        assert!(err.to_string().contains(&u64::MAX.to_string()));

        let fits = marshal(&Counter {
            name: "edge".to_string(),
            hits: i64::MAX as u64,
        })
        .unwrap();
        assert_eq!(fits.as_map().unwrap().get("hits"), Some(&Value::Int(i64::MAX)));
    }
}
