//! 값 변환 모듈
//!
//! [`Entity`]를 범용 JSON 문서로 재귀 변환합니다.
//! 변환은 실패하지 않으며, 해석할 수 없는 값은 `null`이 됩니다.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::entity::{self, Entity, Key, KeyId, TypedValue, MAX_NESTING};

/// 엔티티 하나에 대응하는 JSON 문서
pub type JsonDocument = Map<String, Value>;

/// 엔티티 자신의 키가 들어가는 예약 필드
pub const KEY_FIELD: &str = "key";

/// 키를 `{"kind": ..., "id": ...}` 형태로 변환
///
/// ID가 없으면 `id` 필드를 생략합니다.
///
/// # Examples
/// ```
/// use dsconvert::entity::{Key, KeyId};
/// use dsconvert::translate::key_to_json;
/// use serde_json::json;
///
/// let key = Key::new("Person", Some(KeyId::Int(42)));
/// assert_eq!(key_to_json(&key), json!({"kind": "Person", "id": 42}));
/// ```
pub fn key_to_json(key: &Key) -> Value {
    let mut map = Map::new();
    match &key.id {
        Some(KeyId::Int(id)) => {
            map.insert("id".to_string(), Value::from(*id));
        }
        Some(KeyId::Name(name)) => {
            map.insert("id".to_string(), Value::String(name.clone()));
        }
        None => {}
    }
    map.insert("kind".to_string(), Value::String(key.kind.clone()));
    Value::Object(map)
}

/// 엔티티를 JSON 문서로 변환
pub fn translate(entity: &Entity) -> JsonDocument {
    translate_at(entity, 0)
}

fn translate_at(entity: &Entity, depth: usize) -> JsonDocument {
    let mut document = Map::new();
    document.insert(KEY_FIELD.to_string(), key_to_json(&entity.key));

    for property in &entity.properties {
        let value = value_to_json_at(&property.name, &property.value, depth);
        set_json_value(&mut document, &property.name, value, property.multiple);
    }

    document
}

/// 프로퍼티 값 하나를 JSON 값으로 변환
pub fn value_to_json(name: &str, value: &TypedValue) -> Value {
    value_to_json_at(name, value, 0)
}

/// `depth`는 값을 가진 엔티티의 중첩 깊이
fn value_to_json_at(name: &str, value: &TypedValue, depth: usize) -> Value {
    match value {
        TypedValue::Integer(i) => Value::from(*i),
        // NaN/무한대는 JSON으로 표현할 수 없어 null
        TypedValue::Float(f) => Value::from(*f),
        TypedValue::Boolean(b) => Value::Bool(*b),
        TypedValue::String(bytes) => string_to_json(bytes, depth),
        TypedValue::Key(key) => key_to_json(key),
        TypedValue::Blob(bytes) => parse_embedded_json(bytes).unwrap_or(Value::Null),
        TypedValue::Timestamp(micros) => Value::from(micros / 1000),
        TypedValue::GeoPoint { lat, lon } => json!({ "lat": lat, "lon": lon }),
        TypedValue::Entity(nested) => Value::Object(translate_at(nested, depth + 1)),
        TypedValue::Absent => Value::Null,
        TypedValue::Unsupported(kind) => {
            warn!(property = name, kind = *kind, "변환 규칙이 없는 값, null로 기록합니다");
            Value::Null
        }
    }
}

/// 문자열을 먼저 중첩 엔티티로 디코딩해 보고, 실패하면 문자열 그대로 사용
///
/// 우연히 엔티티로 디코딩되는 문자열은 중첩 객체가 됩니다.
/// 최대 깊이에 이르면 더 이상 디코딩하지 않습니다.
fn string_to_json(bytes: &[u8], depth: usize) -> Value {
    let nested = if depth < MAX_NESTING {
        entity::decode_at(bytes, depth + 1).ok()
    } else {
        None
    };

    match nested {
        Some(nested) => Value::Object(translate_at(&nested, depth + 1)),
        None => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// BLOB에 담긴 JSON 텍스트 파싱
///
/// 첫 공백 아닌 바이트가 `[`면 객체 배열로, 아니면 객체 하나로 읽습니다.
/// 객체 자리의 `null`은 최상위면 빈 객체, 배열 원소면 `null`이 됩니다.
fn parse_embedded_json(bytes: &[u8]) -> Option<Value> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace())?;

    if *first == b'[' {
        serde_json::from_slice::<Vec<Option<Map<String, Value>>>>(bytes)
            .ok()
            .map(|items| {
                Value::Array(
                    items
                        .into_iter()
                        .map(|item| item.map_or(Value::Null, Value::Object))
                        .collect(),
                )
            })
    } else {
        serde_json::from_slice::<Option<Map<String, Value>>>(bytes)
            .ok()
            .map(|object| Value::Object(object.unwrap_or_default()))
    }
}

/// 문서에 값 설정
///
/// `multiple`이면 해당 이름의 배열에 누적하고 (없으면 새로 만듦),
/// 아니면 기존 값을 덮어씁니다.
pub fn set_json_value(document: &mut JsonDocument, name: &str, value: Value, multiple: bool) {
    if !multiple {
        document.insert(name.to_string(), value);
        return;
    }

    match document.get_mut(name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
        None => {
            document.insert(name.to_string(), Value::Array(vec![value]));
        }
    }
}
