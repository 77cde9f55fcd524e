//! 엔티티 디코딩 모듈
//!
//! 레코드 바이트를 [`Entity`]로 바꾸는 두 단계를 담당합니다.
//!
//! 1. 읽기: 와이어 포맷 디코딩과 필수 필드 검사 ([`crate::proto`])
//! 2. 파싱: 키 경로 검증과 프로퍼티 값 타입 결정
//!
//! 두 단계의 실패는 [`EntityError`]의 서로 다른 메시지로만 구분됩니다.

use thiserror::Error;

use crate::proto::{self, property_value, DecodeError, EntityProto, Meaning, PropertyValue};

/// 중첩 엔티티 최대 깊이 (최상위 엔티티는 0)
pub const MAX_NESTING: usize = 64;

/// 키의 식별자
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyId {
    /// 정수 ID
    Int(i64),
    /// 문자열 이름
    Name(String),
}

impl KeyId {
    /// 0이 아닌 정수 ID를 우선하고, 없으면 비어 있지 않은 이름을 사용
    fn from_parts(id: i64, name: &str) -> Option<Self> {
        if id != 0 {
            Some(KeyId::Int(id))
        } else if !name.is_empty() {
            Some(KeyId::Name(name.to_string()))
        } else {
            None
        }
    }
}

/// 엔티티 키 (경로의 마지막 요소)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub kind: String,
    pub id: Option<KeyId>,
}

impl Key {
    pub fn new(kind: impl Into<String>, id: Option<KeyId>) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

/// 프로퍼티 값
///
/// 문자열은 중첩 엔티티 재해석을 위해 원본 바이트 그대로 보관합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(Vec<u8>),
    Blob(Vec<u8>),
    Entity(Box<Entity>),
    Key(Key),
    /// 에포크 기준 마이크로초
    Timestamp(i64),
    GeoPoint { lat: f64, lon: f64 },
    /// 변환 규칙이 없는 값 (blob key, byte string, 인덱스 값)
    Unsupported(&'static str),
    Absent,
}

/// 이름이 붙은 프로퍼티
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: TypedValue,
    pub multiple: bool,
}

/// 디코딩된 엔티티
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub key: Key,
    pub properties: Vec<Property>,
}

/// 키/프로퍼티 추출 실패
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("엔티티에 키가 없습니다")]
    MissingKey,

    #[error("키 경로가 비어 있습니다")]
    EmptyPath,

    #[error("유효하지 않은 키: {0}")]
    InvalidKey(&'static str),

    #[error("중첩 엔티티 디코딩 실패: {0}")]
    NestedDecode(#[from] DecodeError),

    #[error("중첩 엔티티 깊이가 {}을 넘습니다", MAX_NESTING)]
    TooDeep,
}

/// 레코드 하나의 복구 가능한 실패
///
/// 표시 문자열은 에러 출력 파일에 그대로 기록됩니다.
#[derive(Error, Debug)]
pub enum EntityError {
    #[error("Error while reading protobuf entity")]
    Decode(#[from] DecodeError),

    #[error("Error while parsing protobuf entity")]
    Parse(#[from] ParseError),
}

/// 레코드 바이트를 엔티티로 디코딩
pub fn decode(bytes: &[u8]) -> Result<Entity, EntityError> {
    decode_at(bytes, 0)
}

/// `depth` 위치에 놓일 엔티티로 디코딩
pub(crate) fn decode_at(bytes: &[u8], depth: usize) -> Result<Entity, EntityError> {
    let proto = proto::decode_entity_proto(bytes)?;
    Ok(Entity::from_proto_at(&proto, depth)?)
}

struct PathPart<'a> {
    kind: &'a str,
    id: i64,
    name: &'a str,
}

/// 루트부터 리프까지 경로를 검증하고 리프 키를 반환
fn build_key<'a>(app: &str, parts: impl IntoIterator<Item = PathPart<'a>>) -> Result<Key, ParseError> {
    if app.is_empty() {
        return Err(ParseError::InvalidKey("app이 비어 있습니다"));
    }

    let mut leaf: Option<Key> = None;
    for part in parts {
        if leaf.as_ref().is_some_and(|parent| parent.id.is_none()) {
            return Err(ParseError::InvalidKey("불완전한 부모 키"));
        }
        if part.kind.is_empty() {
            return Err(ParseError::InvalidKey("kind가 비어 있습니다"));
        }
        if part.id != 0 && !part.name.is_empty() {
            return Err(ParseError::InvalidKey("정수 ID와 이름이 동시에 존재"));
        }
        leaf = Some(Key::new(part.kind, KeyId::from_parts(part.id, part.name)));
    }

    leaf.ok_or(ParseError::EmptyPath)
}

fn key_from_reference(reference: &proto::Reference) -> Result<Key, ParseError> {
    let elements = reference.path.as_ref().map(|p| p.element.as_slice()).unwrap_or_default();
    build_key(
        reference.app.as_deref().unwrap_or_default(),
        elements.iter().map(|e| PathPart {
            kind: e.kind.as_deref().unwrap_or_default(),
            id: e.id.unwrap_or_default(),
            name: e.name.as_deref().unwrap_or_default(),
        }),
    )
}

fn key_from_reference_value(reference: &property_value::ReferenceValue) -> Result<Key, ParseError> {
    build_key(
        reference.app.as_deref().unwrap_or_default(),
        reference.path_element.iter().map(|e| PathPart {
            kind: e.kind.as_deref().unwrap_or_default(),
            id: e.id.unwrap_or_default(),
            name: e.name.as_deref().unwrap_or_default(),
        }),
    )
}

fn meaning_of(property: &proto::Property) -> Meaning {
    property
        .meaning
        .and_then(|m| Meaning::try_from(m).ok())
        .unwrap_or(Meaning::NoMeaning)
}

/// 채워진 첫 번째 필드로 값 타입을 결정
fn typed_value(value: &PropertyValue, meaning: Meaning, depth: usize) -> Result<TypedValue, ParseError> {
    if let Some(v) = value.int64_value {
        return Ok(match meaning {
            Meaning::GdWhen => TypedValue::Timestamp(v),
            _ => TypedValue::Integer(v),
        });
    }
    if let Some(b) = value.boolean_value {
        return Ok(TypedValue::Boolean(b));
    }
    if let Some(bytes) = &value.string_value {
        return Ok(match meaning {
            Meaning::Blob => TypedValue::Blob(bytes.clone()),
            Meaning::Blobkey => TypedValue::Unsupported("blob key"),
            Meaning::Bytestring => TypedValue::Unsupported("byte string"),
            Meaning::EntityProto => {
                if depth >= MAX_NESTING {
                    return Err(ParseError::TooDeep);
                }
                let nested = proto::decode_entity_proto(bytes)?;
                TypedValue::Entity(Box::new(Entity::from_proto_at(&nested, depth + 1)?))
            }
            _ => TypedValue::String(bytes.clone()),
        });
    }
    if let Some(d) = value.double_value {
        return Ok(TypedValue::Float(d));
    }
    if let Some(reference) = &value.reference_value {
        return Ok(TypedValue::Key(key_from_reference_value(reference)?));
    }
    if let Some(point) = &value.point_value {
        return Ok(TypedValue::GeoPoint {
            lat: point.x.unwrap_or_default(),
            lon: point.y.unwrap_or_default(),
        });
    }
    // user 값은 변환 대상이 아님
    Ok(TypedValue::Absent)
}

impl Entity {
    /// 디코딩된 `EntityProto`에서 키와 프로퍼티를 추출
    ///
    /// 인덱스된 프로퍼티를 먼저, 인덱스되지 않은 프로퍼티를 그 뒤에 둡니다.
    /// 인덱스되지 않은 쪽의 `INDEX_VALUE` 프로퍼티는 건너뜁니다.
    pub fn from_proto(proto: &EntityProto) -> Result<Self, ParseError> {
        Self::from_proto_at(proto, 0)
    }

    /// `ENTITY_PROTO` 값은 `MAX_NESTING` 깊이까지만 펼칩니다.
    pub(crate) fn from_proto_at(proto: &EntityProto, depth: usize) -> Result<Self, ParseError> {
        let key = key_from_reference(proto.key.as_ref().ok_or(ParseError::MissingKey)?)?;

        let raw = proto
            .raw_property
            .iter()
            .filter(|p| meaning_of(p) != Meaning::IndexValue);

        let mut properties = Vec::with_capacity(proto.property.len() + proto.raw_property.len());
        for property in proto.property.iter().chain(raw) {
            let meaning = meaning_of(property);
            let value = match (&property.value, meaning) {
                (_, Meaning::IndexValue) => TypedValue::Unsupported("index value"),
                (Some(value), _) => typed_value(value, meaning, depth)?,
                (None, _) => TypedValue::Absent,
            };
            properties.push(Property {
                name: property.name.clone().unwrap_or_default(),
                value,
                multiple: property.multiple.unwrap_or_default(),
            });
        }

        Ok(Self { key, properties })
    }
}
