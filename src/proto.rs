//! 엔티티 프로토콜 버퍼 스키마 모듈
//!
//! 데이터스토어 v3 `EntityProto`의 필드 번호를 그대로 따르는 prost 메시지 정의입니다.
//! proto2의 `required` 필드는 prost가 검사하지 않으므로 모두 `Option`으로 받고,
//! 디코딩 직후 [`decode_entity_proto`]에서 누락 여부를 검사합니다.
//!
//! `string_value`는 와이어상 string이지만 BLOB이나 중첩 엔티티처럼
//! UTF-8이 아닌 바이트를 담으므로 `bytes`로 받습니다.

use prost::Message;
use thiserror::Error;

/// 엔티티 레코드 디코딩 실패
#[derive(Error, Debug)]
pub enum DecodeError {
    /// 와이어 포맷 자체가 깨짐
    #[error("잘못된 프로토콜 버퍼 데이터: {0}")]
    Wire(#[from] prost::DecodeError),

    /// proto2 필수 필드 누락
    #[error("필수 필드 누락: {0}")]
    MissingField(&'static str),
}

type Checked = std::result::Result<(), DecodeError>;

fn require<'a, T>(field: &'a Option<T>, name: &'static str) -> std::result::Result<&'a T, DecodeError> {
    field.as_ref().ok_or(DecodeError::MissingField(name))
}

/// 바이트를 `EntityProto`로 디코딩하고 필수 필드를 검사
pub fn decode_entity_proto(bytes: &[u8]) -> std::result::Result<EntityProto, DecodeError> {
    let entity = EntityProto::decode(bytes)?;
    entity.check_required()?;
    Ok(entity)
}

/// 프로퍼티 의미(meaning) 값
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Meaning {
    NoMeaning = 0,
    AtomCategory = 1,
    AtomLink = 2,
    AtomTitle = 3,
    AtomContent = 4,
    AtomSummary = 5,
    AtomAuthor = 6,
    GdWhen = 7,
    GdEmail = 8,
    GeorssPoint = 9,
    GdIm = 10,
    GdPhonenumber = 11,
    GdPostaladdress = 12,
    GdRating = 13,
    Blob = 14,
    Text = 15,
    Bytestring = 16,
    Blobkey = 17,
    IndexValue = 18,
    EntityProto = 19,
    EmptyList = 24,
}

#[derive(Clone, PartialEq, Message)]
pub struct EntityProto {
    #[prost(message, optional, tag = "13")]
    pub key: Option<Reference>,
    #[prost(message, optional, tag = "16")]
    pub entity_group: Option<Path>,
    #[prost(message, optional, tag = "17")]
    pub owner: Option<User>,
    #[prost(int32, optional, tag = "4")]
    pub kind: Option<i32>,
    #[prost(string, optional, tag = "5")]
    pub kind_uri: Option<String>,
    #[prost(message, repeated, tag = "14")]
    pub property: Vec<Property>,
    #[prost(message, repeated, tag = "15")]
    pub raw_property: Vec<Property>,
    #[prost(int32, optional, tag = "18")]
    pub rank: Option<i32>,
}

impl EntityProto {
    fn check_required(&self) -> Checked {
        require(&self.key, "EntityProto.key")?.check_required()?;
        require(&self.entity_group, "EntityProto.entity_group")?.check_required()?;
        if let Some(owner) = &self.owner {
            owner.check_required()?;
        }
        for property in self.property.iter().chain(&self.raw_property) {
            property.check_required()?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Reference {
    #[prost(string, optional, tag = "13")]
    pub app: Option<String>,
    #[prost(string, optional, tag = "20")]
    pub name_space: Option<String>,
    #[prost(message, optional, tag = "14")]
    pub path: Option<Path>,
}

impl Reference {
    fn check_required(&self) -> Checked {
        require(&self.app, "Reference.app")?;
        require(&self.path, "Reference.path")?.check_required()
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Path {
    #[prost(group, repeated, tag = "1")]
    pub element: Vec<path::Element>,
}

impl Path {
    fn check_required(&self) -> Checked {
        for element in &self.element {
            require(&element.kind, "Path.Element.type")?;
        }
        Ok(())
    }
}

pub mod path {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Element {
        /// 스키마상 이름은 `type`
        #[prost(string, optional, tag = "2")]
        pub kind: Option<String>,
        #[prost(int64, optional, tag = "3")]
        pub id: Option<i64>,
        #[prost(string, optional, tag = "4")]
        pub name: Option<String>,
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct User {
    #[prost(string, optional, tag = "1")]
    pub email: Option<String>,
    #[prost(string, optional, tag = "2")]
    pub auth_domain: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub nickname: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub federated_identity: Option<String>,
    #[prost(string, optional, tag = "7")]
    pub federated_provider: Option<String>,
}

impl User {
    fn check_required(&self) -> Checked {
        require(&self.email, "User.email")?;
        require(&self.auth_domain, "User.auth_domain")?;
        Ok(())
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct Property {
    #[prost(enumeration = "Meaning", optional, tag = "1")]
    pub meaning: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub meaning_uri: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
    #[prost(bool, optional, tag = "4")]
    pub multiple: Option<bool>,
    #[prost(message, optional, tag = "5")]
    pub value: Option<PropertyValue>,
    #[prost(bool, optional, tag = "6")]
    pub searchable: Option<bool>,
    #[prost(int32, optional, tag = "8")]
    pub fts_tokenization_option: Option<i32>,
    #[prost(string, optional, tag = "9")]
    pub locale: Option<String>,
}

impl Property {
    fn check_required(&self) -> Checked {
        require(&self.name, "Property.name")?;
        require(&self.multiple, "Property.multiple")?;
        require(&self.value, "Property.value")?.check_required()
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct PropertyValue {
    #[prost(int64, optional, tag = "1")]
    pub int64_value: Option<i64>,
    #[prost(bool, optional, tag = "2")]
    pub boolean_value: Option<bool>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub string_value: Option<Vec<u8>>,
    #[prost(double, optional, tag = "4")]
    pub double_value: Option<f64>,
    #[prost(group, optional, tag = "5")]
    pub point_value: Option<property_value::PointValue>,
    #[prost(group, optional, tag = "8")]
    pub user_value: Option<property_value::UserValue>,
    #[prost(group, optional, tag = "12")]
    pub reference_value: Option<property_value::ReferenceValue>,
}

impl PropertyValue {
    fn check_required(&self) -> Checked {
        if let Some(point) = &self.point_value {
            require(&point.x, "PropertyValue.PointValue.x")?;
            require(&point.y, "PropertyValue.PointValue.y")?;
        }
        if let Some(user) = &self.user_value {
            require(&user.email, "PropertyValue.UserValue.email")?;
            require(&user.auth_domain, "PropertyValue.UserValue.auth_domain")?;
        }
        if let Some(reference) = &self.reference_value {
            require(&reference.app, "PropertyValue.ReferenceValue.app")?;
            for element in &reference.path_element {
                require(&element.kind, "PropertyValue.ReferenceValue.PathElement.type")?;
            }
        }
        Ok(())
    }
}

pub mod property_value {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct PointValue {
        /// 위도
        #[prost(double, optional, tag = "6")]
        pub x: Option<f64>,
        /// 경도
        #[prost(double, optional, tag = "7")]
        pub y: Option<f64>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct UserValue {
        #[prost(string, optional, tag = "9")]
        pub email: Option<String>,
        #[prost(string, optional, tag = "10")]
        pub auth_domain: Option<String>,
        #[prost(string, optional, tag = "11")]
        pub nickname: Option<String>,
        #[prost(string, optional, tag = "21")]
        pub federated_identity: Option<String>,
        #[prost(string, optional, tag = "22")]
        pub federated_provider: Option<String>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct ReferenceValue {
        #[prost(string, optional, tag = "13")]
        pub app: Option<String>,
        #[prost(string, optional, tag = "20")]
        pub name_space: Option<String>,
        #[prost(group, repeated, tag = "14")]
        pub path_element: Vec<reference_value::PathElement>,
    }

    pub mod reference_value {
        #[derive(Clone, PartialEq, prost::Message)]
        pub struct PathElement {
            #[prost(string, optional, tag = "15")]
            pub kind: Option<String>,
            #[prost(int64, optional, tag = "16")]
            pub id: Option<i64>,
            #[prost(string, optional, tag = "17")]
            pub name: Option<String>,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_entity() -> EntityProto {
        EntityProto {
            key: Some(Reference {
                app: Some("s~app".to_string()),
                path: Some(Path {
                    element: vec![path::Element {
                        kind: Some("Person".to_string()),
                        id: Some(1),
                        name: None,
                    }],
                }),
                ..Default::default()
            }),
            entity_group: Some(Path::default()),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_minimal_entity() {
        let bytes = minimal_entity().encode_to_vec();
        let decoded = decode_entity_proto(&bytes).unwrap();
        assert_eq!(decoded, minimal_entity());
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let mut entity = minimal_entity();
        entity.key = None;
        let err = decode_entity_proto(&entity.encode_to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField("EntityProto.key")));
    }

    #[test]
    fn test_missing_property_value_is_rejected() {
        let mut entity = minimal_entity();
        entity.property.push(Property {
            name: Some("age".to_string()),
            multiple: Some(false),
            ..Default::default()
        });
        let err = decode_entity_proto(&entity.encode_to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField("Property.value")));
    }

    #[test]
    fn test_empty_and_garbage_bytes_fail() {
        assert!(decode_entity_proto(b"").is_err());
        assert!(matches!(
            decode_entity_proto(&[0xff, 0xff, 0xff]),
            Err(DecodeError::Wire(_))
        ));
    }

    #[test]
    fn test_point_group_round_trips_through_wire() {
        let value = PropertyValue {
            point_value: Some(property_value::PointValue {
                x: Some(12.5),
                y: Some(77.6),
            }),
            ..Default::default()
        };
        let decoded = PropertyValue::decode(value.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.point_value.and_then(|p| p.y), Some(77.6));
    }
}
