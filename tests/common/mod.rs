//! 테스트용 백업 파일 생성 헬퍼

#![allow(dead_code)]

use prost::Message;
use std::fs;
use std::path::{Path, PathBuf};

use dsconvert::journal::JournalWriter;
use dsconvert::proto::{self, path, property_value, EntityProto, Meaning, PropertyValue};

/// 경로 요소 하나 (`id`가 0이면 생략, `name`이 비면 생략)
pub fn element(kind: &str, id: i64, name: &str) -> path::Element {
    path::Element {
        kind: Some(kind.to_string()),
        id: (id != 0).then_some(id),
        name: (!name.is_empty()).then(|| name.to_string()),
    }
}

/// 정수 ID 키를 가진 엔티티
pub fn entity(kind: &str, id: i64, properties: Vec<proto::Property>) -> EntityProto {
    entity_with_path(vec![element(kind, id, "")], properties)
}

pub fn entity_with_path(elements: Vec<path::Element>, properties: Vec<proto::Property>) -> EntityProto {
    EntityProto {
        key: Some(proto::Reference {
            app: Some("s~test-app".to_string()),
            path: Some(proto::Path { element: elements }),
            ..Default::default()
        }),
        entity_group: Some(proto::Path::default()),
        property: properties,
        ..Default::default()
    }
}

pub fn property(name: &str, value: PropertyValue) -> proto::Property {
    property_with(name, Meaning::NoMeaning, value, false)
}

pub fn property_with(name: &str, meaning: Meaning, value: PropertyValue, multiple: bool) -> proto::Property {
    proto::Property {
        meaning: (meaning != Meaning::NoMeaning).then_some(meaning as i32),
        name: Some(name.to_string()),
        multiple: Some(multiple),
        value: Some(value),
        ..Default::default()
    }
}

pub fn int_value(v: i64) -> PropertyValue {
    PropertyValue {
        int64_value: Some(v),
        ..Default::default()
    }
}

pub fn string_value(s: &str) -> PropertyValue {
    bytes_value(s.as_bytes().to_vec())
}

pub fn bytes_value(bytes: Vec<u8>) -> PropertyValue {
    PropertyValue {
        string_value: Some(bytes),
        ..Default::default()
    }
}

pub fn double_value(v: f64) -> PropertyValue {
    PropertyValue {
        double_value: Some(v),
        ..Default::default()
    }
}

pub fn point_value(x: f64, y: f64) -> PropertyValue {
    PropertyValue {
        point_value: Some(property_value::PointValue {
            x: Some(x),
            y: Some(y),
        }),
        ..Default::default()
    }
}

pub fn reference_value(kind: &str, id: i64) -> PropertyValue {
    PropertyValue {
        reference_value: Some(property_value::ReferenceValue {
            app: Some("s~test-app".to_string()),
            path_element: vec![property_value::reference_value::PathElement {
                kind: Some(kind.to_string()),
                id: Some(id),
                name: None,
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// 레코드들을 저널 형식 바이트로 직렬화
pub fn journal(records: &[Vec<u8>]) -> Vec<u8> {
    let mut writer = JournalWriter::new(Vec::new());
    for record in records {
        writer.append(record).unwrap();
    }
    writer.into_inner()
}

/// 엔티티 목록을 백업 파일로 저장
pub fn write_backup(dir: &Path, name: &str, entities: &[EntityProto]) -> PathBuf {
    let records: Vec<Vec<u8>> = entities.iter().map(Message::encode_to_vec).collect();
    write_records(dir, name, &records)
}

/// 임의의 레코드 바이트를 백업 파일로 저장
pub fn write_records(dir: &Path, name: &str, records: &[Vec<u8>]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, journal(records)).unwrap();
    path
}

/// JSON Lines 파일을 값 목록으로 읽음
pub fn read_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
