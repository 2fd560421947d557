/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use ddb_marshal::{Item, Record};
use proptest::prelude::*;
use serde_json::json;

#[derive(Record, Default, Debug, Clone, PartialEq)]
struct Sample {
    #[dynamo = "id,hash"]
    id: String,
    #[dynamo = "seq,range"]
    seq: u64,
    #[dynamo = "delta"]
    delta: i16,
    #[dynamo = "ratio"]
    ratio: f64,
    #[dynamo = "weight"]
    weight: f32,
    #[dynamo = "active"]
    active: bool,
    #[dynamo = "labels"]
    labels: Vec<String>,
    #[dynamo = "readings"]
    readings: Vec<i64>,
    #[dynamo = "payload"]
    payload: Vec<u8>,
    #[dynamo = "parent"]
    parent: Option<u32>,
}

fn finite_f64() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

fn finite_f32() -> impl Strategy<Value = f32> {
    prop::num::f32::NORMAL | prop::num::f32::SUBNORMAL | prop::num::f32::ZERO
}

prop_compose! {
    fn sample()(
        id in ".*",
        seq in any::<u64>(),
        delta in any::<i16>(),
        ratio in finite_f64(),
        weight in finite_f32(),
        active in any::<bool>(),
        labels in prop::collection::vec(".*", 0..4),
        readings in prop::collection::vec(any::<i64>(), 0..4),
        payload in prop::collection::vec(any::<u8>(), 0..16),
        parent in any::<Option<u32>>(),
    ) -> Sample {
        Sample { id, seq, delta, ratio, weight, active, labels, readings, payload, parent }
    }
}

proptest! {
    #[test]
    fn marshal_then_unmarshal_is_identity(record in sample()) {
        let item = ddb_marshal::marshal(&record, false).unwrap();
        let mut decoded = Sample::default();
        ddb_marshal::unmarshal(&item, &mut decoded).unwrap();
        // Zero values are omitted and decode as the default, so -0.0 compares equal to 0.0.
        prop_assert_eq!(decoded.ratio, record.ratio);
        prop_assert_eq!(decoded.seq, record.seq);
        prop_assert_eq!(&decoded.id, &record.id);
        prop_assert_eq!(decoded.weight, record.weight);
        prop_assert_eq!(&decoded.labels, &record.labels);
        prop_assert_eq!(&decoded.readings, &record.readings);
        prop_assert_eq!(&decoded.payload, &record.payload);
        prop_assert_eq!(decoded.parent, record.parent);
        prop_assert_eq!(decoded.active, record.active);
        prop_assert_eq!(decoded.delta, record.delta);
    }

    #[test]
    fn keys_are_a_subset_of_the_full_item(record in sample()) {
        let full = ddb_marshal::marshal(&record, false).unwrap();
        let keys = ddb_marshal::marshal_keys(&record).unwrap();
        for (name, value) in &keys {
            prop_assert!(name == "id" || name == "seq");
            prop_assert_eq!(full.get(name), Some(value));
        }
    }

    #[test]
    fn zero_values_are_omitted(record in sample()) {
        let item = ddb_marshal::marshal(&record, false).unwrap();
        prop_assert_eq!(item.contains_key("id"), !record.id.is_empty());
        prop_assert_eq!(item.contains_key("seq"), record.seq != 0);
        prop_assert_eq!(item.contains_key("active"), record.active);
        prop_assert_eq!(item.contains_key("labels"), !record.labels.is_empty());
        prop_assert_eq!(item.contains_key("payload"), !record.payload.is_empty());
        prop_assert_eq!(item.contains_key("parent"), record.parent.is_some());
    }
}

#[test]
fn items_cross_the_wire_as_json() {
    let sample = Sample {
        id: "s-1".into(),
        seq: 42,
        ratio: 0.25,
        active: true,
        labels: vec!["a".into(), "b".into()],
        payload: b"raw".to_vec(),
        parent: Some(7),
        ..Default::default()
    };
    let item = ddb_marshal::marshal(&sample, false).unwrap();
    assert_eq!(
        serde_json::to_value(&item).unwrap(),
        json!({
            "id": {"S": "s-1"},
            "seq": {"N": "42"},
            "ratio": {"N": "0.25"},
            "active": {"S": "true"},
            "labels": {"SS": ["a", "b"]},
            "payload": {"B": "raw"},
            "parent": {"N": "7"},
        })
    );

    let response: Item = serde_json::from_value(json!({
        "id": {"S": "s-1"},
        "seq": {"N": "42"},
        "readings": {"NS": ["-1", "3"]},
    }))
    .unwrap();
    let mut decoded = Sample::default();
    ddb_marshal::unmarshal(&response, &mut decoded).unwrap();
    assert_eq!(decoded.readings, vec![-1, 3]);
    assert_eq!(decoded.seq, 42);
}
