#![cfg(test)]

// Property tests for ValidatedMap kept inside the crate so they can look at
// storage sharing directly.

use crate::error::SchemaError;
use crate::options::Config;
use crate::validated_map::{Checked, ValidatedMap};
use crate::value::{Map, Value};
use proptest::prelude::*;
use std::collections::HashMap;

// Pool-indexed operations: indices below `schema_len` name schema keys,
// the rest name keys outside the schema.
#[derive(Clone, Debug)]
enum Op {
    Assoc(usize, i64),
    Dissoc(usize),
    Merge(Vec<(usize, i64)>),
    Get(usize),
    GetOr(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, usize, bool, Vec<Op>)> {
    proptest::collection::btree_set("[a-z]{1,4}", 2..=8).prop_flat_map(|pool| {
        let pool: Vec<String> = pool.into_iter().collect();
        let n = pool.len();
        let idx = 0..n;
        let op = prop_oneof![
            (idx.clone(), any::<i64>()).prop_map(|(i, v)| Op::Assoc(i, v)),
            idx.clone().prop_map(Op::Dissoc),
            proptest::collection::vec((idx.clone(), any::<i64>()), 0..4).prop_map(Op::Merge),
            idx.clone().prop_map(Op::Get),
            idx.clone().prop_map(Op::GetOr),
        ];
        (
            Just(pool),
            1..n,
            any::<bool>(),
            proptest::collection::vec(op, 1..40),
        )
    })
}

// Property: state-machine equivalence against a HashMap model.
// Invariants exercised across random operation sequences:
// - Containment: every stored key is a schema key, after every op.
// - Failed strict writes leave the receiver unchanged.
// - `dissoc` of an absent or unknown key returns an equal map.
// - Every op leaves the receiver's data and schema untouched.
// - Reads agree with the model; out-of-schema reads follow the policy.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, schema_len, lenient, ops) in arb_scenario()) {
        let schema_keys = &pool[..schema_len];
        let config = if lenient { Config::lenient() } else { Config::default() };
        let mut sut = ValidatedMap::new(Map::new())
            .with_schema(schema_keys.to_vec())
            .unwrap()
            .with_config(config);
        let mut model: HashMap<String, i64> = HashMap::new();
        let in_schema = |i: usize| i < schema_len;
        let fallback = Value::from("fallback");

        for op in ops {
            let before = sut.clone();
            let before_data = sut.as_map().clone();
            match op {
                Op::Assoc(i, v) => {
                    let k = &pool[i];
                    match sut.assoc(k.as_str(), v) {
                        Ok(Checked::Valid(next)) => {
                            prop_assert!(in_schema(i));
                            model.insert(k.clone(), v);
                            sut = next;
                        }
                        Ok(Checked::InvalidKey) => prop_assert!(!in_schema(i) && lenient),
                        Err(SchemaError::InvalidKeyAssoc { key, schema }) => {
                            prop_assert!(!in_schema(i) && !lenient);
                            prop_assert_eq!(&key, k);
                            prop_assert_eq!(schema, sut.schema().sorted());
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Op::Dissoc(i) => {
                    let k = &pool[i];
                    let next = sut.dissoc(k);
                    if model.remove(k).is_none() {
                        prop_assert_eq!(&next, &sut);
                    }
                    sut = next;
                }
                Op::Merge(entries) => {
                    let next = sut.merge(entries.iter().map(|(i, v)| (pool[*i].clone(), *v)));
                    for (i, v) in entries {
                        if in_schema(i) {
                            model.insert(pool[i].clone(), v);
                        }
                    }
                    sut = next;
                }
                Op::Get(i) => {
                    let k = &pool[i];
                    match sut.get(k) {
                        Ok(Checked::Valid(v)) => {
                            prop_assert!(in_schema(i));
                            prop_assert_eq!(v.cloned(), model.get(k).map(|n| Value::Int(*n)));
                        }
                        Ok(Checked::InvalidKey) => prop_assert!(!in_schema(i) && lenient),
                        Err(SchemaError::InvalidKeyAccess { .. }) => {
                            prop_assert!(!in_schema(i) && !lenient)
                        }
                        Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                    }
                }
                Op::GetOr(i) => {
                    let k = &pool[i];
                    let expected = model.get(k).map(|n| Value::Int(*n)).unwrap_or(fallback.clone());
                    prop_assert_eq!(sut.get_or(k, &fallback), &expected);
                }
            }

            // Receiver untouched by the op.
            prop_assert_eq!(before.as_map(), &before_data);
            prop_assert!(before.schema().ptr_eq(sut.schema()));

            // Containment and model parity.
            prop_assert!(sut.keys().all(|k| sut.contains_key(k)));
            prop_assert_eq!(sut.len(), model.len());
            for (k, v) in &model {
                prop_assert_eq!(sut.as_map().get(k), Some(&Value::Int(*v)));
            }
        }
    }
}
