//! Merge policy tests
//!
//! Count, ordering and determinism properties of the veris merge, checked
//! over a small grid of input shapes.

use serde_json::{json, Value};
use veris_attack::{merge, Bundle, Record};

fn recs(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .map(|v| Record::from_value(v).unwrap())
        .collect()
}

fn attack(n: usize) -> Vec<Record> {
    recs((0..n).map(|i| json!({"id": format!("attack-pattern--{i}"), "type": "attack-pattern"})).collect())
}

fn veris(n: usize) -> Vec<Record> {
    recs((0..n).map(|i| json!({"id": format!("x-veris--{i}"), "type": "x-veris"})).collect())
}

/// Mappings pointing at every `stride`-th veris object, plus one dangling ref
fn mappings(veris_count: usize, stride: usize) -> Vec<Record> {
    let mut out: Vec<Value> = (0..veris_count)
        .step_by(stride.max(1))
        .map(|i| {
            json!({
                "id": format!("relationship--{i}"),
                "type": "relationship",
                "relationship_type": "related-to",
                "source_ref": format!("x-veris--{i}"),
                "target_ref": format!("attack-pattern--{i}")
            })
        })
        .collect();
    out.push(json!({
        "id": "relationship--dangling",
        "type": "relationship",
        "source_ref": "x-veris--missing"
    }));
    recs(out)
}

fn mapped_count(veris: &[Record], mappings: &[Record]) -> usize {
    let refs: Vec<&str> = mappings.iter().map(|m| m.source_ref().unwrap()).collect();
    veris
        .iter()
        .filter(|v| refs.contains(&v.id().unwrap()))
        .count()
}

// =============================================================================
// Counts and ordering
// =============================================================================

#[test]
fn test_counts_and_order_over_input_grid() {
    for a in [0, 1, 5] {
        for v in [0, 1, 4, 9] {
            for stride in [1, 2, 3] {
                let (a_in, v_in, m_in) = (attack(a), veris(v), mappings(v, stride));

                let all = merge(a_in.clone(), v_in.clone(), m_in.clone(), true).unwrap();
                assert_eq!(all.objects.len(), a_in.len() + v_in.len() + m_in.len());

                let filtered = merge(a_in.clone(), v_in.clone(), m_in.clone(), false).unwrap();
                let expected_veris = mapped_count(&v_in, &m_in);
                assert_eq!(filtered.objects.len(), a_in.len() + expected_veris + m_in.len());
                assert_eq!(filtered.stats.veris_kept, expected_veris);
                assert_eq!(filtered.stats.veris_dropped, v_in.len() - expected_veris);

                for out in [&all.objects, &filtered.objects] {
                    assert_eq!(&out[..a_in.len()], &a_in[..]);
                    assert_eq!(&out[out.len() - m_in.len()..], &m_in[..]);
                }
            }
        }
    }
}

#[test]
fn test_kept_veris_preserve_relative_order() {
    let v_in = veris(6);
    let m_in = recs(vec![
        json!({"id": "m-a", "source_ref": "x-veris--4"}),
        json!({"id": "m-b", "source_ref": "x-veris--1"}),
    ]);

    let merged = merge(vec![], v_in, m_in, false).unwrap();
    let ids: Vec<&str> = merged.objects.iter().map(|r| r.id().unwrap()).collect();
    assert_eq!(ids, vec!["x-veris--1", "x-veris--4", "m-a", "m-b"]);
}

// =============================================================================
// Boundaries
// =============================================================================

#[test]
fn test_empty_mappings_drop_all_veris() {
    let merged = merge(attack(2), veris(3), vec![], false).unwrap();
    assert_eq!(merged.objects, attack(2));
    assert_eq!(merged.stats.veris_dropped, 3);
}

#[test]
fn test_no_matching_source_ref_gives_empty_middle() {
    let m_in = recs(vec![json!({"id": "m1", "source_ref": "x-veris--nope"})]);
    let merged = merge(attack(1), veris(2), m_in.clone(), false).unwrap();

    assert_eq!(merged.objects.len(), 2);
    assert_eq!(merged.objects[1], m_in[0]);
    assert_eq!(merged.stats.veris_kept, 0);
}

// =============================================================================
// Scenarios
// =============================================================================

fn scenario_inputs() -> (Vec<Record>, Vec<Record>, Vec<Record>) {
    (
        recs(vec![json!({"id": "a1"})]),
        recs(vec![json!({"id": "v1"}), json!({"id": "v2"})]),
        recs(vec![json!({"id": "m1", "source_ref": "v1"})]),
    )
}

#[test]
fn test_scenario_filtered() {
    let (a, v, m) = scenario_inputs();
    let merged = merge(a, v, m, false).unwrap();
    let expected = recs(vec![
        json!({"id": "a1"}),
        json!({"id": "v1"}),
        json!({"id": "m1", "source_ref": "v1"}),
    ]);
    assert_eq!(merged.objects, expected);
}

#[test]
fn test_scenario_allow_unmapped() {
    let (a, v, m) = scenario_inputs();
    let merged = merge(a, v, m, true).unwrap();
    let expected = recs(vec![
        json!({"id": "a1"}),
        json!({"id": "v1"}),
        json!({"id": "v2"}),
        json!({"id": "m1", "source_ref": "v1"}),
    ]);
    assert_eq!(merged.objects, expected);
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_merge_is_deterministic() {
    let run = || {
        let merged = merge(attack(3), veris(7), mappings(7, 2), false).unwrap();
        Bundle::with_id("bundle--fixed", merged.objects)
    };

    let first = run();
    let second = run();
    assert_eq!(first.to_pretty_json().unwrap(), second.to_pretty_json().unwrap());
    assert_eq!(first.objects_sha256().unwrap(), second.objects_sha256().unwrap());
}
