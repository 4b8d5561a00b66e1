//! Tests for commlens-model types.

use commlens_model::{CellValue, Column, Rule, RuleId, Table};

#[test]
fn rule_round_trips_through_json_without_stage_fields() {
    let rule = Rule::new(3, RuleId::Explicit("12".to_string()), "Be kind").with_hint("no slurs");
    let json = serde_json::to_string(&rule).expect("serialize rule");
    let round: Rule = serde_json::from_str(&json).expect("deserialize rule");
    assert_eq!(round, rule);
    assert!(round.tokens.is_none());
    assert!(round.is_english_predicted.is_none());
}

#[test]
fn sequential_and_explicit_ids_never_collide() {
    assert_ne!(RuleId::Sequential(1), RuleId::Explicit("1".to_string()));
    assert_eq!(RuleId::Sequential(1).to_string(), "#1");
}

#[test]
fn with_column_replaces_by_name() {
    let mut table = Table::new(vec![Column::new("a", vec![CellValue::Int(1)])]).unwrap();
    table
        .with_column(Column::new("a", vec![CellValue::Int(2)]))
        .unwrap();
    assert_eq!(table.width(), 1);
    assert_eq!(table.get(0, "a"), Some(&CellValue::Int(2)));
}

#[test]
fn select_skips_absent_columns() {
    let table = Table::new(vec![
        Column::new("a", vec![CellValue::Int(1)]),
        Column::new("b", vec![CellValue::Int(2)]),
    ])
    .unwrap();
    let selected = table.select(&["b", "zzz"]);
    assert_eq!(selected.column_names(), vec!["b"]);
}
