//! Tests for batch sizing, ordering and indexing

use crate::batch::{BatchPlan, Variables, estimate_batch_size, generate_batch};
use crate::error::BatchError;
use crate::params::ParamSet;
use crate::variable::VariableField;

fn params(pairs: &[(&str, f64)]) -> ParamSet {
    pairs.iter().map(|&(n, v)| (n, v)).collect()
}

fn vars(entries: Vec<(&str, VariableField)>) -> Variables {
    entries
        .into_iter()
        .map(|(n, f)| (n.to_string(), f))
        .collect()
}

/// Inputs covering disabled, range, discrete and unmatched variables
fn scenarios() -> Vec<(ParamSet, Variables)> {
    vec![
        (params(&[("x", 1.0)]), Variables::new()),
        (
            params(&[("x", 1.0), ("y", 2.0)]),
            vars(vec![("x", VariableField::range(0.0, 1.0, 0.5))]),
        ),
        (
            params(&[("a", 0.0), ("b", 0.0), ("c", 9.0)]),
            vars(vec![
                ("a", VariableField::discrete(vec![1.0, 2.0])),
                ("b", VariableField::range(0.0, 1.0, 0.25)),
                ("c", VariableField::range(0.0, 5.0, 1.0).disabled()),
                ("unused", VariableField::discrete(vec![7.0, 8.0, 9.0])),
            ]),
        ),
        (
            params(&[("p", 3.0), ("q", 4.0)]),
            vars(vec![("q", VariableField::range(1.0, 0.0, 1.0))]),
        ),
    ]
}

#[test]
fn test_spec_scenario_single_range() {
    let base = params(&[("x", 1.0), ("y", 2.0)]);
    let variables = vars(vec![("x", VariableField::range(0.0, 1.0, 0.5))]);

    assert_eq!(estimate_batch_size(&base, &variables), 3);

    let batch = generate_batch(&base, &variables);
    let observed: Vec<(usize, f64, f64)> = batch
        .iter()
        .map(|item| {
            (
                item.index,
                item.params.get("x").unwrap(),
                item.params.get("y").unwrap(),
            )
        })
        .collect();
    assert_eq!(observed, vec![(1, 0.0, 2.0), (2, 0.5, 2.0), (3, 1.0, 2.0)]);
}

#[test]
fn test_length_matches_estimate() {
    for (base, variables) in scenarios() {
        assert_eq!(
            generate_batch(&base, &variables).len(),
            estimate_batch_size(&base, &variables)
        );
    }
}

#[test]
fn test_indices_are_contiguous() {
    for (base, variables) in scenarios() {
        let batch = generate_batch(&base, &variables);
        let indices: Vec<usize> = batch.iter().map(|item| item.index).collect();
        let expected: Vec<usize> = (1..=batch.len()).collect();
        assert_eq!(indices, expected);
    }
}

#[test]
fn test_item_keys_equal_base_keys() {
    for (base, variables) in scenarios() {
        let base_names: Vec<&str> = base.names().collect();
        for item in generate_batch(&base, &variables) {
            let names: Vec<&str> = item.params.names().collect();
            assert_eq!(names, base_names);
        }
    }
}

#[test]
fn test_all_disabled_yields_base_params() {
    let base = params(&[("x", 1.5), ("y", -2.0)]);
    let variables = vars(vec![
        ("x", VariableField::range(0.0, 1.0, 0.1).disabled()),
        ("y", VariableField::discrete(vec![1.0, 2.0]).disabled()),
    ]);

    let batch = generate_batch(&base, &variables);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].index, 1);
    assert_eq!(batch[0].params, base);
}

#[test]
fn test_last_axis_varies_fastest() {
    let base = params(&[("a", 0.0), ("b", 0.0)]);
    let variables = vars(vec![
        ("a", VariableField::discrete(vec![1.0, 2.0])),
        ("b", VariableField::discrete(vec![10.0, 20.0, 30.0])),
    ]);

    let combos: Vec<(f64, f64)> = generate_batch(&base, &variables)
        .iter()
        .map(|item| (item.params.get("a").unwrap(), item.params.get("b").unwrap()))
        .collect();
    assert_eq!(
        combos,
        vec![
            (1.0, 10.0),
            (1.0, 20.0),
            (1.0, 30.0),
            (2.0, 10.0),
            (2.0, 20.0),
            (2.0, 30.0),
        ]
    );
}

#[test]
fn test_base_order_controls_axis_order() {
    let variables = vars(vec![
        ("a", VariableField::discrete(vec![1.0, 2.0])),
        ("b", VariableField::discrete(vec![10.0, 20.0])),
    ]);

    let ab = generate_batch(&params(&[("a", 0.0), ("b", 0.0)]), &variables);
    let ba = generate_batch(&params(&[("b", 0.0), ("a", 0.0)]), &variables);

    assert_eq!(ab[1].params.get("a"), Some(1.0));
    assert_eq!(ab[1].params.get("b"), Some(20.0));
    assert_eq!(ba[1].params.get("b"), Some(10.0));
    assert_eq!(ba[1].params.get("a"), Some(2.0));
}

#[test]
fn test_empty_variable_gives_zero_size() {
    let base = params(&[("p", 3.0), ("q", 4.0)]);
    let variables = vars(vec![("q", VariableField::range(1.0, 0.0, 1.0))]);

    assert_eq!(estimate_batch_size(&base, &variables), 0);
    assert!(generate_batch(&base, &variables).is_empty());
}

#[test]
fn test_validate_reports_empty_variable() {
    let base = params(&[("p", 3.0), ("q", 4.0)]);
    let variables = vars(vec![("q", VariableField::range(0.0, 1.0, 0.0))]);

    let err = BatchPlan::validate(&base, &variables).unwrap_err();
    assert_eq!(
        err,
        BatchError::EmptyVariable {
            name: "q".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "variable 'q' is enabled but has no generated values"
    );
}

#[test]
fn test_validate_ignores_unmatched_variables() {
    let base = params(&[("p", 3.0)]);
    let variables = vars(vec![("other", VariableField::range(0.0, 1.0, 0.0))]);

    let plan = BatchPlan::validate(&base, &variables).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.enabled_variables().count(), 0);
}

#[test]
fn test_lazy_iteration_matches_eager_and_restarts() {
    let (base, variables) = scenarios().swap_remove(2);
    let plan = BatchPlan::new(&base, &variables);
    let eager = generate_batch(&base, &variables);

    let first: Vec<_> = plan.iter().collect();
    let second: Vec<_> = plan.iter().collect();
    assert_eq!(first, eager);
    assert_eq!(second, eager);
}

#[test]
fn test_get_matches_iteration() {
    let (base, variables) = scenarios().swap_remove(2);
    let plan = BatchPlan::new(&base, &variables);

    for item in &plan {
        assert_eq!(plan.get(item.index), Some(item));
    }
    assert_eq!(plan.get(0), None);
    assert_eq!(plan.get(plan.len() + 1), None);
}

#[test]
fn test_plan_is_a_snapshot() {
    let base = params(&[("x", 0.0)]);
    let mut variables = vars(vec![("x", VariableField::discrete(vec![1.0, 2.0]))]);
    let plan = BatchPlan::new(&base, &variables);

    if let Some(field) = variables.get_mut("x") {
        *field = VariableField::discrete(vec![5.0, 6.0, 7.0]);
    }

    let xs: Vec<f64> = plan.iter().map(|i| i.params.get("x").unwrap()).collect();
    assert_eq!(xs, vec![1.0, 2.0]);
}

#[test]
fn test_axes_report_variable_flags() {
    let (base, variables) = scenarios().swap_remove(2);
    let plan = BatchPlan::new(&base, &variables);

    let flags: Vec<(&str, bool, usize)> = plan
        .axes()
        .iter()
        .map(|a| (a.name.as_str(), a.variable, a.values.len()))
        .collect();
    assert_eq!(flags, vec![("a", true, 2), ("b", true, 5), ("c", false, 1)]);
    assert_eq!(plan.len(), 10);
}
