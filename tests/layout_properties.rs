use permroom::{
    Anchor, Constraint, ConstraintSet, EngineConfig, LayoutCalculator, LayoutEngine, LayoutError,
    LayoutWarning, Rect, Size, SizeValue,
};

fn fixed(rows: u16) -> ConstraintSet {
    ConstraintSet::new().with(Constraint::height(SizeValue::Fixed(rows)))
}

fn flex(weight: f64) -> ConstraintSet {
    ConstraintSet::new().with(Constraint::height(SizeValue::Flex(weight)))
}

fn engine_with(components: Vec<(&str, ConstraintSet)>) -> LayoutEngine {
    let mut engine = LayoutEngine::new(EngineConfig::default());
    for (id, constraints) in components {
        engine.add_component(id, constraints).unwrap();
    }
    engine
}

fn total_height(engine: &LayoutEngine, ids: &[&str]) -> u32 {
    let result = engine.result().unwrap();
    ids.iter()
        .map(|id| u32::from(result.rect(id).unwrap().height))
        .sum()
}

#[test]
fn fixed_heights_are_conserved_when_they_fit() {
    let mut engine = engine_with(vec![("a", fixed(3)), ("b", fixed(5)), ("c", fixed(2))]);
    engine.handle_resize(Size::new(80, 24)).unwrap();

    let ids = ["a", "b", "c"];
    // 3 + 5 + 2 rows plus two spacing rows.
    assert_eq!(total_height(&engine, &ids) + 2, 12);
    assert!(!engine.result().unwrap().has_warnings());
}

#[test]
fn fixed_heights_are_capped_by_terminal_height() {
    let sizes = [8u16, 8, 8, 8];
    let mut engine = engine_with(
        sizes
            .iter()
            .enumerate()
            .map(|(idx, rows)| (["a", "b", "c", "d"][idx], fixed(*rows)))
            .collect(),
    );
    engine.handle_resize(Size::new(80, 24)).unwrap();

    let used = total_height(&engine, &["a", "b", "c", "d"]) + 3;
    let declared: u32 = sizes.iter().map(|rows| u32::from(*rows)).sum::<u32>() + 3;
    assert_eq!(used, declared.min(24));
}

#[test]
fn flex_shares_follow_weights() {
    let components = [
        ("a", flex(1.0)),
        ("b", flex(2.0)),
        ("c", flex(4.0)),
    ];
    let inputs: Vec<(&str, &ConstraintSet)> =
        components.iter().map(|(id, set)| (*id, set)).collect();

    for height in [7u16, 20, 33, 50, 101] {
        let result = LayoutCalculator::new(0, 10)
            .calculate(Size::new(40, height), &inputs)
            .unwrap();
        let shares: Vec<u16> = ["a", "b", "c"]
            .iter()
            .map(|id| result.rect(id).unwrap().height)
            .collect();

        let remaining = f64::from(height);
        let total: u32 = shares.iter().map(|h| u32::from(*h)).sum();
        assert!(total <= u32::from(height), "{shares:?} exceeds {height}");
        for (share, weight) in shares.iter().zip([1.0, 2.0, 4.0]) {
            let ideal = remaining * weight / 7.0;
            assert!(
                (f64::from(*share) - ideal).abs() <= 1.0,
                "share {share} too far from {ideal} at height {height}"
            );
        }
    }
}

#[test]
fn mutual_below_is_a_cycle() {
    let mut engine = engine_with(vec![
        ("a", fixed(2).with(Constraint::below("b", 0))),
        ("b", fixed(2).with(Constraint::below("a", 0))),
    ]);

    let err = engine.handle_resize(Size::new(80, 24)).unwrap_err();
    match err {
        LayoutError::CircularDependency { components } => {
            assert!(components.contains(&"a".to_string()));
            assert!(components.contains(&"b".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(engine.result().is_none());
}

#[test]
fn recalculation_is_idempotent() {
    let mut engine = engine_with(vec![
        ("header", fixed(3)),
        ("list", flex(1.0).with(Constraint::min_height(2))),
        ("detail", fixed(4).with(Constraint::right_of("header", 1))),
        (
            "footer",
            fixed(1).with(Constraint::Anchor(Anchor::Bottom)),
        ),
    ]);
    engine.handle_resize(Size::new(100, 30)).unwrap();

    let first = engine.recalculate().unwrap().clone();
    let second = engine.recalculate().unwrap().clone();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn bottom_anchor_sits_on_last_rows() {
    let mut engine = engine_with(vec![(
        "footer",
        fixed(2).with(Constraint::Anchor(Anchor::Bottom)),
    )]);
    engine.handle_resize(Size::new(80, 24)).unwrap();

    assert_eq!(
        engine.result().unwrap().rect("footer"),
        Some(Rect::new(0, 22, 80, 2))
    );
}

#[test]
fn below_relationship_adds_spacing_and_offset() {
    let mut engine = engine_with(vec![
        ("header", fixed(4)),
        ("body", flex(1.0).with(Constraint::below("header", 1))),
    ]);
    engine.handle_resize(Size::new(80, 24)).unwrap();

    let result = engine.result().unwrap();
    assert_eq!(result.rect("header"), Some(Rect::new(0, 0, 80, 4)));
    let body = result.rect("body").unwrap();
    assert_eq!(body.y, 4 + 1 + 1);
    assert_eq!(body.height, 24 - 4 - 1);
}

#[test]
fn overflowing_fixed_heights_warn_but_still_lay_out() {
    let mut engine = engine_with(vec![
        ("one", fixed(10)),
        ("two", fixed(10)),
        ("three", fixed(10)),
        ("rest", flex(1.0)),
    ]);
    engine.handle_resize(Size::new(80, 30)).unwrap();

    let result = engine.result().unwrap();
    for id in ["one", "two", "three", "rest"] {
        assert!(result.rect(id).is_some(), "{id} missing");
    }
    assert_eq!(result.rect("rest").unwrap().height, 0);
    assert!(result.warnings().iter().any(|warning| matches!(
        warning,
        LayoutWarning::HeightDeficit { required, available: 30 } if *required > 30
    )));
    assert!(result
        .warning_messages()
        .iter()
        .any(|message| message.contains("overflow")));
}

#[test]
fn three_ten_row_components_overflow_thirty_rows() {
    let mut engine = engine_with(vec![
        ("one", fixed(10)),
        ("two", fixed(10)),
        ("three", fixed(10)),
    ]);
    engine.handle_resize(Size::new(80, 30)).unwrap();

    let result = engine.result().unwrap();
    assert!(result.warnings().contains(&LayoutWarning::HeightDeficit {
        required: 32,
        available: 30,
    }));
    assert!(result
        .warning_messages()
        .iter()
        .any(|message| message.contains("overflow") && message.contains("need 32, have 30")));
    for id in ["one", "two", "three"] {
        assert!(result.rect(id).is_some(), "{id} missing");
    }
}

#[test]
fn coordinates_are_never_negative_for_in_flow_components() {
    let mut engine = engine_with(vec![
        ("header", fixed(3)),
        ("list", flex(2.0)),
        ("detail", flex(1.0)),
        ("footer", fixed(2).with(Constraint::Anchor(Anchor::Bottom))),
    ]);
    for size in [Size::new(20, 5), Size::new(80, 24), Size::new(200, 60)] {
        engine.handle_resize(size).unwrap();
        for rect in engine.result().unwrap().components().values() {
            assert!(rect.x >= 0 && rect.y >= 0, "{rect:?} at {size:?}");
        }
    }
}
