use super::*;

const MOVE: &[ArgSpec] = &[
    ArgSpec::required("source", ArgKind::Location),
    ArgSpec::required("dest", ArgKind::Location),
    ArgSpec::optional("route", ArgKind::Location),
];

#[test]
fn splits_and_trims_comma_separated_fields() {
    let args = Args::parse("MOVEPLATE", MOVE, " S1 , K1 ").expect("args");
    assert_eq!(args.len(), 2);
    assert_eq!(args.location(0), Ok("S1"));
    assert_eq!(args.location(1), Ok("K1"));
    assert_eq!(args.optional_location(2), None);
}

#[test]
fn accepts_optional_trailing_field() {
    let args = Args::parse("MOVEPLATE", MOVE, "S1,K1,T1").expect("args");
    assert_eq!(args.optional_location(2), Some("T1"));
}

#[test]
fn rejects_wrong_argument_counts() {
    for raw in ["", "S1", "S1,K1,T1,T2"] {
        let err = Args::parse("MOVEPLATE", MOVE, raw).expect_err(raw);
        assert!(matches!(err, CoreError::MalformedArguments(_)), "{raw}");
    }
    let err = Args::parse("DUMPSTOPS", &[], "S1").expect_err("no args");
    assert_eq!(
        err,
        CoreError::MalformedArguments("DUMPSTOPS expects no arguments, got 1".into())
    );
}

#[test]
fn rejects_empty_fields_and_embedded_whitespace() {
    assert!(Args::parse("MOVEPLATE", MOVE, "S1,").is_err());
    assert!(Args::parse("MOVEPLATE", MOVE, "S1,K 1").is_err());
}

#[test]
fn types_directions_and_plates() {
    let schema = &[
        ArgSpec::required("track", ArgKind::Location),
        ArgSpec::required("direction", ArgKind::Direction),
    ];
    let args = Args::parse("SHIFTPLATES", schema, "T1,bwd").expect("args");
    assert_eq!(args.direction(1), Ok(Direction::Backward));
    assert!(args.plate(0).is_err());

    let err = Args::parse("SHIFTPLATES", schema, "T1,sideways").expect_err("direction");
    assert!(matches!(err, CoreError::MalformedArguments(_)));

    let plate = &[ArgSpec::required("plate", ArgKind::Plate)];
    assert_eq!(
        Args::parse("WHEREIS", plate, "P4").expect("plate").plate(0),
        Ok(PlateId(4))
    );
    assert!(Args::parse("WHEREIS", plate, "4").is_err());
}

#[test]
fn rest_fields_take_anything() {
    let schema = &[ArgSpec::rest("args")];
    let args = Args::parse("HOME", schema, "1,,x y").expect("args");
    assert_eq!(args.len(), 3);
    assert!(Args::parse("HOME", schema, "").expect("empty").is_empty());
}
