use mercato::{Mercato, MercatoError};

use crate::helpers::MockConnector;

#[test]
fn build_without_connectors_is_rejected() {
    let err = Mercato::builder().build().err().expect("must fail");
    assert!(matches!(err, MercatoError::InvalidArg(_)));
}

#[test]
fn duplicate_connector_names_are_rejected() {
    let a = MockConnector::builder().name("dup").returns_price("1", false).build();
    let b = MockConnector::builder().name("dup").returns_price("2", false).build();
    let err = Mercato::builder()
        .with_connector(a)
        .with_connector(b)
        .build()
        .err()
        .expect("must fail");
    match err {
        MercatoError::InvalidArg(msg) => assert!(msg.contains("dup")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn zero_result_cap_is_rejected() {
    let a = MockConnector::builder().returns_price("1", false).build();
    assert!(matches!(
        Mercato::builder().with_connector(a).max_results(0).build(),
        Err(MercatoError::InvalidArg(_))
    ));
}

#[test]
fn connectors_keep_registration_order() {
    let a = MockConnector::builder().name("a").returns_price("1", false).build();
    let b = MockConnector::builder().name("b").returns_price("2", false).build();
    let m = Mercato::builder()
        .with_connector(a)
        .with_connector(b)
        .build()
        .unwrap();
    let names: Vec<&str> = m.connectors().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(m.connector("b").is_some());
    assert!(m.connector("c").is_none());
}
