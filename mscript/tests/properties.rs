use std::rc::Rc;

use mscript::*;

fn session() -> Session {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut session = Session::new();
    session.add_object(Object::spacecraft("sat1"));
    session.add_object(Object::variable("i", 2.0));
    session.add_object(Object::variable("x", 0.0));
    session.add_object(Object::array("A", 3, 3));
    session.add_object(Object::array("M1", 1, 1));
    session.add_object(Object::array("M2", 2, 1));
    session.add_object(Object::report_file("rf"));
    session
}

fn classify(session: &mut Session, description: &str, parameters_first: bool) -> ElementWrapper {
    session
        .try_wrapper(description, ClassifyOptions::parameters_first(parameters_first))
        .unwrap()
}

fn bound_object(wrapper: &ElementWrapper) -> ObjectRef {
    match wrapper.kind() {
        WrapperKind::Parameter(Some(object))
        | WrapperKind::Variable(Some(object))
        | WrapperKind::Array(Some(object))
        | WrapperKind::Object(Some(object))
        | WrapperKind::StringObject(Some(object)) => Rc::clone(object),
        WrapperKind::ObjectProperty(property) => Rc::clone(property.target().unwrap().0),
        kind => panic!("not bound to an object: {:?}", kind),
    }
}

#[test]
fn test_number_literals() {
    let mut session = session();
    for text in ["0", "3.5", "-2", "+7", ".25", "1e3", "6.02E23", "-4.5e-3"] {
        let expected: f64 = text.parse().unwrap();
        for parameters_first in [true, false] {
            let wrapper = classify(&mut session, text, parameters_first);
            assert_eq!(wrapper.wrapper_type(), WrapperType::Number, "{}", text);
            assert_eq!(wrapper.evaluate_real().unwrap(), expected, "{}", text);
        }
    }
}

#[test]
fn test_quotes_win_over_numbers() {
    let mut session = session();
    let wrapper = classify(&mut session, "'3.14'", true);
    assert_eq!(wrapper.wrapper_type(), WrapperType::String);
    assert_eq!(wrapper.evaluate_string().unwrap(), "3.14");
}

#[test]
fn test_dotted_name_policy() {
    let mut session = session();
    let parameter = classify(&mut session, "sat1.X", true);
    assert_eq!(parameter.wrapper_type(), WrapperType::Parameter);
    let property = classify(&mut session, "sat1.X", false);
    assert_eq!(property.wrapper_type(), WrapperType::ObjectProperty);

    assert_eq!(parameter.evaluate_real().unwrap(), 7100.0);
    assert_eq!(property.evaluate_real().unwrap(), 7100.0);
}

#[test]
fn test_array_element_indices() {
    let mut session = session();
    let wrapper = classify(&mut session, "A(i,2)", true);
    assert_eq!(wrapper.wrapper_type(), WrapperType::ArrayElement);

    let element = match wrapper.kind() {
        WrapperKind::ArrayElement(element) => element,
        kind => panic!("expected an array element, got {:?}", kind),
    };
    assert_eq!(element.name(), "A");
    assert_eq!(element.row().wrapper_type(), WrapperType::Variable);
    let i = session.object("i").unwrap();
    assert!(Rc::ptr_eq(&bound_object(element.row()), &i));
    assert_eq!(element.column().wrapper_type(), WrapperType::Number);
    assert_eq!(element.column().evaluate_real().unwrap(), 2.0);
}

#[test]
fn test_and_binds_tighter_than_or() {
    use RelationalOperator::EqualTo;

    for bits in 0..16u32 {
        let c: Vec<bool> = (0..4).map(|k| bits & (1 << k) != 0).collect();
        let mut chain = ConditionChain::new(Condition::new("c1", EqualTo, "1"))
            .and(Condition::new("c2", EqualTo, "1"))
            .or(Condition::new("c3", EqualTo, "1"))
            .and(Condition::new("c4", EqualTo, "1"));
        for (k, &value) in c.iter().enumerate() {
            let name = format!("c{}", k + 1);
            let value = if value { 1.0 } else { 0.0 };
            assert!(chain.set_element_wrapper(&name, &ElementWrapper::number(&name, value)));
        }
        assert!(chain.set_element_wrapper("1", &ElementWrapper::number("1", 1.0)));

        let expected = (c[0] && c[1]) || (c[2] && c[3]);
        assert_eq!(chain.evaluate_all_conditions().unwrap(), expected, "{:?}", c);
    }
}

#[test]
fn test_missing_logical_operator() {
    let mut branch = ConditionalBranch::new(BranchKind::If);
    branch.set_condition("x", "<", "1", None).unwrap();
    branch.set_condition("x", ">", "-1", None).unwrap();
    let x = ElementWrapper::number("x", 0.0);
    branch.conditions_mut().set_element_wrapper("x", &x);
    branch
        .conditions_mut()
        .set_element_wrapper("1", &ElementWrapper::number("1", 1.0));
    branch
        .conditions_mut()
        .set_element_wrapper("-1", &ElementWrapper::number("-1", -1.0));

    let error = branch.evaluate_all_conditions().unwrap_err();
    assert!(matches!(error, CommandError::LogicalOperatorCount { .. }));
    assert!(error.to_string().contains("too few or too many logical operators"));

    branch.set_condition_operator("&", None).unwrap();
    assert!(branch.evaluate_all_conditions().unwrap());
}

#[test]
fn test_one_by_one_matrix_to_real() {
    let mut session = session();
    session.push(Assignment::new("M1", "5"));
    session.push(Assignment::new("x", "M1 * 2"));
    session.run();
    assert_eq!(session.evaluate("x"), Value::Real(10.0));

    let mut session = self::session();
    session.push(Assignment::new("x", "M2 * 2"));
    let error = session.try_run().unwrap_err().to_string();
    assert!(error.contains("\"Matrix\""), "{}", error);
    assert!(error.contains("\"Real\""), "{}", error);
}

#[test]
fn test_parameter_is_created_once() {
    let mut session = session();
    let first = classify(&mut session, "sat1.SMA", true);
    let second = classify(&mut session, "sat1.SMA", true);
    assert_eq!(first.wrapper_type(), WrapperType::Parameter);
    assert!(Rc::ptr_eq(&bound_object(&first), &bound_object(&second)));
    assert_eq!(
        session
            .store()
            .objects()
            .filter(|object| object.borrow().name().ends_with(".SMA"))
            .count(),
        1
    );
}

#[test]
fn test_rename_bound_property() {
    let mut session = session();
    let mut wrapper = classify(&mut session, "sat1.X", false);
    assert_eq!(wrapper.wrapper_type(), WrapperType::ObjectProperty);

    session.rename_object("sat1", "satA");
    wrapper.rename_object("sat1", "satA");
    assert_eq!(wrapper.description(), "satA.X");

    let sat = session.object("satA").unwrap();
    assert!(Rc::ptr_eq(&bound_object(&wrapper), &sat));
    assert_eq!(sat.borrow().name(), "satA");
    assert!(session.object("sat1").is_none());
}
