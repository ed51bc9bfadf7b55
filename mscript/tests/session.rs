use mscript::*;

fn session() -> Session {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut session = Session::new();
    session.add_object(Object::spacecraft("sat1"));
    session.create("Variable", "x");
    session.create("Variable", "y");
    session.create("ReportFile", "rf");
    session
}

fn norm2() -> ScriptFunction {
    ScriptFunction::new("Norm2", &["a", "b"], &["r"])
        .declare(Object::variable("r", 0.0))
        .with_command(Assignment::new("r", "sqrt(a^2 + b^2)"))
}

#[test]
fn test_errors_are_collected() {
    let mut session = session();
    session.push(Command::from(Assignment::new("x", "z + 1")).at_line(1));
    session.push(Command::from(Report::new("nowhere", &["x"])).at_line(2));

    let errors = match session.try_validate() {
        Err(Error::ScriptErrors(errors)) => errors,
        result => panic!("expected script errors, got {:?}", result),
    };
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].line, Some(1));
    assert_eq!(errors[1].line, Some(2));
    assert_eq!(session.errors().len(), 2);

    let message = Error::ScriptErrors(errors).to_string();
    assert!(message.starts_with("script has 2 error(s):\n  in \"x = z + 1\" at line 1:"));
}

#[test]
fn test_fail_fast_from_json() {
    let mut session = Session::from_config_json(r#"{ "continue_on_error": false }"#);
    session.create("Variable", "x");
    session.push(Assignment::new("x", "z + 1"));
    session.push(Report::new("nowhere", &["x"]));

    match session.try_validate() {
        Err(Error::ValidationError(error)) => {
            assert_eq!(error.generating_string, "x = z + 1");
        }
        result => panic!("expected a validation error, got {:?}", result),
    }
    assert!(session.errors().is_empty());

    assert!(matches!(
        Session::try_from_config_json("{"),
        Err(Error::ConfigError(_))
    ));
}

#[test]
fn test_run() {
    let mut session = session();
    session.add_function(norm2());
    session.push(Assignment::new("x", "3"));
    session.push(FunctionCall::new("Norm2", &["x", "4"], &["y"]));

    let mut loop_ = ConditionalBranch::new(BranchKind::While);
    loop_.set_condition("y", "<", "8", None).unwrap();
    loop_.add_command(Assignment::new("y", "y + 1"));
    session.push(loop_);
    session.push(Report::new("rf", &["x", "y"]));

    let output = session.run();
    assert_eq!(
        output,
        [ReportLine {
            subscriber: "rf".to_string(),
            text: "3 8".to_string(),
        }]
    );
    assert!(session.object("r").is_none());
}

#[test]
fn test_rename_reaches_commands() {
    let mut session = session();
    session.push(Report::new("rf", &["sat1.X"]));
    session.rename_object("sat1", "satA");
    assert_eq!(session.commands()[0].generating_string(), "Report rf satA.X");

    let output = session.run();
    assert_eq!(output[0].text, "7100");

    assert!(session.try_rename_object("sat1", "satB").is_err());
}

#[test]
fn test_rename_keeps_fields() {
    let mut session = session();
    session.create("Variable", "X");
    session.push(Assignment::new("y", "sat1.X + X"));
    session.validate();
    assert!(session.object("sat1.X").is_some());

    session.rename_object("X", "Xv");
    assert_eq!(session.commands()[0].generating_string(), "y = sat1.X + Xv");
    assert!(session.object("sat1.X").is_some());
    assert!(session.object("sat1.Xv").is_none());
    assert!(session.object("Xv").is_some());

    session.push(Assignment::new("Xv", "1"));
    session.run();
    assert_eq!(session.evaluate("y"), Value::Real(7100.0));
}

#[test]
fn test_default_axes() {
    let mut session = session();
    let cs = session.create("CoordinateSystem", "cs");
    assert!(!cs.borrow().has_axis_system());
    session.validate();
    assert!(cs.borrow().has_axis_system());
}

#[test]
fn test_evaluate() {
    let mut session = session();
    session.push(Assignment::new("x", "sat1.X / 100"));
    session.run();
    assert_eq!(session.evaluate("x"), Value::Real(71.0));
    assert_eq!(session.evaluate("'text'"), Value::from("text"));
    assert!(session.try_evaluate("sat9.X").is_err());
}

#[test]
fn test_unknown_type() {
    let mut session = session();
    assert!(matches!(
        session.try_create("Thruster", "t"),
        Err(Error::ObjectError(_))
    ));
}

#[test]
#[should_panic(expected = "failed to add 'sat1'")]
fn test_duplicate_object() {
    let mut session = session();
    session.add_object(Object::spacecraft("sat1"));
}
