use super::*;
use shared::error::ResponseCode;
use topology::LayoutConfig;

fn interpreter() -> Interpreter {
    let config = LayoutConfig::from_toml_str(
        r#"
        [[stops]]
        id = "S1"
        [[stacks]]
        id = "K1"
        capacity = 2
        [[tracks]]
        id = "T1"
        slots = 2
        from = "S1"
        to = "K1"
        "#,
    )
    .expect("parse");
    let topology = Arc::new(Topology::from_config(&config).expect("topology"));
    Interpreter::standard(topology).expect("interpreter")
}

#[test]
fn empty_and_unknown_commands_are_protocol_errors() {
    let interpreter = interpreter();
    let empty = interpreter.interpret("   ");
    assert_eq!(empty.code, ResponseCode::UnknownCommand);
    assert_eq!(empty.status_line(), "0001 UNKNOWN_COMMAND Empty command");

    let unknown = interpreter.interpret("FLY S1");
    assert_eq!(unknown.code, ResponseCode::UnknownCommand);
    assert_eq!(unknown.echo, "FLY S1");
}

#[test]
fn verbs_are_case_insensitive() {
    let interpreter = interpreter();
    let response = interpreter.interpret("dispense S1");
    assert!(response.is_ok(), "{response}");
    assert_eq!(response.detail, "P1 S1");
}

#[test]
fn malformed_arguments_never_reach_the_store() {
    let interpreter = interpreter();
    let before = interpreter.snapshot();
    let response = interpreter.interpret("SHIFTPLATES T1,up");
    assert_eq!(response.code, ResponseCode::MalformedArguments);
    assert_eq!(interpreter.snapshot(), before);
}

#[test]
fn unsimulated_device_verbs_answer_not_implemented() {
    let interpreter = interpreter();
    let response = interpreter.interpret("HOME 1,2");
    assert_eq!(response.code, ResponseCode::NotImplemented);
    assert_eq!(
        response.status_line(),
        "9999 NOT_IMPLEMENTED No mock implementation for this command"
    );

    let before = interpreter.snapshot();
    for line in [
        "RETURN",
        "return 1",
        "MOVEPLATETEST S1,K1",
        "GETPOS",
        "LISTSTOPS",
        "MOVE_ABS 1,200",
        "SETIPADDRESS 10.0.0.2",
        "SWAPSTOPS 1,2",
    ] {
        let response = interpreter.interpret(line);
        assert_eq!(response.code, ResponseCode::NotImplemented, "{line}");
    }
    assert_eq!(interpreter.snapshot(), before);
}

#[test]
fn listcommands_covers_the_device_vocabulary() {
    let interpreter = interpreter();
    let listing = interpreter.interpret("LISTCOMMANDS");
    for verb in ["DISPENSE", "MOVEPLATE", "SHIFTPLATES", "HASPLATE", "RETURN", "GETPOS"] {
        assert!(listing.lines.iter().any(|line| line == verb), "{verb}");
    }
    assert_eq!(listing.lines.len(), interpreter.registry().len());
    assert_eq!(
        listing.detail,
        format!("{} commands", crate::handlers::UNSIMULATED_VERBS.len() + 11)
    );
}

struct Explodes;

impl crate::CommandHandler for Explodes {
    fn execute(
        &self,
        _args: &Args,
        _ctx: &CommandContext<'_>,
    ) -> Result<Outcome, CoreError> {
        panic!("handler bug");
    }
}

#[test]
fn handler_panics_become_internal_errors() {
    let base = interpreter();
    let mut registry = CommandRegistry::new();
    registry.register("BOOM", Explodes).expect("register");
    let interpreter = Interpreter::new(base.topology().clone(), base.store().clone(), registry);

    let response = interpreter.interpret("BOOM");
    assert_eq!(response.code, ResponseCode::Internal);
    assert_eq!(response.code.numeric(), 9999);
}

#[test]
fn registry_rejects_duplicate_and_invalid_verbs() {
    let mut registry = CommandRegistry::standard().expect("registry");
    assert_eq!(
        registry.register("dispense", crate::handlers::Dispense),
        Err(RegistryError::Duplicate("DISPENSE".into()))
    );
    assert!(matches!(
        registry.register("TWO WORDS", crate::handlers::Dispense),
        Err(RegistryError::InvalidVerb(_))
    ));
}

#[test]
fn custom_verbs_register_without_touching_dispatch() {
    struct Ping;
    impl crate::CommandHandler for Ping {
        fn execute(&self, _: &Args, _: &CommandContext<'_>) -> Result<Outcome, CoreError> {
            Ok(Outcome::detail("PONG"))
        }
    }

    let base = interpreter();
    let mut registry = CommandRegistry::standard().expect("registry");
    registry.register("PING", Ping).expect("register");
    let interpreter = Interpreter::new(base.topology().clone(), base.store().clone(), registry);

    assert_eq!(interpreter.interpret("ping").status_line(), "0000 OK PONG");
    let listing = interpreter.interpret("LISTCOMMANDS");
    assert_eq!(listing.lines.last().map(String::as_str), Some("PING"));
}
