//! Unit tests for `AppError` display format.

use splitlink::AppError;

#[test]
fn messages_carry_a_kind_prefix() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Endpoint("bad".into()), "endpoint: bad"),
        (AppError::InvalidCommand("bad".into()), "invalid command: bad"),
        (AppError::Transport("refused".into()), "transport: refused"),
        (AppError::Io("reset".into()), "io: reset"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn unit_variants_have_fixed_messages() {
    assert_eq!(AppError::NotConnected.to_string(), "not connected");
    assert_eq!(
        AppError::Disconnected.to_string(),
        "disconnected before a reply arrived"
    );
}

#[test]
fn error_messages_have_no_trailing_period() {
    for err in [
        AppError::NotConnected,
        AppError::Disconnected,
        AppError::Transport("write failed".into()),
    ] {
        let s = err.to_string();
        assert!(!s.ends_with('.'), "error message must not end with a period: {s}");
    }
}

#[test]
fn io_errors_convert_to_io_variant() {
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
    let err: AppError = io.into();
    assert!(matches!(err, AppError::Io(ref msg) if msg.contains("reset by peer")));
}

#[test]
fn toml_errors_convert_to_config_variant() {
    let parse = toml::from_str::<toml::Value>("= nope").expect_err("invalid toml");
    let err: AppError = parse.into();
    assert!(err.to_string().starts_with("config:"));
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
    assert_error::<AppError>();
}
