use ember_derive::ember_error;
use std::borrow::Cow;

#[ember_error]
pub enum SceneError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Missing entity{}: {message}", format_context(.context))]
    MissingEntity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn load() -> Result<String, SceneError> {
    std::fs::read_to_string("missing-scene.toml").context("Reading scene")
}

fn lookup(found: bool) -> Result<(), SceneError> {
    if found {
        Ok(())
    } else {
        Err(SceneError::MissingEntity { message: "door".into(), context: None })
    }
}

fn main() {
    let err = load().expect_err("file does not exist");
    assert!(err.to_string().starts_with("IO error (Reading scene)"));

    let err = lookup(false).context("Wiring lever").expect_err("entity is missing");
    assert_eq!(err.to_string(), "Missing entity (Wiring lever): door");

    let err: SceneError = "boom".into();
    assert_eq!(err.to_string(), "Internal error: boom");
}
