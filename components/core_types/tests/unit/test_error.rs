//! Unit tests for ModuleError

use core_types::{ModuleError, ModuleId, ModuleResult};

fn fails() -> ModuleResult<()> {
    Err(ModuleError::DomainUnavailable)
}

fn propagates() -> ModuleResult<u32> {
    fails()?;
    Ok(1)
}

#[test]
fn test_error_propagates_with_question_mark() {
    assert_eq!(propagates(), Err(ModuleError::DomainUnavailable));
}

#[test]
fn test_error_is_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(ModuleError::UnknownModule(
        ModuleId::from_index(3),
    ));
    assert_eq!(err.to_string(), "module#3 is not a live runtime module");
}

#[test]
fn test_error_variants_compare() {
    let a = ModuleError::CjsFunctionOutOfRange {
        function_index: 1,
        function_count: 1,
    };
    let b = a.clone();
    assert_eq!(a, b);
    assert_ne!(a, ModuleError::DomainUnavailable);
}
