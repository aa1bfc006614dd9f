use crate::credentials::{SECRET_LENGTH, generate_secret};

/// **VALUE**: Verifies the generated secret has the length and alphabet the device expects.
///
/// **WHY THIS MATTERS**: The secret is written to a file the device reads and sends back
/// as JSON; non-alphanumeric characters could be mangled along the way.
#[test]
fn given_generator_when_called_then_returns_32_alphanumeric_chars() {
    // WHEN: Generating a secret
    let secret = generate_secret();

    // THEN: 32 ASCII alphanumerics
    assert_eq!(secret.len(), SECRET_LENGTH);
    assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn given_two_generations_when_compared_then_they_differ() {
    // WHEN: Generating twice
    let first = generate_secret();
    let second = generate_secret();

    // THEN: Not a constant
    assert_ne!(first, second);
}
