//! Property-based tests for launch specification construction
//!
//! **Property 1: Builder Fidelity**
//! Every value given to the builder is readable back unchanged.
//!
//! **Property 2: Validation Soundness**
//! A spec with a non-blank command and non-blank args always validates;
//! a blank command never does.

use portside_process::{LaunchSpec, Port};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9/._-]{1,20}"
}

proptest! {
    /// Property 1: Builder Fidelity
    #[test]
    fn prop_builder_roundtrips_fields(
        command in word(),
        args in prop::collection::vec(word(), 0..8),
        port in 1024u16..=65535,
        timeout_ms in 1u64..120_000,
    ) {
        let spec = LaunchSpec::new(command.clone(), port)
            .args(args.clone())
            .start_timeout(std::time::Duration::from_millis(timeout_ms));

        prop_assert_eq!(spec.command(), command.as_str());
        prop_assert_eq!(spec.arg_list(), args.as_slice());
        prop_assert_eq!(spec.key(), Port::new(port));
        prop_assert_eq!(
            spec.timeout(),
            Some(std::time::Duration::from_millis(timeout_ms))
        );
    }

    /// Property 2: Validation Soundness
    #[test]
    fn prop_nonblank_spec_validates(
        command in word(),
        args in prop::collection::vec(word(), 0..8),
        port in 1024u16..=65535,
    ) {
        let spec = LaunchSpec::new(command, port).args(args);
        prop_assert!(spec.validate().is_ok());
    }

    /// Property 2 (negative): a blank command never validates
    #[test]
    fn prop_blank_command_rejected(blank in "[ \t]{0,8}", port in 1024u16..=65535) {
        let spec = LaunchSpec::new(blank, port);
        prop_assert!(spec.validate().is_err());
    }
}
