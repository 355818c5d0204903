//! Umbrella workspace crate for the TEMPEST relay.
