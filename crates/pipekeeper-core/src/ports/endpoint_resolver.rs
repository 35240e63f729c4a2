//! Endpoint resolution port.

/// Maps the raw pipe name announced by the service to a connectable
/// address.
///
/// The ready line carries only a bare name; turning that into a fully
/// qualified path is platform- and host-specific, so it stays behind this
/// seam. The resolved value is what callers of the supervisor receive as
/// the server's location.
pub trait EndpointResolver: Send + Sync {
    /// Resolve a raw announced name to the address handed to clients.
    fn resolve(&self, raw_name: &str) -> String;
}

/// Resolver that returns the announced name unchanged.
///
/// For tests and hosts whose clients already understand raw names.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl EndpointResolver for IdentityResolver {
    fn resolve(&self, raw_name: &str) -> String {
        raw_name.to_string()
    }
}
