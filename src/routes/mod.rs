/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The two modules map directly to the access levels the API knows about.

/// Routes accessible to everyone: the liveness probe and the credential
/// endpoints that create sessions in the first place.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated user session.
pub mod authenticated;
