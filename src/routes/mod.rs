/// Router Module Index
///
/// Routes are grouped by resource. Authorization is not applied as a layer here:
/// every request passes the identity middleware, and privileged handlers consult
/// the permission gate themselves.

/// Place CRUD.
pub mod places;

/// Comments nested under a place.
pub mod comments;
