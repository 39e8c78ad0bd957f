use crate::params::Params;

/// Merge the three parameter sources of a request into one set.
///
/// Precedence from lowest to highest is query, route, body: on a key present
/// in several sources the body value wins, then the route value.
pub fn merge(route: Params, query: Params, body: Params) -> Params {
    let mut merged = query;
    merged.extend(route);
    merged.extend(body);
    merged
}
