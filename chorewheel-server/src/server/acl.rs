use super::{AppError, AppState, auth::AuthCtx};
use axum::response::Response;
use axum::{
    extract::{OriginalUri, State},
    http::{Method, Request},
    middleware::Next,
};
use chorewheel_shared::auth::Role;
use chorewheel_shared::jwt::JwtClaims;

/// Path-pattern access rules for the family-scoped API. The token's family
/// must match the path scope; within it, parents manage chores and reviews,
/// children respond to their own offers and read their own earnings.
pub async fn enforce_acl(
    State(_state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|orig| orig.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().clone();
    let Some(auth) = req.extensions().get::<AuthCtx>() else {
        return Err(AppError::unauthorized());
    };
    let claims = &auth.claims;

    let segs = segmented(&path);
    let family_prefix = ["api", "v1", "family"];
    if !segs.as_slice().starts_with(&family_prefix) {
        tracing::warn!(?segs, "ACL: path outside family scope");
        return Err(AppError::forbidden());
    }
    let Some(path_family) = segs.get(3).and_then(|s| s.parse::<i32>().ok()) else {
        return Err(AppError::forbidden());
    };
    if path_family != claims.family_id {
        tracing::warn!(
            path_family,
            token_family = claims.family_id,
            username = %claims.sub,
            "ACL: family mismatch"
        );
        return Err(AppError::forbidden());
    }
    let rest = &segs[4..];

    let decision = match claims.role {
        Role::Parent => allow_parent(&method, rest),
        Role::Child => allow_child(&method, rest, claims),
    };

    if let Err(err) = decision {
        tracing::warn!(
            method = %method,
            path = %path,
            username = %claims.sub,
            role = ?claims.role,
            "ACL: no rule matched; denying"
        );
        return Err(err);
    }

    Ok(next.run(req).await)
}

fn allow_parent(method: &Method, rest: &[&str]) -> Result<(), AppError> {
    match rest {
        ["chores"] if *method == Method::GET || *method == Method::POST => Ok(()),
        ["chores", id] if *method == Method::GET && id.parse::<i32>().is_ok() => Ok(()),
        ["chores", id, "assign"] if *method == Method::POST && id.parse::<i32>().is_ok() => Ok(()),
        ["chores", id, "submissions", sid, action]
            if *method == Method::POST
                && (action == &"approve" || action == &"reject")
                && id.parse::<i32>().is_ok()
                && sid.parse::<i32>().is_ok() =>
        {
            Ok(())
        }
        ["children"] if *method == Method::GET => Ok(()),
        ["children", id, "earnings"] if *method == Method::GET && id.parse::<i32>().is_ok() => {
            Ok(())
        }
        _ => Err(AppError::forbidden()),
    }
}

fn allow_child(method: &Method, rest: &[&str], claims: &JwtClaims) -> Result<(), AppError> {
    match rest {
        ["chores"] if *method == Method::GET => Ok(()),
        ["chores", id] if *method == Method::GET && id.parse::<i32>().is_ok() => Ok(()),
        ["chores", id, action]
            if *method == Method::POST
                && (action == &"accept" || action == &"decline" || action == &"submit")
                && id.parse::<i32>().is_ok() =>
        {
            Ok(())
        }
        ["children", id, "earnings"] if *method == Method::GET => ensure_self(claims, id),
        _ => Err(AppError::forbidden()),
    }
}

fn segmented(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn ensure_self(claims: &JwtClaims, seg: &str) -> Result<(), AppError> {
    match seg.parse::<i32>() {
        Ok(id) if id == claims.user_id => Ok(()),
        _ => Err(AppError::forbidden()),
    }
}
