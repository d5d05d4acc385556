use super::{API_V1_PREFIX, family_scope};

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

pub fn auth_login(base: &str) -> String {
    base_join(base, &format!("{}/auth/login", API_V1_PREFIX))
}
pub fn chores(base: &str, family_id: i32) -> String {
    base_join(base, &format!("{}/chores", family_scope(family_id)))
}
pub fn chore(base: &str, family_id: i32, chore_id: i32) -> String {
    base_join(
        base,
        &format!("{}/chores/{}", family_scope(family_id), chore_id),
    )
}
pub fn chore_assign(base: &str, family_id: i32, chore_id: i32) -> String {
    base_join(
        base,
        &format!("{}/chores/{}/assign", family_scope(family_id), chore_id),
    )
}
pub fn chore_accept(base: &str, family_id: i32, chore_id: i32) -> String {
    base_join(
        base,
        &format!("{}/chores/{}/accept", family_scope(family_id), chore_id),
    )
}
pub fn chore_decline(base: &str, family_id: i32, chore_id: i32) -> String {
    base_join(
        base,
        &format!("{}/chores/{}/decline", family_scope(family_id), chore_id),
    )
}
pub fn chore_submit(base: &str, family_id: i32, chore_id: i32) -> String {
    base_join(
        base,
        &format!("{}/chores/{}/submit", family_scope(family_id), chore_id),
    )
}
pub fn submission_approve(
    base: &str,
    family_id: i32,
    chore_id: i32,
    submission_id: i32,
) -> String {
    base_join(
        base,
        &format!(
            "{}/chores/{}/submissions/{}/approve",
            family_scope(family_id),
            chore_id,
            submission_id
        ),
    )
}
pub fn submission_reject(base: &str, family_id: i32, chore_id: i32, submission_id: i32) -> String {
    base_join(
        base,
        &format!(
            "{}/chores/{}/submissions/{}/reject",
            family_scope(family_id),
            chore_id,
            submission_id
        ),
    )
}
pub fn children(base: &str, family_id: i32) -> String {
    base_join(base, &format!("{}/children", family_scope(family_id)))
}
pub fn child_earnings(base: &str, family_id: i32, child_id: i32) -> String {
    base_join(
        base,
        &format!(
            "{}/children/{}/earnings",
            family_scope(family_id),
            child_id
        ),
    )
}
