use crate::core::users::UserRole;

/// Who can see a piece of content.
///
/// Live content is public, anonymous viewers included. Removed content stays
/// readable for its author and for moderators only.
pub fn visible(removed: bool, viewer_role: Option<UserRole>, is_author: bool) -> bool {
    if !removed {
        return true;
    }
    match viewer_role {
        None => false,
        Some(UserRole::Moderator) => true,
        Some(UserRole::Normal) => is_author,
    }
}
