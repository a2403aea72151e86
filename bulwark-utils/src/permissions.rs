use poise::serenity_prelude as serenity;

/// JSON error code Discord returns when the bot lacks a permission or sits
/// too low in the role hierarchy.
const MISSING_PERMISSIONS_CODE: isize = 50013;

/// Resolve the invoking author's effective guild permissions.
pub async fn resolve_user_permissions(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> anyhow::Result<serenity::Permissions> {
    let guild = guild_id.to_partial_guild(http).await?;
    if guild.owner_id == user_id {
        return Ok(serenity::Permissions::all());
    }

    let member = guild_id.member(http, user_id).await?;
    let roles = guild_id.roles(http).await?;

    let mut resolved = serenity::Permissions::empty();
    let everyone_role_id = serenity::RoleId::new(guild_id.get());

    for role in roles.values() {
        if role.id == everyone_role_id || member.roles.contains(&role.id) {
            resolved |= role.permissions;
        }
    }

    Ok(resolved)
}

pub async fn has_user_permission(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    required: serenity::Permissions,
) -> anyhow::Result<bool> {
    let perms = resolve_user_permissions(http, guild_id, user_id).await?;

    Ok(grants(perms, required))
}

fn grants(perms: serenity::Permissions, required: serenity::Permissions) -> bool {
    perms.contains(serenity::Permissions::ADMINISTRATOR) || perms.contains(required)
}

/// Whether a failed request was rejected for missing permissions.
pub fn is_missing_permissions(source: &serenity::Error) -> bool {
    match source {
        serenity::Error::Http(::serenity::http::HttpError::UnsuccessfulRequest(response)) => {
            response.status_code.as_u16() == 403
                || response.error.code == MISSING_PERMISSIONS_CODE
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude as serenity;

    use super::{grants, is_missing_permissions};

    #[test]
    fn administrator_grants_everything() {
        assert!(grants(
            serenity::Permissions::ADMINISTRATOR,
            serenity::Permissions::MANAGE_GUILD
        ));
    }

    #[test]
    fn required_bits_must_all_be_present() {
        let perms = serenity::Permissions::MANAGE_GUILD;
        assert!(grants(perms, serenity::Permissions::MANAGE_GUILD));
        assert!(!grants(
            perms,
            serenity::Permissions::MANAGE_GUILD | serenity::Permissions::BAN_MEMBERS
        ));
    }

    #[test]
    fn unrelated_errors_are_not_permission_errors() {
        assert!(!is_missing_permissions(&serenity::Error::Other("boom")));
    }
}
