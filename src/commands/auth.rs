use super::util::prompt_line;
use super::{CommandContext, CommandResult};
use crate::api::models::RegisterRequest;
use crate::error::{ClientResult, Error};
use crate::session::Authorization;

async fn password_or_prompt(password: Option<String>) -> ClientResult<String> {
    let password = match password {
        Some(password) => password,
        None => prompt_line("Password: ").await?,
    };
    if password.is_empty() {
        return Err(Error::Validation("Password is required.".to_string()));
    }
    Ok(password)
}

pub async fn login(ctx: &CommandContext, username: &str, password: Option<String>) -> CommandResult {
    let password = password_or_prompt(password).await?;
    ctx.services.auth.login(username.trim(), &password).await?;
    println!("Logged in as {}.", username.trim());
    Ok(())
}

pub async fn logout(ctx: &CommandContext) -> CommandResult {
    ctx.services.auth.logout().await?;
    println!("Logged out.");
    Ok(())
}

pub async fn register(
    ctx: &CommandContext,
    username: &str,
    password: Option<String>,
    invite: Option<String>,
    email: Option<String>,
) -> CommandResult {
    let password = password_or_prompt(password).await?;
    let registration = RegisterRequest::new(username, password, invite, email);
    let user = ctx.services.auth.register(&registration).await?;
    println!("Created account {}. Log in to continue.", user.username);
    Ok(())
}

pub async fn whoami(ctx: &CommandContext) -> CommandResult {
    match ctx.services.auth.status().await? {
        Authorization::Unauthenticated => println!("Not logged in."),
        Authorization::Expired => println!("Session expired. Log in again."),
        Authorization::Authorized(claims) => {
            let user = claims
                .user_id
                .map(|id| format!("user {}", id))
                .unwrap_or_else(|| "unknown user".to_string());
            match claims.expires_at() {
                Some(expires) => println!(
                    "Logged in as {} until {}.",
                    user,
                    super::util::format_local(&expires, &ctx.tz)
                ),
                None => println!("Logged in as {}.", user),
            }
        }
    }
    Ok(())
}
