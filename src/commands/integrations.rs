use super::util::{confirm, format_local};
use super::{BrightspaceAction, CommandContext, CommandResult, GmailAction, GoogleAction};
use crate::api::models::{BrightspaceStatus, GmailWatchStatus, GoogleStatus};
use crate::calendar::dashboard::{
    summarize_brightspace_result, summarize_google_stats, sync_headline, SyncOutcome,
};
use chrono_tz::Tz;
use std::fmt::Write;

pub fn describe_google(status: &GoogleStatus, tz: &Tz) -> String {
    if !status.connected {
        return "Google Calendar: not connected".to_string();
    }
    let mut out = "Google Calendar: connected".to_string();
    if let Some(email) = &status.email {
        let _ = write!(out, " as {}", email);
    }
    if let Some(at) = &status.last_synced_at {
        let _ = write!(out, ", last synced {}", format_local(at, tz));
    }
    out
}

pub fn describe_brightspace(status: &BrightspaceStatus, tz: &Tz) -> String {
    if !status.connected {
        return "Brightspace: not connected".to_string();
    }
    match &status.last_imported_at {
        Some(at) => format!("Brightspace: connected, last imported {}", format_local(at, tz)),
        None => "Brightspace: connected".to_string(),
    }
}

pub fn describe_gmail(status: &GmailWatchStatus, tz: &Tz) -> String {
    if !status.active {
        return "Gmail watch: inactive".to_string();
    }
    let mut out = "Gmail watch: active".to_string();
    if let Some(at) = &status.expires_at {
        let _ = write!(out, " until {}", format_local(at, tz));
    }
    if status.needs_renewal {
        out.push_str(" (needs renewal)");
    }
    out
}

pub fn render_outcomes(outcomes: &[SyncOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        let _ = writeln!(out, "{}: {} - {}", outcome.label, outcome.status, outcome.message);
    }
    if let Some(headline) = sync_headline(outcomes) {
        let _ = writeln!(out, "{}", headline);
    }
    out
}

pub async fn google(ctx: &CommandContext, action: GoogleAction) -> CommandResult {
    let integrations = &ctx.services.integrations;
    match action {
        GoogleAction::Status => {
            println!("{}", describe_google(&integrations.google_status().await?, &ctx.tz));
        }
        GoogleAction::Connect => {
            let url = integrations.start_google_oauth().await?;
            println!("Open this URL to connect Google Calendar:");
            println!("{}", url);
        }
        GoogleAction::Sync => {
            let stats = integrations.sync_google().await?;
            println!("Google Calendar synced: {}", summarize_google_stats(&stats));
        }
        GoogleAction::Disconnect => {
            if !confirm("Disconnect Google Calendar?", ctx.assume_yes).await? {
                return Ok(());
            }
            integrations.disconnect_google().await?;
            println!("Google Calendar disconnected.");
        }
    }
    Ok(())
}

pub async fn brightspace(ctx: &CommandContext, action: BrightspaceAction) -> CommandResult {
    let integrations = &ctx.services.integrations;
    match action {
        BrightspaceAction::Status => {
            let status = integrations.brightspace_status().await?;
            println!("{}", describe_brightspace(&status, &ctx.tz));
        }
        BrightspaceAction::Import { url } => {
            let result = integrations.import_brightspace(url.as_deref()).await?;
            println!("Brightspace imported: {}", summarize_brightspace_result(&result));
            if result.used_saved_url {
                println!("Used the saved feed URL.");
            } else if result.saved_url {
                println!("Feed URL saved for future imports.");
            }
        }
        BrightspaceAction::Disconnect => {
            if !confirm("Disconnect Brightspace?", ctx.assume_yes).await? {
                return Ok(());
            }
            integrations.disconnect_brightspace().await?;
            println!("Brightspace disconnected.");
        }
    }
    Ok(())
}

pub async fn sync_all(ctx: &CommandContext) -> CommandResult {
    let outcomes = ctx.services.integrations.sync_all().await?;
    print!("{}", render_outcomes(&outcomes));
    Ok(())
}

pub async fn gmail(ctx: &CommandContext, action: GmailAction) -> CommandResult {
    let integrations = &ctx.services.integrations;
    match action {
        GmailAction::Start => {
            let watch = integrations.start_gmail_watch().await?;
            match watch.expires_at {
                Some(at) => println!("Gmail watch started until {}.", format_local(&at, &ctx.tz)),
                None => println!("Gmail watch started."),
            }
        }
        GmailAction::Status => {
            let status = integrations.gmail_watch_status().await?;
            println!("{}", describe_gmail(&status, &ctx.tz));
        }
        GmailAction::Stop => {
            integrations.stop_gmail_watch().await?;
            println!("Gmail watch stopped.");
        }
    }
    Ok(())
}
