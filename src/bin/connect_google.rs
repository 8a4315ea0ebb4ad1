use sortie::api::ApiClient;
use sortie::calendar::dashboard::summarize_google_stats;
use sortie::config::Config;
use sortie::error::{other_error, ClientResult, Error};
use sortie::services::IntegrationService;
use sortie::session::Authorization;
use sortie::utils::logging;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const POLL_INTERVAL: Duration = Duration::from_secs(3);
const POLL_TIMEOUT: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> ClientResult<()> {
    logging::init(logging::VERBOSE_FILTER)?;

    // Load configuration
    let config = Config::load()?;
    let client = ApiClient::from_config(&config)?;

    if !matches!(client.ensure_authorized().await?, Authorization::Authorized(_)) {
        return Err(Error::Unauthorized);
    }

    let integrations = IntegrationService::new(client);
    if integrations.google_status().await?.connected {
        println!("Google Calendar is already connected.");
        return Ok(());
    }

    // The backend owns the OAuth exchange; we only open the consent page
    let auth_url = integrations.start_google_oauth().await?;
    println!("Opening browser for Google Calendar authorization...");
    if let Err(e) = webbrowser::open(&auth_url) {
        println!("Could not open a browser ({}). Visit this URL instead:", e);
        println!("{}", auth_url);
    }

    println!("Waiting for authorization...");
    let deadline = Instant::now() + POLL_TIMEOUT;
    loop {
        sleep(POLL_INTERVAL).await;

        let status = integrations.google_status().await?;
        if status.connected {
            match status.email {
                Some(email) => println!("Connected as {}.", email),
                None => println!("Connected."),
            }
            break;
        }
        if Instant::now() >= deadline {
            return Err(other_error("Timed out waiting for Google authorization"));
        }
    }

    // First sync so the calendar is populated right away
    let stats = integrations.sync_google().await?;
    println!("Initial sync: {}", summarize_google_stats(&stats));

    Ok(())
}
