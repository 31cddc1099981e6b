use clap::Parser;
use hubauth::{AuthenticationEvent, AuthenticationProvider, SharedAccessKeyAuthenticationProvider};
use std::time::Duration;
use tokio::time;

#[derive(Debug, Parser)]
struct Opts {
    /// The device connection string
    #[arg(short, long, env = "DEVICE_CONNECTION_STRING", hide_env_values = true)]
    connection_string: String,

    /// How long each token is valid, in seconds
    #[arg(short, long, env)]
    valid_secs: Option<u64>,

    /// How long before expiry a token is renewed, in seconds
    #[arg(short, long, env)]
    margin_secs: Option<u64>,

    /// How often to pull credentials, in seconds
    #[arg(short, long, env, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    poll_secs: u64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let provider = SharedAccessKeyAuthenticationProvider::from_connection_string(
        &opts.connection_string,
        opts.valid_secs,
        opts.margin_secs,
    )?;

    let mut events = provider.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                AuthenticationEvent::NewTokenAvailable(credentials) => {
                    tracing::info!(
                        device_id = %credentials.device_id(),
                        token = format_args!("{:#?}", credentials.shared_access_signature()),
                        "new token available"
                    );
                }
                AuthenticationEvent::RenewalFailed(error) => {
                    tracing::error!(error = (&*error as &dyn std::error::Error), "renewal failed");
                }
            }
        }
    });

    let mut interval = time::interval(Duration::from_secs(opts.poll_secs));
    loop {
        interval.tick().await;
        poll(&provider)?;
    }
}

fn poll<P: AuthenticationProvider>(provider: &P) -> Result<(), P::Error> {
    let credentials = provider.get_device_credentials()?;
    let token = credentials.shared_access_signature();
    let expiry = token.expiry().map(|e| e.0);
    tracing::debug!(
        host = %credentials.host(),
        expiry,
        "pulled credentials"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CS: &str = "HostName=h;DeviceId=d;SharedAccessKey=a2V5";

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = Opts::try_parse_from(["watch_tokens", "-c", CS, "--poll-secs", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn poll_interval_defaults_to_five_seconds() {
        let opts = Opts::try_parse_from(["watch_tokens", "-c", CS]).unwrap();
        assert_eq!(opts.poll_secs, 5);
    }
}
