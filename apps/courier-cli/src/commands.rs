//! # Commands
//!
//! The command line, parsed with clap, and the command implementations.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use courier_client::{ClientError, ClientResult, CourierClient, SessionStatus};
use courier_core::{EarningsPeriod, GeoLocation, Order};

#[derive(Debug, Parser)]
#[command(name = "courier")]
#[command(version, about = "Courier partner client")]
pub struct Cli {
    /// Config file (default: the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Show session status
    Status,
    /// Sign in with a 6-digit PIN
    Login { phone: String, pin: String },
    /// One-time password sign-in
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
    /// Sign out
    Logout,
    /// Show the courier profile
    Profile {
        /// Fetch it from the backend first
        #[arg(long)]
        refresh: bool,
    },
    /// List orders
    Orders {
        #[arg(value_enum, default_value_t = OrderView::Active)]
        view: OrderView,
    },
    /// Accept a pending order
    Accept { order_id: String },
    /// Start delivering a picked-up order
    Start {
        order_id: String,
        /// Current position as LAT,LON
        #[arg(long, value_parser = parse_location, allow_hyphen_values = true)]
        at: Option<GeoLocation>,
    },
    /// Hand over an order
    Complete {
        order_id: String,
        /// Current position as LAT,LON
        #[arg(long, value_parser = parse_location, allow_hyphen_values = true)]
        at: Option<GeoLocation>,
        /// Recipient signature
        #[arg(long)]
        signature: Option<String>,
    },
    /// Go online or offline
    Availability {
        #[arg(value_enum)]
        state: Availability,
    },
    /// Earnings summary
    Earnings {
        #[arg(default_value = "today", value_parser = parse_period)]
        period: EarningsPeriod,
        /// Ask the backend instead of summing cached history
        #[arg(long)]
        remote: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum OtpAction {
    /// Send a one-time password
    Request { phone: String },
    /// Sign in with a one-time password
    Verify { phone: String, code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderView {
    Active,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Availability {
    On,
    Off,
    Toggle,
}

// =============================================================================
// Value Parsers
// =============================================================================

fn parse_period(text: &str) -> Result<EarningsPeriod, String> {
    text.parse().map_err(|e| format!("{}", e))
}

/// `LAT,LON` in decimal degrees.
fn parse_location(text: &str) -> Result<GeoLocation, String> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("location must be LAT,LON, got {}", text))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("bad latitude: {}", lat))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("bad longitude: {}", lon))?;

    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("location out of range: {}", text));
    }
    Ok(GeoLocation::new(latitude, longitude))
}

// =============================================================================
// Execution
// =============================================================================

pub async fn run(client: &CourierClient, command: Command) -> ClientResult<()> {
    match command {
        Command::Status => {
            let session = client.session();
            match session.profile().await {
                Some(profile) if session.status() == SessionStatus::SignedIn => {
                    println!("signed in as {} ({})", profile.name, profile.phone_number);
                }
                _ => println!("{}", session.status()),
            }
            println!("backend: {}", client.config().base_url());
        }

        Command::Login { phone, pin } => {
            let profile = client.session().login_with_pin(&phone, &pin).await?;
            println!("signed in as {}", profile.name);
        }

        Command::Otp {
            action: OtpAction::Request { phone },
        } => {
            client.session().request_otp(&phone).await?;
            println!("one-time password sent");
        }

        Command::Otp {
            action: OtpAction::Verify { phone, code },
        } => {
            let profile = client.session().verify_otp(&phone, &code).await?;
            println!("signed in as {}", profile.name);
        }

        Command::Logout => {
            client.logout().await;
            println!("signed out");
        }

        Command::Profile { refresh } => {
            let profile = if refresh {
                client.session().refresh_profile().await?
            } else {
                client
                    .session()
                    .profile()
                    .await
                    .ok_or(ClientError::NotSignedIn)?
            };
            println!("{} ({})", profile.name, profile.phone_number);
            if let Some(vehicle) = &profile.vehicle_number {
                println!("vehicle: {}", vehicle);
            }
            if let Some(rating) = profile.rating {
                println!("rating: {:.1}", rating);
            }
        }

        Command::Orders { view } => {
            let orders = if view == OrderView::History {
                client.orders().refresh_history().await?;
                client.orders().history().await?
            } else {
                client.orders().refresh_active().await?;
                client.orders().active().await?
            };
            if orders.is_empty() {
                println!("no orders");
            }
            for order in &orders {
                println!("{}", order_line(order));
            }
        }

        Command::Accept { order_id } => {
            client.orders().refresh_active().await?;
            let order = client.transitions().accept(&order_id).await?;
            println!("{}", order_line(&order));
        }

        Command::Start { order_id, at } => {
            client.orders().refresh_active().await?;
            let order = client
                .transitions()
                .start_delivery(&order_id, at)
                .await?;
            println!("{}", order_line(&order));
        }

        Command::Complete {
            order_id,
            at,
            signature,
        } => {
            client.orders().refresh_active().await?;
            let order = client
                .transitions()
                .complete(&order_id, at, signature.as_deref())
                .await?;
            println!("{}", order_line(&order));
        }

        Command::Availability { state } => {
            let availability = client.availability();
            let now = match state {
                Availability::On => availability.set(true).await?,
                Availability::Off => availability.set(false).await?,
                Availability::Toggle => availability.toggle().await?,
            };
            println!("{}", if now { "online" } else { "offline" });
        }

        Command::Earnings { period, remote } => {
            if remote {
                let earnings = client.earnings().remote_summary(period).await?;
                println!(
                    "{}: {} from {} deliveries (avg {}, {} this week)",
                    period,
                    earnings.total_earnings,
                    earnings.deliveries_count,
                    earnings.avg_per_delivery,
                    earnings.weekly_count
                );
            } else {
                client.orders().refresh_history().await?;
                let summary = client.earnings().summary(period).await?;
                println!(
                    "{}: {} from {} deliveries (avg {})",
                    period,
                    summary.total_earnings,
                    summary.deliveries_count,
                    summary.avg_per_delivery
                );
            }
        }
    }

    Ok(())
}

fn order_line(order: &Order) -> String {
    format!(
        "{:<12} {:<10} {:>10}  {}, {}",
        order.order_id,
        order.status.as_str(),
        order.amount.to_string(),
        order.customer.name,
        order.customer.address
    )
}

/// Process exit code for a failed command.
pub fn exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::Validation(_) => 2,
        ClientError::NotSignedIn
        | ClientError::AlreadySignedIn
        | ClientError::AuthenticationInProgress
        | ClientError::AuthRejected { .. }
        | ClientError::SessionExpired => 3,
        ClientError::Network(_) => 4,
        ClientError::RemoteRejected { .. }
        | ClientError::InvalidTransition { .. }
        | ClientError::TransitionInProgress { .. }
        | ClientError::AvailabilityUpdateInProgress
        | ClientError::OrderNotFound { .. } => 5,
        ClientError::InvalidConfig(_)
        | ClientError::ConfigLoadFailed(_)
        | ClientError::ConfigSaveFailed(_) => 6,
        ClientError::Storage(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("courier").chain(line.split_whitespace()))
    }

    fn command(line: &str) -> Command {
        parse(line).unwrap().command
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_commands() {
        let cli = parse("--config ./c.toml login 9876543210 123456").unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("./c.toml")));
        assert_eq!(
            cli.command,
            Command::Login {
                phone: "9876543210".into(),
                pin: "123456".into()
            }
        );

        assert_eq!(
            command("orders"),
            Command::Orders {
                view: OrderView::Active
            }
        );
        assert_eq!(
            command("orders history"),
            Command::Orders {
                view: OrderView::History
            }
        );
        assert_eq!(
            command("otp verify 9876543210 654321"),
            Command::Otp {
                action: OtpAction::Verify {
                    phone: "9876543210".into(),
                    code: "654321".into()
                }
            }
        );
        assert_eq!(
            command("availability toggle"),
            Command::Availability {
                state: Availability::Toggle
            }
        );
        assert_eq!(
            command("earnings week --remote"),
            Command::Earnings {
                period: EarningsPeriod::Week,
                remote: true
            }
        );
        assert_eq!(
            command("earnings"),
            Command::Earnings {
                period: EarningsPeriod::Today,
                remote: false
            }
        );
        assert_eq!(command("profile --refresh"), Command::Profile { refresh: true });
    }

    #[test]
    fn test_parse_transition_flags() {
        assert_eq!(
            command("complete T1 --at 12.5,77.25 --signature ok"),
            Command::Complete {
                order_id: "T1".into(),
                at: Some(GeoLocation::new(12.5, 77.25)),
                signature: Some("ok".into()),
            }
        );
        assert_eq!(
            command("start T1 --at -12.5,-77.25"),
            Command::Start {
                order_id: "T1".into(),
                at: Some(GeoLocation::new(-12.5, -77.25)),
            }
        );
        assert!(parse("start T1 --at 95,10").is_err());
        assert!(parse("start T1 --at").is_err());
        assert!(parse("start T1 --signature x").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(parse("").is_err());
        assert!(parse("fly T1").is_err());
        assert!(parse("login 9876543210").is_err());
        assert!(parse("earnings yearly").is_err());
        assert!(parse("availability maybe").is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&ClientError::Network("down".into())), 4);
        assert_eq!(exit_code(&ClientError::SessionExpired), 3);
        assert_eq!(exit_code(&ClientError::remote_rejected("taken")), 5);
    }
}
