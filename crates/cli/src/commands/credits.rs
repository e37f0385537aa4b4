//! Credits Commands

use anyhow::{bail, Result};
use clap::Subcommand;

use biocloud_common::{Offer, Route};

use super::{authorize, follow, spinner};
use crate::app::App;
use crate::credits::payment_return_route;
use crate::notify;
use crate::output::{print_list_or, print_message, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum CreditsCommands {
    /// List the credit packages on sale
    Offers,

    /// Start a payment for an offer
    Checkout {
        /// Price ID of the offer (see `biocloud credits offers`)
        price_id: String,

        /// Displayed price of the offer
        #[arg(long, default_value = "")]
        price: String,
    },

    /// Interpret the URL the payment provider redirected back to
    Return {
        url: String,
    },
}

impl TableDisplay for Offer {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Price", "Price ID"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.price.clone(), self.price_id.clone()]
    }
}

pub async fn execute(cmd: CreditsCommands, app: &App, format: OutputFormat) -> Result<()> {
    match cmd {
        CreditsCommands::Offers => {
            let session = authorize(app, Route::Credits).await?;
            let offers = app.credits.offers().await?;
            print_list_or(&offers, format, "No offers available right now.");
            if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
                println!("Current balance: {} credits", session.profile.credits);
            }
        }

        CreditsCommands::Checkout { price_id, price } => {
            authorize(app, Route::Credits).await?;

            let pb = spinner("Creating checkout session...");
            let url = app.credits.checkout(&price_id, &price).await;
            pb.finish_and_clear();
            let url = url?;

            notify::info("Complete the payment in your browser:");
            print_message(&url, format);
        }

        CreditsCommands::Return { url } => match payment_return_route(&url) {
            Some(Route::Success) => {
                notify::success("Payment successful! Your credits will be available shortly.");
                follow(Route::Dashboard);
            }
            Some(Route::Cancelled) => {
                notify::warning("Payment cancelled. No credits were charged.");
                follow(Route::Credits);
            }
            _ => bail!("The URL does not carry a payment result."),
        },
    }

    Ok(())
}
