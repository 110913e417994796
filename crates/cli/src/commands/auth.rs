//! Account commands: register, login, whoami, logout

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use crate::client::{self, ApiClient};
use crate::output::{self, OutputFormat};

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Register a new account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        paternal_surname: String,
        #[arg(long)]
        maternal_surname: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: String,
        /// Payment method: credit_card, paypal, or bank_transfer
        #[arg(long, default_value = "credit_card")]
        payment: String,
        /// Role: 0 = customer, 1 = admin
        #[arg(long, default_value = "0")]
        role: i64,
    },

    /// Log in and store the access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Show the greeting for the logged-in account
    Whoami,

    /// Discard the stored access token
    Logout,
}

pub async fn execute(cmd: AuthCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        AuthCommands::Register {
            name,
            paternal_surname,
            maternal_surname,
            address,
            email,
            password,
            phone,
            payment,
            role,
        } => {
            let body = json!({
                "name": name,
                "paternal_surname": paternal_surname,
                "maternal_surname": maternal_surname,
                "address": address,
                "email": email,
                "password": password,
                "confirm_password": password,
                "phone": phone,
                "payment": payment,
                "role": role,
            });
            let response = client.post("/auth/register", &body).await?;
            output::print_message(
                response["message"].as_str().unwrap_or("registered"),
                format,
            );
        }

        AuthCommands::Login { email, password } => {
            let body = json!({"email": email, "password": password});
            let response = client.post("/auth/login", &body).await?;
            let token = response["access_token"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("no access_token in response"))?;
            client::save_token(token)?;
            output::print_success("Logged in; token saved");
        }

        AuthCommands::Whoami => {
            let response = client.get("/auth/whoami").await?;
            output::print_message(response["message"].as_str().unwrap_or(""), format);
        }

        AuthCommands::Logout => {
            client::clear_token()?;
            output::print_success("Token removed");
        }
    }

    Ok(())
}
