//! Shopping cart commands (require a stored token)

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use tienda_common::CartLine;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Subcommand, Debug)]
pub enum CartCommands {
    /// Add a product to the cart
    Add {
        #[arg(long)]
        product_id: i64,
        #[arg(long, default_value = "1")]
        quantity: i64,
    },

    /// Show the cart
    List,

    /// Change the quantity of a cart row
    Update {
        id: i64,
        #[arg(long)]
        quantity: i64,
    },

    /// Remove a cart row
    Remove { id: i64 },
}

impl TableDisplay for CartLine {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "PRODUCT", "QTY", "PRICE", "TOTAL"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.product_name.clone(),
            self.quantity.to_string(),
            format!("{:.2}", self.price),
            format!("{:.2}", self.total),
        ]
    }
}

pub async fn execute(cmd: CartCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        CartCommands::Add { product_id, quantity } => {
            let body = json!({"product_id": product_id, "quantity": quantity});
            let response = client.post("/carts", &body).await?;
            output::print_message(response["message"].as_str().unwrap_or(""), format);
        }

        CartCommands::List => {
            let response = client.get("/carts").await?;
            match response.get("data") {
                Some(data) => {
                    let lines: Vec<CartLine> = serde_json::from_value(data.clone())?;
                    output::print_list(&lines, format);
                }
                None => {
                    output::print_message(response["message"].as_str().unwrap_or(""), format)
                }
            }
        }

        CartCommands::Update { id, quantity } => {
            let body = json!({"quantity": quantity});
            let response = client.put(&format!("/carts/{}", id), &body).await?;
            output::print_message(response["message"].as_str().unwrap_or(""), format);
        }

        CartCommands::Remove { id } => {
            let response = client.delete(&format!("/carts/{}", id)).await?;
            output::print_message(response["message"].as_str().unwrap_or(""), format);
        }
    }

    Ok(())
}
