//! Order commands (require a stored token)

use anyhow::Result;
use clap::Subcommand;

use tienda_common::Order;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// Create an order from the current cart
    Create,

    /// List your orders
    List,

    /// Delete an order
    Delete { id: i64 },
}

impl TableDisplay for Order {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "TOTAL", "CREATED_AT"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            format!("{:.2}", self.total_amount),
            self.created_at.to_string(),
        ]
    }
}

pub async fn execute(cmd: OrderCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        OrderCommands::Create => {
            let response = client.post_empty("/orders").await?;
            output::print_success(&format!(
                "Order {} created (total {:.2})",
                response["order_id"].as_i64().unwrap_or_default(),
                response["total_amount"].as_f64().unwrap_or_default(),
            ));
        }

        OrderCommands::List => {
            let response = client.get("/orders").await?;
            let orders: Vec<Order> =
                serde_json::from_value(response.get("data").cloned().unwrap_or_default())?;
            output::print_list(&orders, format);
        }

        OrderCommands::Delete { id } => {
            let response = client.delete(&format!("/orders/{}", id)).await?;
            output::print_message(response["message"].as_str().unwrap_or(""), format);
        }
    }

    Ok(())
}
