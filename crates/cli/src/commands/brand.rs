//! Brand commands

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use tienda_common::Brand;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Subcommand, Debug)]
pub enum BrandCommands {
    /// List all brands
    List,

    /// Create a brand
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: String,
    },

    /// Delete a brand
    Delete { id: i64 },
}

impl TableDisplay for Brand {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "ADDRESS", "PHONE"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.address.clone(),
            self.phone.clone(),
        ]
    }
}

pub async fn execute(cmd: BrandCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        BrandCommands::List => {
            let response = client.get("/api/brands").await?;
            let brands: Vec<Brand> = serde_json::from_value(response)?;
            output::print_list(&brands, format);
        }

        BrandCommands::Create { name, address, phone } => {
            let body = json!({"name": name, "address": address, "phone": phone});
            let response = client.post("/api/brands", &body).await?;
            let brand: Brand = serde_json::from_value(response)?;
            output::print_success(&format!("Created brand {} ({})", brand.name, brand.id));
        }

        BrandCommands::Delete { id } => {
            client.delete(&format!("/api/brands/{}", id)).await?;
            output::print_success(&format!("Deleted brand {}", id));
        }
    }

    Ok(())
}
